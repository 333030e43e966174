//! Typed attribute columns
//!
//! Every numeric column is a dense array of exactly `max_array_size` slots, pre-filled
//! with the attribute's null value, so a lookup is a single bounds-checked read. String
//! columns keep a growable array of arena handles instead, grown as higher ids are written.

use crate::arena::{StringArena, StringRef};
use crate::config::{AttributeDescriptor, DictionaryLimits};
use crate::error::{DictionaryError, DictionaryResult};
use flatdict_types::{AttributeType, AttributeValue, Field};
use std::fmt;
use std::mem::size_of;
use std::str::FromStr;

/// Fixed-size array for one numeric attribute
#[derive(Debug)]
pub struct NumericArray<T> {
    values: Box<[T]>,
    null_value: T,
}

impl<T: Copy> NumericArray<T> {
    fn filled(null_value: T, len: usize) -> DictionaryResult<Self> {
        let mut values = Vec::new();
        values.try_reserve_exact(len).map_err(|_| {
            DictionaryError::allocation("numeric attribute array", len.saturating_mul(size_of::<T>()))
        })?;
        values.resize(len, null_value);
        Ok(Self { values: values.into_boxed_slice(), null_value })
    }

    /// Value stored for `id`, or the null value past the end of the array
    #[inline]
    pub fn get(&self, id: u64) -> T {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.values.get(index))
            .copied()
            .unwrap_or(self.null_value)
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) {
        self.values[index] = value;
    }

    pub fn null_value(&self) -> T {
        self.null_value
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn bytes_allocated(&self) -> usize {
        self.values.len() * size_of::<T>()
    }
}

/// Growable array of string handles plus the arena that owns their bytes.
///
/// Slots holding `None` read as the null value, so the shared null string is never
/// copied into the arena.
#[derive(Debug)]
pub struct StringArray {
    refs: Vec<Option<StringRef>>,
    arena: StringArena,
    null_value: String,
}

impl StringArray {
    fn new(null_value: String, initial_len: usize) -> DictionaryResult<Self> {
        let mut refs = Vec::new();
        refs.try_reserve_exact(initial_len).map_err(|_| {
            DictionaryError::allocation(
                "string reference array",
                initial_len.saturating_mul(size_of::<Option<StringRef>>()),
            )
        })?;
        refs.resize(initial_len, None);
        Ok(Self { refs, arena: StringArena::new(), null_value })
    }

    /// String stored for `id`, or the null value for unwritten and out-of-range ids
    #[inline]
    pub fn get(&self, id: u64) -> &str {
        match usize::try_from(id).ok().and_then(|index| self.refs.get(index)) {
            Some(Some(string_ref)) => self.arena.get(*string_ref),
            _ => &self.null_value,
        }
    }

    fn set(&mut self, index: usize, value: &str, max_len: usize) -> DictionaryResult<()> {
        let string_ref = self.arena.insert(value)?;

        let current_len = self.refs.len();
        if index >= current_len {
            let new_len = grown_len(current_len, index, max_len);
            self.refs.try_reserve_exact(new_len - current_len).map_err(|_| {
                DictionaryError::allocation(
                    "string reference array",
                    new_len.saturating_mul(size_of::<Option<StringRef>>()),
                )
            })?;
            self.refs.resize(new_len, None);
        }

        self.refs[index] = Some(string_ref);
        Ok(())
    }

    pub fn null_value(&self) -> &str {
        &self.null_value
    }

    /// Current number of reference slots
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn arena(&self) -> &StringArena {
        &self.arena
    }

    fn bytes_allocated(&self) -> usize {
        self.refs.capacity() * size_of::<Option<StringRef>>()
            + self.arena.bytes_allocated()
            + self.null_value.capacity()
    }
}

/// New reference array length after writing `index` into an array of `current_len` slots.
///
/// The larger of twice the current length and twice the index, clamped to `max_len`.
/// Callers guarantee `index < max_len`.
pub fn grown_len(current_len: usize, index: usize, max_len: usize) -> usize {
    let wanted = current_len.saturating_mul(2).max(index.saturating_mul(2)).max(index + 1);
    wanted.min(max_len)
}

/// Storage of one attribute, tagged with its element type
#[derive(Debug)]
pub enum ColumnData {
    UInt8(NumericArray<u8>),
    UInt16(NumericArray<u16>),
    UInt32(NumericArray<u32>),
    UInt64(NumericArray<u64>),
    Int8(NumericArray<i8>),
    Int16(NumericArray<i16>),
    Int32(NumericArray<i32>),
    Int64(NumericArray<i64>),
    Float32(NumericArray<f32>),
    Float64(NumericArray<f64>),
    String(StringArray),
}

impl ColumnData {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            ColumnData::UInt8(_) => AttributeType::UInt8,
            ColumnData::UInt16(_) => AttributeType::UInt16,
            ColumnData::UInt32(_) => AttributeType::UInt32,
            ColumnData::UInt64(_) => AttributeType::UInt64,
            ColumnData::Int8(_) => AttributeType::Int8,
            ColumnData::Int16(_) => AttributeType::Int16,
            ColumnData::Int32(_) => AttributeType::Int32,
            ColumnData::Int64(_) => AttributeType::Int64,
            ColumnData::Float32(_) => AttributeType::Float32,
            ColumnData::Float64(_) => AttributeType::Float64,
            ColumnData::String(_) => AttributeType::String,
        }
    }
}

/// One named, typed attribute of a flat dictionary
#[derive(Debug)]
pub struct AttributeColumn {
    name: String,
    data: ColumnData,
    max_array_size: usize,
}

impl AttributeColumn {
    /// Allocate a column for `descriptor`, every slot holding the parsed null value
    pub fn create(
        descriptor: &AttributeDescriptor,
        limits: &DictionaryLimits,
    ) -> DictionaryResult<Self> {
        let name = descriptor.name.as_str();
        let text = descriptor.null_value.as_str();
        let size = limits.max_array_size;
        let ty = descriptor.attribute_type;

        let data = match ty {
            AttributeType::UInt8 => ColumnData::UInt8(numeric_array(name, ty, text, size)?),
            AttributeType::UInt16 => ColumnData::UInt16(numeric_array(name, ty, text, size)?),
            AttributeType::UInt32 => ColumnData::UInt32(numeric_array(name, ty, text, size)?),
            AttributeType::UInt64 => ColumnData::UInt64(numeric_array(name, ty, text, size)?),
            AttributeType::Int8 => ColumnData::Int8(numeric_array(name, ty, text, size)?),
            AttributeType::Int16 => ColumnData::Int16(numeric_array(name, ty, text, size)?),
            AttributeType::Int32 => ColumnData::Int32(numeric_array(name, ty, text, size)?),
            AttributeType::Int64 => ColumnData::Int64(numeric_array(name, ty, text, size)?),
            AttributeType::Float32 => ColumnData::Float32(numeric_array(name, ty, text, size)?),
            AttributeType::Float64 => ColumnData::Float64(numeric_array(name, ty, text, size)?),
            AttributeType::String => ColumnData::String(StringArray::new(
                text.to_string(),
                limits.initial_array_size.min(size),
            )?),
        };

        Ok(Self { name: descriptor.name.clone(), data, max_array_size: size })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.data.attribute_type()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Store `value` at `id`, narrowing numeric cells to the column's type.
    ///
    /// Overwrites any earlier value for the same id.
    pub fn set(&mut self, id: u64, value: &Field) -> DictionaryResult<()> {
        let index = match usize::try_from(id) {
            Ok(index) if index < self.max_array_size => index,
            _ => return Err(DictionaryError::id_out_of_bound(id, self.max_array_size)),
        };

        let attribute_type = self.data.attribute_type();
        let mismatch =
            || DictionaryError::incompatible_field(&self.name, attribute_type, value.type_name());

        match &mut self.data {
            ColumnData::UInt8(array) => array.set(index, value.as_u64().ok_or_else(mismatch)? as u8),
            ColumnData::UInt16(array) => array.set(index, value.as_u64().ok_or_else(mismatch)? as u16),
            ColumnData::UInt32(array) => array.set(index, value.as_u64().ok_or_else(mismatch)? as u32),
            ColumnData::UInt64(array) => array.set(index, value.as_u64().ok_or_else(mismatch)?),
            ColumnData::Int8(array) => array.set(index, value.as_i64().ok_or_else(mismatch)? as i8),
            ColumnData::Int16(array) => array.set(index, value.as_i64().ok_or_else(mismatch)? as i16),
            ColumnData::Int32(array) => array.set(index, value.as_i64().ok_or_else(mismatch)? as i32),
            ColumnData::Int64(array) => array.set(index, value.as_i64().ok_or_else(mismatch)?),
            ColumnData::Float32(array) => array.set(index, value.as_f64().ok_or_else(mismatch)? as f32),
            ColumnData::Float64(array) => array.set(index, value.as_f64().ok_or_else(mismatch)?),
            ColumnData::String(array) => {
                let string = value.as_str().ok_or_else(mismatch)?;
                array.set(index, string, self.max_array_size)?;
            }
        }
        Ok(())
    }

    /// Value for `id` as a tagged value, falling back to the null value
    pub fn value(&self, id: u64) -> AttributeValue<'_> {
        match &self.data {
            ColumnData::UInt8(array) => AttributeValue::UInt8(array.get(id)),
            ColumnData::UInt16(array) => AttributeValue::UInt16(array.get(id)),
            ColumnData::UInt32(array) => AttributeValue::UInt32(array.get(id)),
            ColumnData::UInt64(array) => AttributeValue::UInt64(array.get(id)),
            ColumnData::Int8(array) => AttributeValue::Int8(array.get(id)),
            ColumnData::Int16(array) => AttributeValue::Int16(array.get(id)),
            ColumnData::Int32(array) => AttributeValue::Int32(array.get(id)),
            ColumnData::Int64(array) => AttributeValue::Int64(array.get(id)),
            ColumnData::Float32(array) => AttributeValue::Float32(array.get(id)),
            ColumnData::Float64(array) => AttributeValue::Float64(array.get(id)),
            ColumnData::String(array) => AttributeValue::String(array.get(id)),
        }
    }

    /// Parent id stored for `id`, `None` when the column is not integer-typed
    #[inline]
    pub fn parent_of(&self, id: u64) -> Option<u64> {
        match &self.data {
            ColumnData::UInt8(array) => Some(u64::from(array.get(id))),
            ColumnData::UInt16(array) => Some(u64::from(array.get(id))),
            ColumnData::UInt32(array) => Some(u64::from(array.get(id))),
            ColumnData::UInt64(array) => Some(array.get(id)),
            ColumnData::Int8(array) => Some(array.get(id) as u64),
            ColumnData::Int16(array) => Some(array.get(id) as u64),
            ColumnData::Int32(array) => Some(array.get(id) as u64),
            ColumnData::Int64(array) => Some(array.get(id) as u64),
            ColumnData::Float32(_) | ColumnData::Float64(_) | ColumnData::String(_) => None,
        }
    }

    /// Bytes held by the column's arrays and arena
    pub fn bytes_allocated(&self) -> usize {
        match &self.data {
            ColumnData::UInt8(array) => array.bytes_allocated(),
            ColumnData::UInt16(array) => array.bytes_allocated(),
            ColumnData::UInt32(array) => array.bytes_allocated(),
            ColumnData::UInt64(array) => array.bytes_allocated(),
            ColumnData::Int8(array) => array.bytes_allocated(),
            ColumnData::Int16(array) => array.bytes_allocated(),
            ColumnData::Int32(array) => array.bytes_allocated(),
            ColumnData::Int64(array) => array.bytes_allocated(),
            ColumnData::Float32(array) => array.bytes_allocated(),
            ColumnData::Float64(array) => array.bytes_allocated(),
            ColumnData::String(array) => array.bytes_allocated(),
        }
    }

    /// Bytes copied into the string arena, zero for numeric columns
    pub fn string_bytes(&self) -> usize {
        match &self.data {
            ColumnData::String(array) => array.arena().bytes_used(),
            _ => 0,
        }
    }
}

/// Parse the null value and allocate a full-size array filled with it
fn numeric_array<T>(
    attribute: &str,
    expected: AttributeType,
    text: &str,
    size: usize,
) -> DictionaryResult<NumericArray<T>>
where
    T: Copy + FromStr + Default,
    T::Err: fmt::Display,
{
    NumericArray::filled(parse_null(attribute, expected, text)?, size)
}

/// Parse a configured null value; empty text means zero for numeric types
fn parse_null<T>(attribute: &str, expected: AttributeType, text: &str) -> DictionaryResult<T>
where
    T: FromStr + Default,
    T::Err: fmt::Display,
{
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    trimmed
        .parse::<T>()
        .map_err(|err| DictionaryError::value_parse(attribute, expected, text, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> DictionaryLimits {
        DictionaryLimits::new(100, 4)
    }

    #[test]
    fn test_numeric_column_is_fully_sized_and_null_filled() {
        let column =
            AttributeColumn::create(&AttributeDescriptor::new("population", AttributeType::Int32, "-1"), &limits())
                .unwrap();

        match column.data() {
            ColumnData::Int32(array) => {
                assert_eq!(array.len(), 100);
                assert_eq!(array.null_value(), -1);
                assert!((0..100).all(|id| array.get(id) == -1));
            }
            other => panic!("unexpected storage {:?}", other.attribute_type()),
        }
        assert_eq!(column.bytes_allocated(), 400);
    }

    #[test]
    fn test_null_value_parse_error_names_attribute() {
        let err =
            AttributeColumn::create(&AttributeDescriptor::new("code", AttributeType::UInt8, "300"), &limits())
                .unwrap_err();
        match err {
            DictionaryError::ValueParseError { attribute, expected, text, .. } => {
                assert_eq!(attribute, "code");
                assert_eq!(expected, AttributeType::UInt8);
                assert_eq!(text, "300");
            }
            other => panic!("unexpected error {other:?}"),
        }

        assert!(
            AttributeColumn::create(&AttributeDescriptor::new("rate", AttributeType::Float64, "abc"), &limits())
                .is_err()
        );
    }

    #[test]
    fn test_empty_numeric_null_value_is_zero() {
        let column =
            AttributeColumn::create(&AttributeDescriptor::new("v", AttributeType::Float32, ""), &limits()).unwrap();
        assert_eq!(column.value(3), AttributeValue::Float32(0.0));
    }

    #[test]
    fn test_narrowing_on_set() {
        let mut column =
            AttributeColumn::create(&AttributeDescriptor::new("v", AttributeType::UInt8, "0"), &limits()).unwrap();
        column.set(1, &Field::UInt64(258)).unwrap();
        column.set(2, &Field::Int64(-1)).unwrap();
        assert_eq!(column.value(1), AttributeValue::UInt8(2));
        assert_eq!(column.value(2), AttributeValue::UInt8(255));
    }

    #[test]
    fn test_incompatible_field_rejected() {
        let mut numeric =
            AttributeColumn::create(&AttributeDescriptor::new("v", AttributeType::Int64, "0"), &limits()).unwrap();
        let err = numeric.set(1, &Field::from("x")).unwrap_err();
        assert_eq!(err.category(), "type_mismatch");

        let mut string =
            AttributeColumn::create(&AttributeDescriptor::new("s", AttributeType::String, ""), &limits()).unwrap();
        assert!(string.set(1, &Field::from(5u32)).is_err());
    }

    #[test]
    fn test_set_rejects_id_at_ceiling() {
        let mut column =
            AttributeColumn::create(&AttributeDescriptor::new("v", AttributeType::UInt16, "0"), &limits()).unwrap();
        assert!(column.set(99, &Field::from(1u16)).is_ok());
        let err = column.set(100, &Field::from(1u16)).unwrap_err();
        assert_eq!(err, DictionaryError::id_out_of_bound(100, 100));
    }

    #[test]
    fn test_string_column_grows_and_keeps_null_gaps() {
        let mut column = AttributeColumn::create(
            &AttributeDescriptor::new("name", AttributeType::String, "n/a"),
            &limits(),
        )
        .unwrap();

        column.set(0, &Field::from("zero")).unwrap();
        column.set(5, &Field::from("five")).unwrap();
        column.set(40, &Field::from("forty")).unwrap();

        let ColumnData::String(array) = column.data() else {
            panic!("expected string storage");
        };
        // 4 -> 10 (twice the id) -> 80 (twice the id), then clamped to 100
        assert_eq!(array.len(), 80);
        assert_eq!(array.get(0), "zero");
        assert_eq!(array.get(5), "five");
        assert_eq!(array.get(40), "forty");
        assert_eq!(array.get(6), "n/a");
        assert_eq!(array.get(90), "n/a");
        assert_eq!(array.get(u64::MAX), "n/a");
        assert_eq!(column.string_bytes(), 13);

        column.set(99, &Field::from("last")).unwrap();
        let ColumnData::String(array) = column.data() else {
            panic!("expected string storage");
        };
        assert_eq!(array.len(), 100);
        assert_eq!(array.get(99), "last");
    }

    #[test]
    fn test_grown_len_policy() {
        assert_eq!(grown_len(128, 200, 500_000), 400);
        assert_eq!(grown_len(128, 1000, 500_000), 2000);
        assert_eq!(grown_len(128, 255, 500_000), 510);
        assert_eq!(grown_len(128, 100, 500_000), 256);
        assert_eq!(grown_len(128, 256, 500_000), 512);
        assert_eq!(grown_len(300_000, 300_000, 500_000), 500_000);
        assert_eq!(grown_len(128, 499_999, 500_000), 500_000);
        assert_eq!(grown_len(0, 0, 10), 1);
    }

    #[test]
    fn test_parent_of_reinterprets_signed_values() {
        let mut column =
            AttributeColumn::create(&AttributeDescriptor::new("p", AttributeType::Int16, "-1"), &limits()).unwrap();
        column.set(3, &Field::from(7i16)).unwrap();
        assert_eq!(column.parent_of(3), Some(7));
        assert_eq!(column.parent_of(4), Some(u64::MAX));

        let float =
            AttributeColumn::create(&AttributeDescriptor::new("f", AttributeType::Float64, "0"), &limits()).unwrap();
        assert_eq!(float.parent_of(0), None);
    }
}
