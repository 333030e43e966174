use crate::attribute::Attribute;
use crate::config::{DictionaryConfig, DictionaryLimits, DictionaryStructure};
use crate::error::{DictionaryError, DictionaryResult};
use crate::loader::Loader;
use crate::source::DictionarySource;
use crate::table::AttributeTable;
use chrono::{DateTime, Utc};
use flatdict_types::{AttributeType, AttributeValue};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Load statistics and memory footprint of a dictionary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictionaryStats {
    /// Rows read from the source, duplicates included
    pub element_count: usize,
    pub block_count: usize,
    pub attribute_count: usize,
    /// Bytes held by all column arrays and string arenas
    pub bytes_allocated: usize,
    /// Bytes of string data copied into arenas
    pub string_arena_bytes: usize,
    pub loaded_at: DateTime<Utc>,
    pub load_duration: Duration,
}

/// Fully loaded, read-only lookup table over integer identifiers.
///
/// Every attribute is a dense array indexed directly by id, so a lookup is one bounds
/// check and one array read. Ids at or above the configured ceiling (or past the end of a
/// string attribute) read as the attribute's null value.
///
/// # Thread Safety
/// Construction is single-threaded. Once built the dictionary is never mutated again, so
/// it is `Send + Sync` and any number of threads may read from it without locking.
/// Refreshing the data means building a new instance and swapping it in.
///
/// # Usage Example
/// ```rust
/// use flatdict_core::{AttributeDescriptor, DictionaryLimits, DictionaryStructure, FlatDictionary, MemorySource};
/// use flatdict_types::{AttributeType, Field};
///
/// let structure = DictionaryStructure::new(vec![
///     AttributeDescriptor::new("parent_id", AttributeType::UInt32, "0").hierarchical(),
///     AttributeDescriptor::new("name", AttributeType::String, "unknown"),
/// ]);
/// let mut source = MemorySource::from_rows(2, 1024, vec![
///     (1, vec![Field::from(0u32), Field::from("Europe")]),
///     (2, vec![Field::from(1u32), Field::from("Germany")]),
/// ]);
///
/// let dict = FlatDictionary::new(structure, DictionaryLimits::new(1000, 16), &mut source).unwrap();
/// assert_eq!(dict.get::<str>("name", 2).unwrap(), "Germany");
/// assert_eq!(dict.get::<str>("name", 3).unwrap(), "unknown");
/// assert_eq!(dict.to_parent(2).unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct FlatDictionary {
    name: String,
    structure: DictionaryStructure,
    limits: DictionaryLimits,
    table: AttributeTable,
    stats: DictionaryStats,
}

impl FlatDictionary {
    /// Build a dictionary and load it completely from `source`
    pub fn new(
        structure: DictionaryStructure,
        limits: DictionaryLimits,
        source: &mut dyn DictionarySource,
    ) -> DictionaryResult<Self> {
        Self::with_name("flat", structure, limits, source)
    }

    /// Build a dictionary described by `config`
    pub fn from_config(
        config: &DictionaryConfig,
        source: &mut dyn DictionarySource,
    ) -> DictionaryResult<Self> {
        Self::with_name(&config.name, config.structure.clone(), config.limits, source)
    }

    #[instrument(skip(structure, limits, source), fields(attributes = structure.attributes.len()))]
    pub fn with_name(
        name: &str,
        structure: DictionaryStructure,
        limits: DictionaryLimits,
        source: &mut dyn DictionarySource,
    ) -> DictionaryResult<Self> {
        limits.validate()?;
        info!(
            max_array_size = limits.max_array_size,
            initial_array_size = limits.initial_array_size,
            "Creating flat dictionary"
        );

        let mut table = AttributeTable::new(&structure, &limits)?;
        let summary = Loader::new(&mut table).load(source)?;

        let stats = DictionaryStats {
            element_count: summary.rows,
            block_count: summary.blocks,
            attribute_count: table.len(),
            bytes_allocated: table.bytes_allocated(),
            string_arena_bytes: table.string_bytes(),
            loaded_at: Utc::now(),
            load_duration: summary.duration,
        };

        info!(
            rows = stats.element_count,
            bytes_allocated = stats.bytes_allocated,
            hierarchical = table.hierarchical().is_some(),
            "Flat dictionary loaded"
        );

        Ok(Self { name: name.to_string(), structure, limits, table, stats })
    }

    /// Value of attribute `attribute_name` for `id`, checking the stored type is `T`.
    ///
    /// ```rust,ignore
    /// let region: u32 = dict.get::<u32>("region_id", id)?;
    /// let name: &str = dict.get::<str>("name", id)?;
    /// ```
    #[inline]
    pub fn get<T: Attribute + ?Sized>(
        &self,
        attribute_name: &str,
        id: u64,
    ) -> DictionaryResult<T::Value<'_>> {
        let column = self.table.column(self.get_attribute_index(attribute_name)?);
        T::read(column.data(), id)
            .ok_or_else(|| DictionaryError::type_mismatch(attribute_name, column.attribute_type()))
    }

    /// Value of the attribute at `attribute_index` for `id`, without a type check.
    ///
    /// Meant for inner loops that validated the attribute types once up front with
    /// [`FlatDictionary::is`]. Naming the wrong type yields zero (or an empty string)
    /// rather than the stored value.
    ///
    /// # Panics
    /// If `attribute_index` is not below [`FlatDictionary::attribute_count`].
    #[inline]
    pub fn get_unchecked<T: Attribute + ?Sized>(&self, attribute_index: usize, id: u64) -> T::Value<'_> {
        T::read(self.table.column(attribute_index).data(), id).unwrap_or_else(|| T::fallback())
    }

    /// Whether the attribute at `attribute_index` is stored as `T`
    #[inline]
    pub fn is<T: Attribute + ?Sized>(&self, attribute_index: usize) -> bool {
        self.table.column(attribute_index).attribute_type() == T::TYPE
    }

    pub fn get_attribute_index(&self, attribute_name: &str) -> DictionaryResult<usize> {
        self.table.attribute_index(attribute_name)
    }

    /// Value of `attribute_name` for `id` tagged with its type, whatever that type is
    pub fn get_value(&self, attribute_name: &str, id: u64) -> DictionaryResult<AttributeValue<'_>> {
        Ok(self.table.column(self.get_attribute_index(attribute_name)?).value(id))
    }

    /// Parent of `id` according to the hierarchical attribute
    #[inline]
    pub fn to_parent(&self, id: u64) -> DictionaryResult<u64> {
        let column = self.table.hierarchical().ok_or(DictionaryError::NoHierarchy)?;
        column
            .parent_of(id)
            .ok_or_else(|| DictionaryError::non_integer_hierarchy(column.attribute_type()))
    }

    /// Whether `ancestor` is reachable from `child` by following parents.
    ///
    /// The walk stops at the hierarchical attribute's null value, and after
    /// `max_array_size` steps so that cyclic data cannot loop forever.
    pub fn is_in(&self, child: u64, ancestor: u64) -> DictionaryResult<bool> {
        // Out-of-range ids read as the null value
        let null_parent = self.to_parent(u64::MAX)?;

        let mut current = child;
        for _ in 0..=self.limits.max_array_size {
            if current == null_parent {
                return Ok(false);
            }
            if current == ancestor {
                return Ok(true);
            }
            current = self.to_parent(current)?;
        }
        Ok(false)
    }

    /// Always true: the dictionary holds the whole source, never a cached subset
    pub fn is_complete(&self) -> bool {
        true
    }

    pub fn has_hierarchy(&self) -> bool {
        self.table.hierarchical().is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_count(&self) -> usize {
        self.table.len()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.table.columns().iter().map(|column| column.name())
    }

    /// Stored type of the attribute at `attribute_index`, `None` past the last attribute
    pub fn attribute_type(&self, attribute_index: usize) -> Option<AttributeType> {
        self.table.columns().get(attribute_index).map(|column| column.attribute_type())
    }

    pub fn structure(&self) -> &DictionaryStructure {
        &self.structure
    }

    pub fn limits(&self) -> &DictionaryLimits {
        &self.limits
    }

    pub fn stats(&self) -> &DictionaryStats {
        &self.stats
    }
}
