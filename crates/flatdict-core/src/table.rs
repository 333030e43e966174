//! Attribute columns of one dictionary, addressable by name or position

use crate::column::AttributeColumn;
use crate::config::{DictionaryLimits, DictionaryStructure};
use crate::error::{DictionaryError, DictionaryResult, ResultExt};
use flatdict_types::Field;
use std::collections::HashMap;
use tracing::debug;

/// Ordered attribute columns of one dictionary.
///
/// Column order follows the structure, and a column's position is its attribute index.
#[derive(Debug)]
pub struct AttributeTable {
    columns: Vec<AttributeColumn>,
    index_by_name: HashMap<String, usize>,
    hierarchical: Option<usize>,
}

impl AttributeTable {
    /// Allocate one null-filled column per attribute of `structure`
    pub fn new(structure: &DictionaryStructure, limits: &DictionaryLimits) -> DictionaryResult<Self> {
        structure.validate()?;

        let mut columns = Vec::with_capacity(structure.attributes.len());
        let mut index_by_name = HashMap::with_capacity(structure.attributes.len());
        let mut hierarchical = None;

        for descriptor in &structure.attributes {
            let index = columns.len();
            debug!(
                attribute = %descriptor.name,
                attribute_type = %descriptor.attribute_type,
                index,
                "Allocating attribute column"
            );
            columns.push(AttributeColumn::create(descriptor, limits)?);
            index_by_name.insert(descriptor.name.clone(), index);

            if descriptor.hierarchical {
                hierarchical = Some(index);
            }
        }

        Ok(Self { columns, index_by_name, hierarchical })
    }

    pub fn attribute_index(&self, name: &str) -> DictionaryResult<usize> {
        self.index_by_name.get(name).copied().ok_or_else(|| DictionaryError::unknown_attribute(name))
    }

    /// Column at `index`; panics when `index` is outside the table
    #[inline]
    pub fn column(&self, index: usize) -> &AttributeColumn {
        &self.columns[index]
    }

    pub fn columns(&self) -> &[AttributeColumn] {
        &self.columns
    }

    pub fn hierarchical(&self) -> Option<&AttributeColumn> {
        self.hierarchical.map(|index| &self.columns[index])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Store one cell for the attribute at `index`
    pub fn set_attribute_value(&mut self, index: usize, id: u64, value: &Field) -> DictionaryResult<()> {
        let column = &mut self.columns[index];
        let result = column.set(id, value);
        result.with_attribute_context(column.name())
    }

    pub fn bytes_allocated(&self) -> usize {
        self.columns.iter().map(AttributeColumn::bytes_allocated).sum()
    }

    pub fn string_bytes(&self) -> usize {
        self.columns.iter().map(AttributeColumn::string_bytes).sum()
    }
}
