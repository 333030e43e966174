//! Bulk load of a dictionary source into an attribute table
//!
//! ## Load Algorithm
//!
//! 1. **Open**: ask the source for a full, single-pass block stream
//! 2. **Validate**: every block must carry `attributes + 1` columns of equal length
//! 3. **Assign**: column by column, write each row's cell at the row's identifier
//! 4. **Release**: once the stream is exhausted (or the load failed), reset the source
//!
//! A block without any columns marks the end of the stream, the same as `None`. Any error
//! aborts the whole load; there is no partial-row recovery.

use crate::error::{DictionaryError, DictionaryResult};
use crate::source::{Block, DictionarySource};
use crate::table::AttributeTable;
use flatdict_types::Field;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Counters collected while draining a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows: usize,
    pub blocks: usize,
    pub duration: Duration,
}

/// Drains a [`DictionarySource`] into an [`AttributeTable`]
pub struct Loader<'a> {
    table: &'a mut AttributeTable,
}

impl<'a> Loader<'a> {
    pub fn new(table: &'a mut AttributeTable) -> Self {
        Self { table }
    }

    /// Load every block of `source`, then reset it
    #[instrument(skip_all, fields(attributes = self.table.len()))]
    pub fn load(self, source: &mut dyn DictionarySource) -> DictionaryResult<LoadSummary> {
        let start = Instant::now();
        let result = self.drain(source);
        source.reset();

        match result {
            Ok(mut summary) => {
                summary.duration = start.elapsed();
                info!(
                    rows = summary.rows,
                    blocks = summary.blocks,
                    duration_ms = summary.duration.as_millis() as u64,
                    "Dictionary source drained"
                );
                Ok(summary)
            }
            Err(err) => {
                warn!(error = %err, category = err.category(), "Dictionary load aborted");
                Err(err)
            }
        }
    }

    fn drain(self, source: &mut dyn DictionarySource) -> DictionaryResult<LoadSummary> {
        let table = self.table;
        let mut summary = LoadSummary::default();
        let mut stream = source.load_all()?;

        while let Some(block) = stream.read()? {
            if block.num_columns() == 0 {
                break;
            }
            load_block(table, &block, summary.blocks)?;
            summary.rows += block.num_rows();
            summary.blocks += 1;
        }

        Ok(summary)
    }
}

fn load_block(table: &mut AttributeTable, block: &Block, block_index: usize) -> DictionaryResult<()> {
    let expected_columns = table.len() + 1;
    if block.num_columns() != expected_columns {
        return Err(DictionaryError::malformed_block(
            block_index,
            format!("expected {expected_columns} columns, got {}", block.num_columns()),
        ));
    }

    let rows = block.num_rows();
    if let Some(position) = block.columns().iter().position(|column| column.len() != rows) {
        return Err(DictionaryError::malformed_block(
            block_index,
            format!(
                "column {position} has {} rows, identifier column has {rows}",
                block.columns()[position].len()
            ),
        ));
    }

    let ids = block.columns()[0]
        .iter()
        .map(|cell| match cell {
            Field::UInt64(id) => Ok(*id),
            Field::Int64(id) => Ok(*id as u64),
            Field::Float64(_) | Field::String(_) => Err(DictionaryError::malformed_block(
                block_index,
                format!("identifier column holds a {} value", cell.type_name()),
            )),
        })
        .collect::<DictionaryResult<Vec<u64>>>()?;

    debug!(block_index, rows, "Loading block");

    for (attribute_index, column) in block.columns()[1..].iter().enumerate() {
        for (id, value) in ids.iter().zip(column) {
            table.set_attribute_value(attribute_index, *id, value)?;
        }
    }

    Ok(())
}
