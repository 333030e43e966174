//! Row sources feeding a dictionary load
//!
//! A source hands the loader a forward-only stream of [`Block`]s. Each block is columnar:
//! column 0 carries the identifiers, followed by one value column per attribute in
//! structure order, all of equal length.

use anyhow::Result;
use flatdict_types::Field;

/// A batch of rows in columnar layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    columns: Vec<Vec<Field>>,
}

impl Block {
    pub fn new(columns: Vec<Vec<Field>>) -> Self {
        Self { columns }
    }

    /// Transpose `(id, values)` rows into a block with `attribute_count + 1` columns
    pub fn from_rows<I>(attribute_count: usize, rows: I) -> Self
    where
        I: IntoIterator<Item = (u64, Vec<Field>)>,
    {
        let mut columns: Vec<Vec<Field>> = vec![Vec::new(); attribute_count + 1];
        for (id, values) in rows {
            columns[0].push(Field::UInt64(id));
            for (column, value) in columns[1..].iter_mut().zip(values) {
                column.push(value);
            }
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[Vec<Field>] {
        &self.columns
    }

    /// Column at `position`; position 0 holds the identifiers
    pub fn column(&self, position: usize) -> Option<&[Field]> {
        self.columns.get(position).map(Vec::as_slice)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Row count, taken from the identifier column
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }
}

/// Forward-only stream of blocks; `Ok(None)` ends the stream
pub trait BlockStream {
    fn read(&mut self) -> Result<Option<Block>>;
}

/// Provider of dictionary rows
pub trait DictionarySource: Send {
    /// Start a full, single-pass read of the source
    fn load_all(&mut self) -> Result<Box<dyn BlockStream + '_>>;

    /// Release any buffers retained for the last read
    fn reset(&mut self);
}

/// Source serving blocks that are already in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    blocks: Vec<Block>,
    reset_count: usize,
}

impl MemorySource {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks, reset_count: 0 }
    }

    /// Split `rows` into blocks of at most `block_size` rows
    pub fn from_rows<I>(attribute_count: usize, block_size: usize, rows: I) -> Self
    where
        I: IntoIterator<Item = (u64, Vec<Field>)>,
    {
        let block_size = block_size.max(1);
        let mut blocks = Vec::new();
        let mut pending = Vec::with_capacity(block_size);

        for row in rows {
            pending.push(row);
            if pending.len() == block_size {
                blocks.push(Block::from_rows(attribute_count, pending.drain(..)));
            }
        }
        if !pending.is_empty() {
            blocks.push(Block::from_rows(attribute_count, pending));
        }

        Self::new(blocks)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// How many times `reset` has been called
    pub fn reset_count(&self) -> usize {
        self.reset_count
    }
}

struct MemoryBlockStream<'a> {
    blocks: std::slice::Iter<'a, Block>,
}

impl BlockStream for MemoryBlockStream<'_> {
    fn read(&mut self) -> Result<Option<Block>> {
        Ok(self.blocks.next().cloned())
    }
}

impl DictionarySource for MemorySource {
    fn load_all(&mut self) -> Result<Box<dyn BlockStream + '_>> {
        Ok(Box::new(MemoryBlockStream { blocks: self.blocks.iter() }))
    }

    fn reset(&mut self) {
        self.blocks = Vec::new();
        self.reset_count += 1;
    }
}
