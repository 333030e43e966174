//! Append-only string arena
//!
//! The arena owns every string byte of a string attribute for the dictionary's lifetime.
//! Insertions copy into the current chunk and hand back a [`StringRef`] handle; chunks are
//! never reallocated or released while the arena lives, so handles stay valid until the
//! arena is dropped.

use crate::constants::arena::{INITIAL_CHUNK_SIZE, LINEAR_GROWTH_THRESHOLD};
use crate::error::{DictionaryError, DictionaryResult};

/// Handle to a string stored in a [`StringArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringRef {
    chunk: u32,
    offset: u32,
    len: u32,
}

impl StringRef {
    /// Length of the referenced string in bytes
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Chunked, append-only string storage
#[derive(Debug, Default)]
pub struct StringArena {
    chunks: Vec<String>,
    bytes_used: usize,
    bytes_reserved: usize,
}

impl StringArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `value` into the arena and return a stable handle to it
    pub fn insert(&mut self, value: &str) -> DictionaryResult<StringRef> {
        let needs_chunk = match self.chunks.last() {
            Some(chunk) => chunk.capacity() - chunk.len() < value.len(),
            None => true,
        };
        if needs_chunk {
            self.add_chunk(value.len())?;
        }

        let chunk_index = self.chunks.len() - 1;
        let chunk = &mut self.chunks[chunk_index];
        let offset = chunk.len();
        chunk.push_str(value);
        self.bytes_used += value.len();

        Ok(StringRef {
            chunk: to_u32(chunk_index, "string arena chunk index")?,
            offset: to_u32(offset, "string arena offset")?,
            len: to_u32(value.len(), "string arena entry")?,
        })
    }

    /// Resolve a handle previously returned by [`StringArena::insert`] on this arena
    pub fn get(&self, string_ref: StringRef) -> &str {
        let start = string_ref.offset as usize;
        &self.chunks[string_ref.chunk as usize][start..start + string_ref.len()]
    }

    /// Bytes occupied by inserted strings
    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }

    /// Bytes reserved across all chunks, including unused tail capacity
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_reserved
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn add_chunk(&mut self, min_size: usize) -> DictionaryResult<()> {
        let next_size = match self.chunks.last() {
            None => INITIAL_CHUNK_SIZE,
            Some(last) if last.capacity() < LINEAR_GROWTH_THRESHOLD => last.capacity() * 2,
            Some(_) => LINEAR_GROWTH_THRESHOLD,
        };
        let size = next_size.max(min_size);

        let mut chunk = String::new();
        chunk
            .try_reserve_exact(size)
            .map_err(|_| DictionaryError::allocation("string arena chunk", size))?;
        self.bytes_reserved += chunk.capacity();
        self.chunks.push(chunk);
        Ok(())
    }
}

fn to_u32(value: usize, component: &str) -> DictionaryResult<u32> {
    u32::try_from(value).map_err(|_| DictionaryError::allocation(component, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_resolve() {
        let mut arena = StringArena::new();
        let a = arena.insert("Europe").unwrap();
        let b = arena.insert("").unwrap();
        let c = arena.insert("Asia").unwrap();

        assert_eq!(arena.get(a), "Europe");
        assert_eq!(arena.get(b), "");
        assert!(b.is_empty());
        assert_eq!(arena.get(c), "Asia");
        assert_eq!(arena.bytes_used(), 10);
        assert_eq!(arena.chunk_count(), 1);
    }

    #[test]
    fn test_references_survive_new_chunks() {
        let mut arena = StringArena::new();
        let first = arena.insert("first").unwrap();

        let big = "x".repeat(INITIAL_CHUNK_SIZE * 3);
        let second = arena.insert(&big).unwrap();
        let third = arena.insert("third").unwrap();

        assert!(arena.chunk_count() >= 2);
        assert_eq!(arena.get(first), "first");
        assert_eq!(arena.get(second).len(), INITIAL_CHUNK_SIZE * 3);
        assert_eq!(arena.get(third), "third");
        assert!(arena.bytes_allocated() >= arena.bytes_used());
    }

    #[test]
    fn test_insertions_are_disjoint() {
        let mut arena = StringArena::new();
        let refs: Vec<_> =
            (0..1000).map(|i| (i, arena.insert(&format!("value-{i}")).unwrap())).collect();

        for (i, string_ref) in refs {
            assert_eq!(arena.get(string_ref), format!("value-{i}"));
        }
    }

    #[test]
    fn test_multibyte_strings() {
        let mut arena = StringArena::new();
        let r = arena.insert("Zürich – 東京").unwrap();
        assert_eq!(arena.get(r), "Zürich – 東京");
    }
}
