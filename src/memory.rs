//! TableMemory: the storage block behind a `HashTable`.
//!
//! A table either owns its `TableMemory` (self-allocated, freed on drop) or
//! borrows one from the caller through `HashTable::from_memory`, in which case
//! the block outlives the table and can be handed to another table later.
//! A borrowing table that grows moves into storage of its own; the caller's
//! block is left in place and never freed by the table.

use crate::entry_store::{EntryStore, NIL};
use core::borrow::{Borrow, BorrowMut};

/// Bucket heads plus entry slab, sized once at construction.
///
/// The block itself is heap-allocated by `new`: the caller owns and reuses it,
/// but cannot place it inline (in a static or a fixed byte array).
#[derive(Debug)]
pub struct TableMemory<K, V> {
    pub(crate) buckets: Box<[u32]>,
    pub(crate) store: EntryStore<K, V>,
}

impl<K, V> TableMemory<K, V> {
    /// Allocate room for `bucket_count` chains and `capacity` entries.
    ///
    /// Panics if `bucket_count` is zero or either size reaches `u32::MAX`.
    pub fn new(bucket_count: u32, capacity: u32) -> Self {
        assert!(bucket_count > 0, "bucket count must be at least 1");
        assert!(bucket_count < NIL, "bucket count must be below {NIL}");
        assert!(capacity < NIL, "capacity must be below {NIL}");
        Self {
            buckets: vec![NIL; bucket_count as usize].into_boxed_slice(),
            store: EntryStore::new(capacity),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity() as usize
    }

    /// Empty every bucket and rewind the entry allocator.
    pub(crate) fn reset(&mut self) {
        self.buckets.fill(NIL);
        self.store.reset();
    }
}

impl<K, V> Default for TableMemory<K, V> {
    /// A never-sized block: no buckets, no entries, no allocation.
    fn default() -> Self {
        Self {
            buckets: Box::default(),
            store: EntryStore::new(0),
        }
    }
}

/// Storage of a table built by `HashTable::from_memory`: the caller's block
/// until the table grows, then a block the table allocated itself.
#[derive(Debug)]
pub enum TableStorage<'a, K, V> {
    Borrowed(&'a mut TableMemory<K, V>),
    Owned(TableMemory<K, V>),
}

impl<'a, K, V> TableStorage<'a, K, V> {
    pub fn is_borrowed(&self) -> bool {
        matches!(self, TableStorage::Borrowed(_))
    }
}

impl<'a, K, V> From<TableMemory<K, V>> for TableStorage<'a, K, V> {
    fn from(memory: TableMemory<K, V>) -> Self {
        TableStorage::Owned(memory)
    }
}

impl<'a, K, V> From<&'a mut TableMemory<K, V>> for TableStorage<'a, K, V> {
    fn from(memory: &'a mut TableMemory<K, V>) -> Self {
        TableStorage::Borrowed(memory)
    }
}

impl<'a, K, V> Borrow<TableMemory<K, V>> for TableStorage<'a, K, V> {
    fn borrow(&self) -> &TableMemory<K, V> {
        match self {
            TableStorage::Borrowed(m) => m,
            TableStorage::Owned(m) => m,
        }
    }
}

impl<'a, K, V> BorrowMut<TableMemory<K, V>> for TableStorage<'a, K, V> {
    fn borrow_mut(&mut self) -> &mut TableMemory<K, V> {
        match self {
            TableStorage::Borrowed(m) => m,
            TableStorage::Owned(m) => m,
        }
    }
}
