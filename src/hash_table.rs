//! HashTable: chained buckets over an index-linked entry slab.

use crate::entry_store::NIL;
use crate::error::{TableError, VerifyError};
use crate::key::TableKey;
use crate::memory::{TableMemory, TableStorage};
use core::borrow::{Borrow, BorrowMut};
use core::fmt;
use core::marker::PhantomData;
use hashbrown::HashSet;

/// Fixed-capacity hash table with separate chaining.
///
/// `M` is the storage: an owned `TableMemory` (the default) or a
/// [`TableStorage`] that starts out on a block lent by the caller via
/// [`HashTable::from_memory`]. Growing a borrowing table moves it onto
/// storage it owns and hands the caller's block back untouched.
pub struct HashTable<K, V, M = TableMemory<K, V>> {
    pub(crate) memory: M,
    pub(crate) count: u32,
    _pd: PhantomData<(K, V)>,
}

impl<K, V> HashTable<K, V>
where
    K: TableKey,
    V: Copy,
{
    /// A never-sized table. `set_capacity` must run before the first `put`.
    pub fn new() -> Self {
        Self {
            memory: TableMemory::default(),
            count: 0,
            _pd: PhantomData,
        }
    }

    /// A self-allocated table with `bucket_count` chains and room for
    /// `capacity` entries.
    pub fn with_capacity(bucket_count: u32, capacity: u32) -> Self {
        Self {
            memory: TableMemory::new(bucket_count, capacity),
            count: 0,
            _pd: PhantomData,
        }
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: TableKey,
    V: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> HashTable<K, V, TableStorage<'a, K, V>>
where
    K: TableKey,
    V: Copy,
{
    /// Build an empty table on caller-supplied storage. The block is reset;
    /// the table never frees it, and `set_capacity` releases it in favour of
    /// a block the table allocates.
    pub fn from_memory(memory: &'a mut TableMemory<K, V>) -> Self {
        memory.reset();
        tracing::trace!(
            bucket_count = memory.bucket_count(),
            capacity = memory.capacity(),
            "hash table adopted caller memory"
        );
        Self {
            memory: TableStorage::Borrowed(memory),
            count: 0,
            _pd: PhantomData,
        }
    }

    /// True while the table still runs on the caller's block.
    pub fn uses_caller_memory(&self) -> bool {
        self.memory.is_borrowed()
    }
}

impl<K, V, M> HashTable<K, V, M>
where
    K: TableKey,
    V: Copy,
    M: BorrowMut<TableMemory<K, V>>,
{
    #[inline]
    pub(crate) fn mem(&self) -> &TableMemory<K, V> {
        self.memory.borrow()
    }

    #[inline]
    pub(crate) fn mem_mut(&mut self) -> &mut TableMemory<K, V> {
        self.memory.borrow_mut()
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.mem().capacity()
    }

    pub fn bucket_count(&self) -> usize {
        self.mem().bucket_count()
    }

    /// True when every entry slot is taken; `put` of a new key would panic.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Drop every entry. Buckets and allocator return to their initial state;
    /// storage is kept.
    pub fn clear(&mut self) {
        self.mem_mut().reset();
        self.count = 0;
    }

    pub(crate) fn find_index(&self, key: K) -> Option<u32> {
        let mem = self.mem();
        if mem.buckets.is_empty() {
            return None;
        }
        let mut at = mem.buckets[key.bucket(mem.buckets.len() as u32) as usize];
        while at != NIL {
            let e = mem.store.entry(at);
            if e.key == key {
                return Some(at);
            }
            at = e.next;
        }
        None
    }

    pub fn get(&self, key: K) -> Option<&V> {
        let idx = self.find_index(key)?;
        Some(&self.mem().store.entry(idx).value)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let idx = self.find_index(key)?;
        Some(&mut self.mem_mut().store.entry_mut(idx).value)
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.find_index(key).is_some()
    }

    /// Insert `key`, or overwrite its value in place if present.
    ///
    /// Panics if the table was never sized, or if `key` is new and the table
    /// is `is_full()`.
    pub fn put(&mut self, key: K, value: V) {
        if let Err(e) = self.try_put(key, value) {
            panic!("put failed: {e}");
        }
    }

    /// Like `put`, but reports a refused insert instead of panicking.
    pub fn try_put(&mut self, key: K, value: V) -> Result<(), TableError> {
        let count = self.count;
        let mem = self.mem_mut();
        if mem.buckets.is_empty() {
            return Err(TableError::NotSized);
        }
        let b = key.bucket(mem.buckets.len() as u32) as usize;

        let mut tail = NIL;
        let mut at = mem.buckets[b];
        while at != NIL {
            let e = mem.store.entry_mut(at);
            if e.key == key {
                e.value = value;
                return Ok(());
            }
            tail = at;
            at = e.next;
        }

        if count as usize == mem.capacity() {
            return Err(TableError::Full);
        }
        debug_assert!(!mem.store.exhausted());
        let idx = mem.store.allocate(key, value);
        if tail == NIL {
            mem.buckets[b] = idx;
        } else {
            mem.store.entry_mut(tail).next = idx;
        }
        self.count += 1;
        Ok(())
    }

    /// Remove `key`.
    ///
    /// Panics if the table was never sized or `key` is absent; use `get` or
    /// `try_erase` when presence is uncertain.
    pub fn erase(&mut self, key: K) {
        if let Err(e) = self.try_erase(key) {
            panic!("erase failed: {e}");
        }
    }

    /// Like `erase`, but reports a missing key instead of panicking.
    pub fn try_erase(&mut self, key: K) -> Result<(), TableError> {
        let mem = self.mem_mut();
        if mem.buckets.is_empty() {
            return Err(TableError::NotSized);
        }
        let b = key.bucket(mem.buckets.len() as u32) as usize;

        let mut prev = NIL;
        let mut at = mem.buckets[b];
        while at != NIL {
            let e = mem.store.entry(at);
            let next = e.next;
            if e.key == key {
                if prev == NIL {
                    mem.buckets[b] = next;
                } else {
                    mem.store.entry_mut(prev).next = next;
                }
                mem.store.release(at);
                self.count -= 1;
                return Ok(());
            }
            prev = at;
            at = next;
        }
        Err(TableError::KeyNotFound)
    }

    /// Exchange storage and counters with `other` in O(1).
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Check the chains against the free list and the live count.
    ///
    /// Diagnostic only; walks every bucket and the whole free list.
    pub fn verify(&self) -> Result<(), VerifyError> {
        let mem = self.mem();
        let free: HashSet<u32> = mem.store.free_list().collect();
        let high_water = mem.store.high_water();

        let mut reachable = 0u32;
        for (b, &head) in mem.buckets.iter().enumerate() {
            let bucket = b as u32;
            let mut at = head;
            while at != NIL {
                if at >= high_water {
                    return Err(VerifyError::CorruptChain { bucket });
                }
                if free.contains(&at) {
                    return Err(VerifyError::FreeEntryInChain { bucket, index: at });
                }
                reachable += 1;
                if reachable > self.count {
                    // Either a cycle or a chain that leaks into another one.
                    return Err(VerifyError::CountMismatch {
                        reachable,
                        count: self.count,
                    });
                }
                at = mem.store.entry(at).next;
            }
        }
        if reachable != self.count {
            return Err(VerifyError::CountMismatch {
                reachable,
                count: self.count,
            });
        }
        Ok(())
    }
}

impl<K, V, M> HashTable<K, V, M>
where
    K: TableKey,
    V: Copy,
    M: BorrowMut<TableMemory<K, V>> + From<TableMemory<K, V>>,
{
    /// Grow to `bucket_count` chains and `capacity` entries, rehashing every
    /// live entry into fresh storage.
    ///
    /// The new block is always allocated by the table. A caller's block lent
    /// through `from_memory` is released, not freed, and can be reused.
    ///
    /// Panics if `bucket_count` is zero, either value is `u32::MAX`, or
    /// `capacity` is smaller than the current capacity. Nothing is touched
    /// before these checks pass.
    pub fn set_capacity(&mut self, bucket_count: u32, capacity: u32) {
        assert!(bucket_count > 0, "bucket count must be at least 1");
        assert!(bucket_count < NIL, "bucket count must be below {NIL}");
        assert!(capacity < NIL, "capacity must be below {NIL}");
        assert!(
            capacity as usize >= self.capacity(),
            "shrinking capacity is not supported ({} -> {})",
            self.capacity(),
            capacity
        );

        if self.bucket_count() == 0 {
            self.memory = M::from(TableMemory::new(bucket_count, capacity));
            self.count = 0;
            tracing::debug!(bucket_count, capacity, "hash table sized");
            return;
        }

        let mut grown: HashTable<K, V> = HashTable::with_capacity(bucket_count, capacity);
        self.iterate(&mut grown, |grown, &k, &v| grown.put(k, v));
        tracing::debug!(
            old_bucket_count = self.bucket_count(),
            old_capacity = self.capacity(),
            bucket_count,
            capacity,
            migrated = self.count,
            "hash table rehashed"
        );
        // Dropping the old storage frees an owned block and only ends the
        // borrow of a lent one.
        self.memory = M::from(grown.memory);
        self.count = grown.count;
    }
}

impl<K, V, M> fmt::Debug for HashTable<K, V, M>
where
    K: TableKey + fmt::Debug,
    V: Copy + fmt::Debug,
    M: BorrowMut<TableMemory<K, V>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_store::Entry;
    use std::collections::BTreeMap;

    /// Invariant: Keys sharing one bucket all stay reachable; erasing the
    /// head of the chain keeps the tail.
    #[test]
    fn single_bucket_chain() {
        let mut t: HashTable<u32, &str> = HashTable::with_capacity(1, 2);
        t.put(1, "a");
        t.put(2, "b");
        assert_eq!(t.get(1), Some(&"a"));
        assert_eq!(t.get(2), Some(&"b"));
        assert_eq!(t.len(), 2);

        t.erase(1);
        assert_eq!(t.get(1), None);
        assert_eq!(t.get(2), Some(&"b"));
        assert_eq!(t.len(), 1);
        t.verify().unwrap();
    }

    /// Invariant: New entries are appended at the chain tail.
    #[test]
    fn chain_appends_at_tail() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(2, 4);
        for k in [4, 0, 2, 6] {
            t.put(k, k * 10);
        }
        let order: Vec<u32> = t.iter().map(|(&k, _)| k).collect();
        assert_eq!(order, vec![4, 0, 2, 6]);
    }

    /// Invariant: Overwriting keeps the slot and the count.
    #[test]
    fn put_existing_key_overwrites_in_place() {
        let mut t: HashTable<u64, i32> = HashTable::with_capacity(3, 3);
        t.put(7, 1);
        let before = t.find_index(7);
        t.put(7, 2);
        assert_eq!(t.find_index(7), before);
        assert_eq!(t.get(7), Some(&2));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: Overwrite is allowed on a full table.
    #[test]
    fn overwrite_on_full_table_succeeds() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(2, 2);
        t.put(1, 1);
        t.put(2, 2);
        assert!(t.is_full());
        t.put(2, 20);
        assert_eq!(t.get(2), Some(&20));
        assert_eq!(t.try_put(3, 3), Err(TableError::Full));
    }

    /// Invariant: Erasing from the middle of a chain relinks the previous node.
    #[test]
    fn erase_middle_of_chain() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(1, 3);
        t.put(1, 10);
        t.put(2, 20);
        t.put(3, 30);
        t.erase(2);
        let order: Vec<u32> = t.iter().map(|(&k, _)| k).collect();
        assert_eq!(order, vec![1, 3]);
        assert_eq!(t.get(3), Some(&30));
        t.verify().unwrap();
    }

    /// Invariant: A recycled slot serves the new key and never resolves the old one.
    #[test]
    fn recycled_slot_does_not_alias() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(2, 2);
        t.put(1, 100);
        t.put(2, 200);
        let old = t.find_index(1).unwrap();
        t.erase(1);
        t.put(3, 300);
        assert_eq!(t.find_index(3), Some(old));
        assert_eq!(t.get(1), None);
        assert_eq!(t.get(3), Some(&300));
        assert_eq!(t.try_erase(1), Err(TableError::KeyNotFound));
        t.erase(3);
        assert_eq!(t.get(2), Some(&200));
        t.verify().unwrap();
    }

    #[test]
    fn get_mut_updates_value() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(4, 4);
        t.put(9, 1);
        *t.get_mut(9).unwrap() += 41;
        assert_eq!(t.get(9), Some(&42));
        assert!(t.get_mut(10).is_none());
    }

    /// Invariant: An unsized table answers lookups and refuses mutation.
    #[test]
    fn unsized_table() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        assert_eq!(t.get(1), None);
        assert!(!t.contains_key(1));
        assert!(t.is_empty());
        assert!(t.is_full(), "zero capacity is full");
        assert_eq!(t.try_put(1, 1), Err(TableError::NotSized));
        assert_eq!(t.try_erase(1), Err(TableError::NotSized));
        t.clear();
        t.verify().unwrap();
    }

    #[test]
    #[should_panic(expected = "hash table has no buckets")]
    fn erase_on_unsized_table_panics() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        t.erase(0);
    }

    /// Invariant: Sizing a never-sized table allocates without migration.
    #[test]
    fn set_capacity_on_new_table() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        t.set_capacity(3, 5);
        assert_eq!(t.bucket_count(), 3);
        assert_eq!(t.capacity(), 5);
        t.put(4, 4);
        assert_eq!(t.get(4), Some(&4));
    }

    /// Invariant: Rehash recomputes chains against the new bucket count.
    #[test]
    fn rehash_redistributes_chains() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(1, 4);
        for k in 0..4 {
            t.put(k, k + 100);
        }
        t.set_capacity(4, 6);
        let mem = t.mem();
        for k in 0..4u32 {
            let head = mem.buckets[k as usize];
            assert_ne!(head, NIL);
            let Entry { key, value, next } = *mem.store.entry(head);
            assert_eq!((key, value, next), (k, k + 100, NIL));
        }
        t.verify().unwrap();
    }

    /// Invariant: Rehash leaves no free-list holes; the new slab is dense.
    #[test]
    fn rehash_compacts_slab() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(2, 4);
        for k in 0..4 {
            t.put(k, k);
        }
        t.erase(0);
        t.erase(2);
        t.set_capacity(2, 4);
        assert_eq!(t.mem().store.high_water(), 2);
        assert_eq!(t.mem().store.free_list().count(), 0);
        t.put(10, 10);
        t.put(12, 12);
        assert!(t.is_full());
        t.verify().unwrap();
    }

    #[test]
    #[should_panic(expected = "shrinking capacity is not supported")]
    fn shrink_panics() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(4, 8);
        t.set_capacity(4, 4);
    }

    #[test]
    #[should_panic(expected = "bucket count must be at least 1")]
    fn zero_bucket_resize_panics() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(4, 8);
        t.set_capacity(0, 8);
    }

    #[test]
    #[should_panic(expected = "bucket count must be below")]
    fn bucket_count_at_sentinel_panics() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(4, 8);
        t.set_capacity(NIL, 8);
    }

    #[test]
    #[should_panic(expected = "capacity must be below")]
    fn capacity_at_sentinel_panics() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(4, 8);
        t.set_capacity(4, NIL);
    }

    /// Invariant: A failed resize leaves the table untouched.
    #[test]
    fn failed_resize_keeps_contents() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(2, 4);
        t.put(1, 1);
        t.put(2, 2);
        for (buckets, capacity) in [(8, 2), (0, 8), (NIL, 8), (8, NIL)] {
            let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                t.set_capacity(buckets, capacity);
            }));
            assert!(res.is_err(), "set_capacity({buckets}, {capacity}) should panic");
            assert_eq!(t.capacity(), 4);
            assert_eq!(t.bucket_count(), 2);
            assert_eq!(t.get(1), Some(&1));
            assert_eq!(t.get(2), Some(&2));
            t.verify().unwrap();
        }
    }

    /// Invariant: Growing a table on caller memory moves it to its own
    /// storage; the caller's block keeps its size and serves the next table.
    #[test]
    fn borrowed_table_grows_into_owned_storage() {
        let mut memory: TableMemory<u32, u32> = TableMemory::new(2, 2);
        {
            let mut t = HashTable::from_memory(&mut memory);
            t.put(1, 10);
            t.put(2, 20);
            assert!(t.is_full());
            assert!(t.uses_caller_memory());

            t.set_capacity(4, 8);
            assert!(!t.uses_caller_memory());
            assert_eq!((t.bucket_count(), t.capacity(), t.len()), (4, 8, 2));
            assert_eq!(t.get(1), Some(&10));
            assert_eq!(t.get(2), Some(&20));
            t.put(3, 30);
            t.verify().unwrap();
        }
        assert_eq!((memory.bucket_count(), memory.capacity()), (2, 2));

        let mut again = HashTable::from_memory(&mut memory);
        assert!(again.is_empty());
        again.put(5, 50);
        again.put(6, 60);
        assert!(again.is_full());
        again.verify().unwrap();
    }

    /// Invariant: An unsized caller block is replaced on first sizing.
    #[test]
    fn borrowed_unsized_block_is_sized_by_table() {
        let mut memory: TableMemory<u32, u32> = TableMemory::default();
        let mut t = HashTable::from_memory(&mut memory);
        assert_eq!(t.try_put(1, 1), Err(TableError::NotSized));
        t.set_capacity(3, 3);
        assert!(!t.uses_caller_memory());
        t.put(1, 1);
        assert_eq!(t.get(1), Some(&1));
        drop(t);
        assert_eq!(memory.bucket_count(), 0);
    }

    #[test]
    fn clear_resets_allocator() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(2, 2);
        t.put(1, 1);
        t.put(2, 2);
        t.erase(1);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.get(2), None);
        assert_eq!(t.mem().store.high_water(), 0);
        t.put(5, 5);
        t.put(6, 6);
        assert!(t.is_full());
        t.verify().unwrap();
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a: HashTable<u32, u32> = HashTable::with_capacity(2, 2);
        let mut b: HashTable<u32, u32> = HashTable::with_capacity(8, 16);
        a.put(1, 1);
        b.put(2, 2);
        b.put(3, 3);
        a.swap(&mut b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.capacity(), 16);
        assert_eq!(a.get(2), Some(&2));
        assert_eq!(b.len(), 1);
        assert_eq!(b.bucket_count(), 2);
        assert_eq!(b.get(1), Some(&1));
    }

    /// Invariant: verify flags a freed slot that is still linked from a bucket.
    #[test]
    fn verify_detects_free_entry_in_chain() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(2, 2);
        t.put(0, 0);
        t.put(1, 1);
        let idx = t.find_index(1).unwrap();
        t.mem_mut().store.release(idx);
        assert_eq!(
            t.verify(),
            Err(VerifyError::FreeEntryInChain { bucket: 1, index: idx })
        );
    }

    #[test]
    fn verify_detects_count_mismatch_and_cycles() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(1, 2);
        t.put(0, 0);
        t.put(1, 1);
        t.count = 1;
        assert!(matches!(
            t.verify(),
            Err(VerifyError::CountMismatch { count: 1, .. })
        ));
        t.count = 2;
        // Point the tail back at the head.
        let head = t.mem().buckets[0];
        let tail = t.mem().store.entry(head).next;
        t.mem_mut().store.entry_mut(tail).next = head;
        assert!(t.verify().is_err());
    }

    #[test]
    fn debug_renders_as_map() {
        let mut t: HashTable<u32, char> = HashTable::with_capacity(4, 4);
        t.put(1, 'x');
        t.put(2, 'y');
        let shown = format!("{t:?}");
        let expected: BTreeMap<u32, char> = [(1, 'x'), (2, 'y')].into_iter().collect();
        assert_eq!(shown, format!("{expected:?}"));
    }
}
