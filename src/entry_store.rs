//! EntryStore: fixed slab of entries with bump allocation and a LIFO free list.
//!
//! Slots past the high-water mark are handed out first. Once the slab is
//! exhausted, released slots are reused newest-first. The free list is
//! threaded through `Entry::next`, the same field live chains use.

/// Index value meaning "no entry": empty bucket, end of chain, empty free list.
pub const NIL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: u32,
}

#[derive(Debug)]
pub(crate) struct EntryStore<K, V> {
    // len() is the high-water mark; the allocation never grows past `capacity`.
    slots: Vec<Entry<K, V>>,
    capacity: u32,
    free_head: u32,
}

impl<K, V> EntryStore<K, V> {
    pub(crate) fn new(capacity: u32) -> Self {
        assert!(capacity < NIL, "entry capacity must be below {NIL}");
        Self {
            slots: Vec::with_capacity(capacity as usize),
            capacity,
            free_head: NIL,
        }
    }

    pub(crate) fn capacity(&self) -> u32 {
        self.capacity
    }

    /// True when neither the bump region nor the free list has a slot left.
    pub(crate) fn exhausted(&self) -> bool {
        self.slots.len() as u32 == self.capacity && self.free_head == NIL
    }

    /// Take a slot for `(key, value)`; the returned entry's `next` is `NIL`.
    ///
    /// Panics if no slot is available. Callers check `is_full()` first.
    pub(crate) fn allocate(&mut self, key: K, value: V) -> u32 {
        let entry = Entry {
            key,
            value,
            next: NIL,
        };
        if (self.slots.len() as u32) < self.capacity {
            let idx = self.slots.len() as u32;
            self.slots.push(entry);
            return idx;
        }
        assert!(self.free_head != NIL, "entry store exhausted");
        let idx = self.free_head;
        let slot = &mut self.slots[idx as usize];
        self.free_head = slot.next;
        *slot = entry;
        idx
    }

    /// Return `idx` to the head of the free list.
    pub(crate) fn release(&mut self, idx: u32) {
        debug_assert!((idx as usize) < self.slots.len());
        self.slots[idx as usize].next = self.free_head;
        self.free_head = idx;
    }

    /// Forget every entry; keeps the allocation.
    pub(crate) fn reset(&mut self) {
        self.slots.clear();
        self.free_head = NIL;
    }

    #[inline]
    pub(crate) fn entry(&self, idx: u32) -> &Entry<K, V> {
        &self.slots[idx as usize]
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, idx: u32) -> &mut Entry<K, V> {
        &mut self.slots[idx as usize]
    }

    /// Number of slots ever handed out by the bump allocator.
    pub(crate) fn high_water(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Walk the free list from its head.
    pub(crate) fn free_list(&self) -> FreeList<'_, K, V> {
        FreeList {
            store: self,
            at: self.free_head,
            remaining: self.slots.len(),
        }
    }
}

/// Iterator over free-list indices, newest first. Stops after
/// `high_water` steps even if the list is corrupt and cyclic.
pub(crate) struct FreeList<'a, K, V> {
    store: &'a EntryStore<K, V>,
    at: u32,
    remaining: usize,
}

impl<'a, K, V> Iterator for FreeList<'a, K, V> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.at == NIL || self.remaining == 0 {
            return None;
        }
        let idx = self.at;
        self.remaining -= 1;
        self.at = self
            .store
            .slots
            .get(idx as usize)
            .map(|e| e.next)
            .unwrap_or(NIL);
        Some(idx)
    }
}
