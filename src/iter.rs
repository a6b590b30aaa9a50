//! Traversal: a callback pass and a stateful cursor.
//!
//! Both walk buckets in ascending order and each chain head to tail. That
//! order is neither insertion order nor key order.

use crate::entry_store::NIL;
use crate::hash_table::HashTable;
use crate::key::TableKey;
use crate::memory::TableMemory;
use core::borrow::BorrowMut;
use core::iter::FusedIterator;

impl<K, V, M> HashTable<K, V, M>
where
    K: TableKey,
    V: Copy,
    M: BorrowMut<TableMemory<K, V>>,
{
    /// Call `visit(ctx, key, value)` once per live entry.
    pub fn iterate<C, F>(&self, ctx: &mut C, mut visit: F)
    where
        F: FnMut(&mut C, &K, &V),
    {
        let mem = self.mem();
        for &head in mem.buckets.iter() {
            let mut at = head;
            while at != NIL {
                let e = mem.store.entry(at);
                visit(ctx, &e.key, &e.value);
                at = e.next;
            }
        }
    }

    /// Like `iterate`, with mutable access to each value.
    pub fn iterate_mut<C, F>(&mut self, ctx: &mut C, mut visit: F)
    where
        F: FnMut(&mut C, &K, &mut V),
    {
        let mem = self.mem_mut();
        for b in 0..mem.buckets.len() {
            let mut at = mem.buckets[b];
            while at != NIL {
                let e = mem.store.entry_mut(at);
                visit(ctx, &e.key, &mut e.value);
                at = e.next;
            }
        }
    }

    /// A cursor positioned before the first entry.
    pub fn cursor(&self) -> Cursor<'_, K, V> {
        Cursor {
            memory: self.mem(),
            next_bucket: 0,
            at: NIL,
            remaining: self.len(),
            done: false,
        }
    }

    pub fn iter(&self) -> Cursor<'_, K, V> {
        self.cursor()
    }
}

impl<'a, K, V, M> IntoIterator for &'a HashTable<K, V, M>
where
    K: TableKey,
    V: Copy,
    M: BorrowMut<TableMemory<K, V>>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Cursor<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.cursor()
    }
}

/// Stateful walk over one table.
///
/// Starts before the first entry; `advance` moves to the next one. Once it
/// runs off the end it stays exhausted. Make a new cursor to walk again.
pub struct Cursor<'a, K, V> {
    memory: &'a TableMemory<K, V>,
    next_bucket: usize,
    at: u32,
    remaining: usize,
    done: bool,
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// Step to the next entry. Returns false once the table is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.done {
            return false;
        }
        if self.at != NIL {
            let next = self.memory.store.entry(self.at).next;
            if next != NIL {
                self.at = next;
                self.remaining -= 1;
                return true;
            }
        }
        while self.next_bucket < self.memory.buckets.len() {
            let head = self.memory.buckets[self.next_bucket];
            self.next_bucket += 1;
            if head != NIL {
                self.at = head;
                self.remaining -= 1;
                return true;
            }
        }
        self.at = NIL;
        self.done = true;
        false
    }

    /// Key at the current position; `None` before the first `advance` or
    /// after exhaustion.
    pub fn key(&self) -> Option<&'a K> {
        let memory = self.memory;
        if self.at == NIL {
            return None;
        }
        Some(&memory.store.entry(self.at).key)
    }

    pub fn value(&self) -> Option<&'a V> {
        let memory = self.memory;
        if self.at == NIL {
            return None;
        }
        Some(&memory.store.entry(self.at).value)
    }

    pub fn is_exhausted(&self) -> bool {
        self.done
    }
}

impl<'a, K, V> Iterator for Cursor<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.advance() {
            return None;
        }
        let e = self.memory.store.entry(self.at);
        Some((&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Cursor<'a, K, V> {}

impl<'a, K, V> FusedIterator for Cursor<'a, K, V> {}
