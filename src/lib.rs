//! slab-hashtable: a fixed-capacity, index-linked hash table with chaining
//! that performs no heap allocation per operation.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a key→value container for hot paths where the number of entries
//!   is known up front (resources, instances, bindings) and every lookup is
//!   by an already-hashed integer key.
//! - Layers:
//!   - EntryStore<K, V>: fixed slab of entries. Bump-allocates past a
//!     high-water mark, then recycles released slots from a LIFO free list
//!     threaded through the entries' `next` field.
//!   - TableMemory<K, V>: bucket heads plus an EntryStore; the single block of
//!     storage a table either owns or borrows from its caller.
//!   - HashTable<K, V, M>: chains keys per bucket (`key mod bucket_count`),
//!     exposes put/get/erase, growth by full rehash, and two traversals
//!     (callback and cursor).
//!
//! Constraints
//! - Growth is explicit: `set_capacity` rehashes into new storage in O(n).
//!   There is no load-factor trigger.
//! - Links are `u32` indices; `u32::MAX` is the shared "none" sentinel for
//!   empty buckets, chain ends and the empty free list.
//! - Single-threaded structure with no internal locking; `&mut` access gives
//!   the one-writer discipline.
//! - Values are `Copy`. Overwrite, erase and clear never run destructors.
//!
//! Failure policy
//! - Contract violations panic: `put` of a new key on a full table, `put` or
//!   `erase` on a table that was never sized, `erase` of an absent key, and
//!   shrinking or zero-bucket `set_capacity`.
//! - A lookup miss is ordinary and yields `None`.
//! - `try_put` / `try_erase` return `TableError` instead of panicking.
//!
//! Storage ownership
//! - `HashTable::new` / `with_capacity` own their `TableMemory` and free it
//!   on drop.
//! - `HashTable::from_memory` borrows a caller's `TableMemory` through a
//!   `TableStorage`. The block survives the table and can be reused.
//! - Growth always allocates: `set_capacity` on a borrowing table rehashes
//!   into an owned block and releases the caller's block without freeing it.
//! - `TableMemory` is itself heap-backed; it cannot live inline in a static
//!   or a caller-provided byte buffer.

mod entry_store;
mod error;
mod hash_table;
mod hash_table_proptest;
mod iter;
mod key;
mod memory;

pub use entry_store::NIL;
pub use error::{TableError, VerifyError};
pub use hash_table::HashTable;
pub use iter::Cursor;
pub use key::TableKey;
pub use memory::{TableMemory, TableStorage};

/// Table keyed by 16-bit hashes.
pub type HashTable16<V> = HashTable<u16, V>;
/// Table keyed by 32-bit hashes.
pub type HashTable32<V> = HashTable<u32, V>;
/// Table keyed by 64-bit hashes.
pub type HashTable64<V> = HashTable<u64, V>;
