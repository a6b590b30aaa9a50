//! Error types for the non-panicking table operations and for `verify`.

use core::fmt;

/// Why a `try_put` or `try_erase` was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The table has no buckets yet; call `set_capacity` first.
    NotSized,
    /// Every entry slot is in use.
    Full,
    /// The key is not in the table.
    KeyNotFound,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::NotSized => f.write_str("hash table has no buckets"),
            TableError::Full => f.write_str("hash table is full"),
            TableError::KeyNotFound => f.write_str("key not present in hash table"),
        }
    }
}

impl std::error::Error for TableError {}

/// Structural corruption found by `HashTable::verify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// A slot on the free list is also linked into a live chain.
    FreeEntryInChain { bucket: u32, index: u32 },
    /// A chain points past the allocated slots or loops.
    CorruptChain { bucket: u32 },
    /// Entries reachable from the buckets differ from the live count.
    CountMismatch { reachable: u32, count: u32 },
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::FreeEntryInChain { bucket, index } => {
                write!(f, "free entry {index} is linked from bucket {bucket}")
            }
            VerifyError::CorruptChain { bucket } => {
                write!(f, "chain of bucket {bucket} is out of bounds or cyclic")
            }
            VerifyError::CountMismatch { reachable, count } => {
                write!(f, "{reachable} entries reachable but count is {count}")
            }
        }
    }
}

impl std::error::Error for VerifyError {}
