//! Keys usable with `HashTable`.
//!
//! Callers are expected to hand in keys that are already hashed (resource
//! path hashes, instance ids, ...), so the bucket is simply the key modulo
//! the bucket count.

/// A key that can select a bucket by modulo.
pub trait TableKey: Copy + Eq {
    /// Returns `self mod bucket_count`. `bucket_count` is never zero.
    fn bucket(self, bucket_count: u32) -> u32;
}

macro_rules! impl_table_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl TableKey for $t {
                #[inline]
                fn bucket(self, bucket_count: u32) -> u32 {
                    // Widen first so narrow keys never truncate the divisor.
                    (self as u64 % u64::from(bucket_count)) as u32
                }
            }
        )*
    };
}

impl_table_key!(u16, u32, u64, usize);
