//! Content interning cache for rope values.
//!
//! Interning returns one shared canonical instance for logically equal
//! content instead of allocating duplicates, so equal strings can be
//! compared by identity as a fast path. The cache holds its entries
//! weakly: once every strong holder of a rope drops it, the entry may be
//! reclaimed and is pruned lazily on a later lookup.
#![deny(clippy::all)]
mod cache;
mod key;

pub use cache::RopeCache;
pub use key::{BytesKey, StringKey};
