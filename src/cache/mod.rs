//! Two-tier cache: a generic in-memory LRU, atomic on-disk I/O, and the
//! super-chunk / stream-chunk caches built on top of both.

pub mod disk;
pub mod memory;
pub mod streamchunk_cache;
pub mod superchunk_cache;

pub use memory::LruCache;
pub use streamchunk_cache::StreamChunkCache;
pub use superchunk_cache::{SuperChunkCache, SuperChunkMetadata};
