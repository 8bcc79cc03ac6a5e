//! Read-through caching for upstream data.
//!
//! This module provides a source-agnostic caching mechanism that:
//! - Stores whole serialized values under a key with a time-to-live
//! - Serves unexpired values without touching the network
//! - Falls back to the fetcher when the store misses or is unreachable
//! - Ships memory, SQLite and Redis stores behind one [`CacheStore`] trait

mod backend;
mod layer;
mod memory;
mod redis;
mod sqlite;
mod traits;

pub use backend::CacheBackend;
pub use layer::{CacheLayer, DEFAULT_TTL};
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use sqlite::SqliteStore;
pub use traits::{CacheResult, CacheSource, CacheStore};
