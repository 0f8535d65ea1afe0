//! beacon-services — the node directory and the stores behind it.

pub mod directory;
pub mod resp;

pub use directory::{open_store, DirectoryStore, MemoryStore, RedisStore, StoreError};
