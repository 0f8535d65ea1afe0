//! Node directory — name → observed address.
//!
//! One trait, two stores:
//! - [`MemoryStore`]: process-local, entries live until the process exits.
//! - [`RedisStore`]: networked, every entry expires a fixed TTL after its
//!   last write.
//!
//! The daemon picks one at startup from config and hands it to the HTTP
//! layer as `Arc<dyn DirectoryStore>`.

mod memory;
mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beacon_core::DirectoryBackend;

use crate::resp::RespError;

pub use memory::MemoryStore;
pub use redis::{RedisManager, RedisStore};

/// A name → address store shared by all in-flight requests.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Current address for `name`. `Ok(None)` when absent or expired.
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Create or overwrite the entry for `name`.
    async fn set(&self, name: &str, address: &str) -> Result<(), StoreError>;

    /// Short label for logs.
    fn backend(&self) -> &'static str;
}

/// Failure to talk to the backing store. Never used for a missing key.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection closed by server")]
    Closed,
    #[error("protocol error: {0}")]
    Protocol(#[from] RespError),
    #[error("server error: {0}")]
    Server(String),
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
    #[error("connection pool {0}")]
    Pool(&'static str),
}

impl From<mobc::Error<StoreError>> for StoreError {
    fn from(value: mobc::Error<StoreError>) -> Self {
        match value {
            mobc::Error::Inner(e) => e,
            mobc::Error::Timeout => StoreError::Pool("timed out waiting for a connection"),
            mobc::Error::BadConn => StoreError::Pool("handed out a bad connection"),
            mobc::Error::PoolClosed => StoreError::Pool("closed"),
        }
    }
}

/// Build the store selected by config.
///
/// Redis connections are opened lazily, so this never touches the network.
pub fn open_store(backend: &DirectoryBackend) -> Arc<dyn DirectoryStore> {
    match backend {
        DirectoryBackend::Memory => Arc::new(MemoryStore::new()),
        DirectoryBackend::Redis { redis, ttl } => Arc::new(RedisStore::new(redis, *ttl)),
    }
}
