//! Redis-backed directory with per-entry expiry.
//!
//! Each entry is a plain string key `<prefix><name>` written with
//! `SET key value PX <ttl>`, so Redis drops it on its own once the TTL has
//! passed. A null `GET` reply is the only "not found" signal; every other
//! failure is a [`StoreError`].
//!
//! Connections come from a bounded `mobc` pool. Concurrent requests run
//! independent round trips, so for racing writes to one name the last
//! reply to land wins, not the last request to arrive.

use std::time::Duration;

use async_trait::async_trait;
use beacon_core::config::RedisConfig;
use mobc::{Manager, Pool};

use super::{DirectoryStore, StoreError};
use crate::resp::{Reply, RespConnection};

/// Opens and health-checks pooled RESP connections.
#[derive(Debug, Clone)]
pub struct RedisManager {
    redis: RedisConfig,
}

impl RedisManager {
    pub fn new(redis: RedisConfig) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl Manager for RedisManager {
    type Connection = RespConnection;
    type Error = StoreError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let mut conn = RespConnection::connect(
            &self.redis.addr,
            self.redis.connect_timeout(),
            self.redis.io_timeout(),
        )
        .await?;

        if !self.redis.password.is_empty() {
            let reply = if self.redis.username.is_empty() {
                conn.call(&[b"AUTH", self.redis.password.as_bytes()]).await?
            } else {
                conn.call(&[
                    b"AUTH",
                    self.redis.username.as_bytes(),
                    self.redis.password.as_bytes(),
                ])
                .await?
            };
            expect_ok(reply)?;
        }

        if self.redis.db != 0 {
            let db = self.redis.db.to_string();
            expect_ok(conn.call(&[b"SELECT", db.as_bytes()]).await?)?;
        }

        Ok(conn)
    }

    async fn check(&self, mut conn: Self::Connection) -> Result<Self::Connection, Self::Error> {
        match conn.call(&[b"PING"]).await? {
            Reply::Simple(s) if s == "PONG" => Ok(conn),
            other => Err(unexpected(other)),
        }
    }

    fn validate(&self, conn: &mut Self::Connection) -> bool {
        !conn.is_broken()
    }
}

/// Directory stored in Redis; entries expire `ttl` after their last write.
pub struct RedisStore {
    pool: Pool<RedisManager>,
    key_prefix: String,
    ttl: Duration,
}

impl RedisStore {
    pub fn new(redis: &RedisConfig, ttl: Duration) -> Self {
        let pool = Pool::builder()
            .max_open(redis.pool_size.max(1))
            .get_timeout(Some(redis.connect_timeout() + redis.io_timeout()))
            .build(RedisManager::new(redis.clone()));

        tracing::debug!(
            addr = %redis.addr,
            db = redis.db,
            ttl_secs = ttl.as_secs(),
            "redis directory store configured"
        );

        Self {
            pool,
            key_prefix: redis.key_prefix.clone(),
            ttl,
        }
    }

    /// Round-trip a `PING` through the pool.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        match conn.call(&[b"PING"]).await? {
            Reply::Simple(s) if s == "PONG" => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix, name)
    }

    /// `PX` argument; Redis rejects a zero expiry.
    fn ttl_millis(&self) -> String {
        self.ttl.as_millis().max(1).to_string()
    }
}

#[async_trait]
impl DirectoryStore for RedisStore {
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        let key = self.key(name);
        let mut conn = self.pool.get().await?;
        match conn.call(&[b"GET", key.as_bytes()]).await? {
            Reply::Bulk(None) => Ok(None),
            Reply::Bulk(Some(value)) => String::from_utf8(value.to_vec())
                .map(Some)
                .map_err(|_| StoreError::UnexpectedReply(format!("non-UTF-8 value at {}", key))),
            Reply::Error(e) => Err(StoreError::Server(e)),
            other => Err(unexpected(other)),
        }
    }

    async fn set(&self, name: &str, address: &str) -> Result<(), StoreError> {
        let key = self.key(name);
        let ttl = self.ttl_millis();
        let mut conn = self.pool.get().await?;
        let reply = conn
            .call(&[
                b"SET",
                key.as_bytes(),
                address.as_bytes(),
                b"PX",
                ttl.as_bytes(),
            ])
            .await?;
        expect_ok(reply)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

fn expect_ok(reply: Reply) -> Result<(), StoreError> {
    match reply {
        r if r.is_ok() => Ok(()),
        Reply::Error(e) => Err(StoreError::Server(e)),
        other => Err(unexpected(other)),
    }
}

fn unexpected(reply: Reply) -> StoreError {
    match reply {
        Reply::Error(e) => StoreError::Server(e),
        other => StoreError::UnexpectedReply(format!("{:?}", other)),
    }
}
