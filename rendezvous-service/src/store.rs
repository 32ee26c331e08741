// ============================================================================
// Envelope Store - Backend abstraction for rendezvous entries
// ============================================================================
//
// The store is an injected dependency of the relay engine. The trait keeps
// the surface minimal (get / put-with-ttl / ping) so backends stay trivial:
// Redis in production, an in-memory map for tests.
//
// ============================================================================

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use beacon_config::RedisKeyPrefixes;
use beacon_redis::RedisClient;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] beacon_redis::RedisError),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Backend holding rendezvous entries with per-key expiry.
///
/// Implementations own expiry entirely: a `get` after the TTL window must
/// report absence. `put` always applies a fresh TTL, replacing whatever
/// remained of the previous one.
#[async_trait]
pub trait EnvelopeStore: Send + Sync {
    /// Read the raw stored value, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write the raw value under `key` with a fresh TTL.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

// ============================================================================
// Redis implementation
// ============================================================================

/// Production store over Redis (GET / SETEX).
///
/// Entries are namespaced with the configured prefix so the relay can share
/// a Redis with other tenants.
pub struct RedisStore {
    client: RedisClient,
    prefixes: RedisKeyPrefixes,
}

impl RedisStore {
    pub fn new(client: RedisClient, prefixes: RedisKeyPrefixes) -> Self {
        Self { client, prefixes }
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}{}", self.prefixes.rendezvous, key)
    }
}

#[async_trait]
impl EnvelopeStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut client = self.client.clone();
        Ok(client.get(&self.entry_key(key)).await?)
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        let mut client = self.client.clone();
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        client
            .set_ex(&self.entry_key(key), value.as_slice(), seconds)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut client = self.client.clone();
        client.ping().await?;
        Ok(())
    }
}

// ============================================================================
// In-memory implementation
// ============================================================================

struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process store with real expiry semantics, used by the test harness.
///
/// Deadlines are measured on the tokio clock, so tests can drive expiry with
/// a paused runtime instead of sleeping.
#[derive(Default)]
pub struct MemoryStore {
    entries: tokio::sync::Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnvelopeStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
