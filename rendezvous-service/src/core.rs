// ============================================================================
// Relay Engine - Core Business Logic
// ============================================================================
//
// The write policy, consistency control and degrade-gracefully rules for the
// rendezvous store, independent of the HTTP layer.
//
// Append mode is a read-modify-write against a backend with no transactional
// primitive, so all writes for a key go through a per-key critical section.
// Writes to different keys never block each other; reads never take locks.
//
// ============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use beacon_metrics::{DECODE_ANOMALIES_TOTAL, FETCHES_TOTAL, STORE_FAILURES_TOTAL, SUBMITS_TOTAL};
use beacon_types::{Envelope, StoredValue, WriteMode};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;

use crate::store::{EnvelopeStore, StoreError};

/// Reserved key answered with a fixed liveness marker, never stored under.
pub const DIAGNOSTIC_KEY: &str = "test";

/// Tunables the engine is constructed with.
#[derive(Clone, Debug)]
pub struct RelayPolicy {
    /// TTL applied on every write; no sliding renewal on read.
    pub entry_ttl: Duration,
    /// Upper bound on any single store call.
    pub store_timeout: Duration,
}

/// What a submission did. Feeds logs and tests; never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Replace-mode write landed.
    Replaced,
    /// Append-mode write landed; the stored sequence now has this length.
    Appended { sequence_len: usize },
    /// Envelope had no key; nothing was stored.
    Ignored,
    /// The store rejected or timed out the write; the envelope was dropped.
    Dropped,
}

/// What a fetch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Reserved diagnostic key; the caller gets a fixed liveness marker.
    Liveness,
    /// The raw stored bytes, exactly as written.
    Found(Vec<u8>),
    /// Absent, expired, or unreadable.
    Empty,
}

/// The relay engine: decides replace vs. append, serializes writers per key,
/// and degrades to empty state on any store trouble.
pub struct RelayEngine {
    store: Arc<dyn EnvelopeStore>,
    locks: KeyLocks,
    policy: RelayPolicy,
}

impl RelayEngine {
    pub fn new(store: Arc<dyn EnvelopeStore>, policy: RelayPolicy) -> Self {
        Self {
            store,
            locks: KeyLocks::new(),
            policy,
        }
    }

    /// Deposit an envelope. Best-effort: every path acknowledges, failures
    /// are only visible to operators.
    pub async fn submit(&self, envelope: Envelope) -> SubmitOutcome {
        if envelope.key.is_empty() {
            tracing::debug!("Dropping envelope without a key");
            SUBMITS_TOTAL.with_label_values(&["ignored"]).inc();
            return SubmitOutcome::Ignored;
        }

        let mode = envelope.mode();
        SUBMITS_TOTAL.with_label_values(&[mode.as_str()]).inc();
        match mode {
            WriteMode::Replace => self.replace(envelope).await,
            WriteMode::Append => self.append(envelope).await,
        }
    }

    /// Retrieve whatever is currently stored under `key`, raw.
    pub async fn fetch(&self, key: &str) -> FetchResult {
        if key.is_empty() {
            FETCHES_TOTAL.with_label_values(&["miss"]).inc();
            return FetchResult::Empty;
        }
        if key == DIAGNOSTIC_KEY {
            FETCHES_TOTAL.with_label_values(&["liveness"]).inc();
            return FetchResult::Liveness;
        }

        match self.read(key).await {
            Ok(Some(raw)) => {
                FETCHES_TOTAL.with_label_values(&["hit"]).inc();
                FetchResult::Found(raw)
            }
            Ok(None) => {
                FETCHES_TOTAL.with_label_values(&["miss"]).inc();
                FetchResult::Empty
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Store read failed, returning empty");
                FETCHES_TOTAL.with_label_values(&["miss"]).inc();
                FetchResult::Empty
            }
        }
    }

    /// Reachability check for the readiness probe.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match timeout(self.policy.store_timeout, self.store.ping()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.policy.store_timeout)),
        }
    }

    async fn replace(&self, envelope: Envelope) -> SubmitOutcome {
        let key = envelope.key.clone();
        // Hold the key lock so a replace cannot interleave with an in-flight
        // append's read-modify-write.
        let _guard = self.locks.acquire(&key).await;

        match self.write(&key, &StoredValue::Single(envelope)).await {
            Ok(()) => {
                tracing::debug!(key = %key, "Replaced entry");
                SubmitOutcome::Replaced
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Replace write failed, envelope dropped");
                SubmitOutcome::Dropped
            }
        }
    }

    async fn append(&self, envelope: Envelope) -> SubmitOutcome {
        let key = envelope.key.clone();
        let _guard = self.locks.acquire(&key).await;

        let current = match self.read(&key).await {
            Ok(Some(raw)) => match StoredValue::from_bytes(&raw) {
                Ok(value) => value,
                Err(e) => {
                    DECODE_ANOMALIES_TOTAL.inc();
                    tracing::warn!(key = %key, error = %e, "Undecodable stored value, treating as absent");
                    StoredValue::Empty
                }
            },
            Ok(None) => StoredValue::Empty,
            Err(e) => {
                // A failed read must not abort the write
                tracing::warn!(key = %key, error = %e, "Store read failed during append, treating as absent");
                StoredValue::Empty
            }
        };

        if matches!(current, StoredValue::Single(_)) {
            tracing::warn!(key = %key, "Append found a single-value entry; starting a fresh sequence");
        }

        let next = current.append(envelope);
        let sequence_len = next.len();
        match self.write(&key, &next).await {
            Ok(()) => {
                tracing::debug!(key = %key, sequence_len, "Appended envelope");
                SubmitOutcome::Appended { sequence_len }
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Append write failed, envelope dropped");
                SubmitOutcome::Dropped
            }
        }
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let result = match timeout(self.policy.store_timeout, self.store.get(key)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.policy.store_timeout)),
        };
        if result.is_err() {
            STORE_FAILURES_TOTAL.with_label_values(&["get"]).inc();
        }
        result
    }

    async fn write(&self, key: &str, value: &StoredValue) -> Result<(), StoreError> {
        let raw = value.to_bytes()?;
        let result = match timeout(
            self.policy.store_timeout,
            self.store.put(key, raw, self.policy.entry_ttl),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.policy.store_timeout)),
        };
        if result.is_err() {
            STORE_FAILURES_TOTAL.with_label_values(&["put"]).inc();
        }
        result
    }
}

// ============================================================================
// Per-key lock registry
// ============================================================================

/// One async mutex per active key. Entries are removed when the last holder
/// releases, so the registry does not grow with key cardinality.
struct KeyLocks {
    entries: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    fn new() -> Self {
        Self {
            entries: StdMutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, key: &str) -> KeyGuard<'_> {
        let lock = {
            let mut entries = self.entries.lock().expect("key lock registry poisoned");
            entries.entry(key.to_string()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        KeyGuard {
            registry: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }
}

struct KeyGuard<'a> {
    registry: &'a KeyLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Release the key lock before inspecting the registry, so the only
        // remaining strong references belong to the map and to waiters.
        self.guard.take();
        if let Ok(mut entries) = self.registry.entries.lock() {
            if let Some(lock) = entries.get(&self.key) {
                if Arc::strong_count(lock) == 1 {
                    entries.remove(&self.key);
                }
            }
        }
    }
}
