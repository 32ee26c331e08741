// ============================================================================
// Beacon Config - Centralized configuration management
// ============================================================================
//
// Configuration for the beacon rendezvous relay. Loads from environment
// variables with sensible defaults; only REDIS_URL has a default suited to
// local development rather than production.
//
// ============================================================================

mod constants;
mod redis;

pub use constants::MAX_ENVELOPE_SIZE;
pub use redis::RedisKeyPrefixes;

use anyhow::Result;
use constants::*;
use std::time::Duration;

/// Main configuration structure for the relay
#[derive(Clone, Debug)]
pub struct Config {
    pub redis_url: String,

    pub port: u16,
    pub bind_address: String,
    pub health_port: u16,

    /// TTL applied to every write (replace or append). There is no sliding
    /// renewal on read.
    pub entry_ttl_secs: u64,

    /// Upper bound on any single store call.
    pub store_timeout_ms: u64,

    pub rust_log: String,

    pub redis_key_prefixes: RedisKeyPrefixes,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let redis_key_prefixes = RedisKeyPrefixes::from_env();

        Ok(Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),

            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),

            health_port: std::env::var("HEALTH_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_HEALTH_PORT),

            entry_ttl_secs: std::env::var("ENTRY_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ENTRY_TTL_SECS),

            store_timeout_ms: std::env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_STORE_TIMEOUT_MS),

            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),

            redis_key_prefixes,
        })
    }

    pub fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.entry_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
