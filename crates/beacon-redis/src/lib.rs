//! # Beacon Redis
//!
//! Low-level Redis client for the beacon rendezvous relay.
//!
//! ## Design Principles
//!
//! - **No business logic** - Pure infrastructure layer
//! - **No dependencies** on other beacon-* crates
//! - **Generic operations** - Can be used by any service
//!
//! ## Features
//!
//! - Connection management with automatic reconnection
//! - Key-value operations with expiry
//!
//! ## Example
//!
//! ```rust,no_run
//! use beacon_redis::RedisClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = RedisClient::connect("redis://localhost:6379").await?;
//!
//!     // Set with expiry
//!     client.set_ex("key", "value", 120).await?;
//!
//!     // Get
//!     let value: Option<String> = client.get("key").await?;
//!
//!     Ok(())
//! }
//! ```

mod client;

pub use client::RedisClient;

// Re-export commonly used types
pub use redis::RedisError;

/// Result type for Redis operations
pub type Result<T> = std::result::Result<T, RedisError>;
