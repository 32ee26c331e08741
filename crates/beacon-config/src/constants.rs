// ============================================================================
// Configuration Constants
// ============================================================================

// Default port values
pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const DEFAULT_HEALTH_PORT: u16 = 8081;

// Default bind address
pub(crate) const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

// Default TTL for a rendezvous entry (in seconds).
// Peers poll within seconds of depositing; two minutes is enough for a full
// signaling exchange and keeps abandoned keys from lingering.
pub(crate) const DEFAULT_ENTRY_TTL_SECS: u64 = 120;

// Upper bound on any single store call (in milliseconds). A call that runs
// past this is treated as a store failure, never as a hang.
pub(crate) const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

// Envelope size limit (in bytes).
// Signaling envelopes are small (SDP offers/answers, ICE candidates); anything
// larger indicates a misbehaving client.
pub const MAX_ENVELOPE_SIZE: usize = 64 * 1024; // 64 KB
