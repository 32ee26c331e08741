// ============================================================================
// Redis Configuration
// ============================================================================

/// Redis key prefixes configuration
#[derive(Clone, Debug)]
pub struct RedisKeyPrefixes {
    /// Prefix for rendezvous entries: "rendezvous:{key}"
    pub rendezvous: String,
}

impl RedisKeyPrefixes {
    pub(crate) fn from_env() -> Self {
        Self {
            rendezvous: std::env::var("REDIS_KEY_PREFIX_RENDEZVOUS")
                .unwrap_or_else(|_| "rendezvous:".to_string()),
        }
    }
}
