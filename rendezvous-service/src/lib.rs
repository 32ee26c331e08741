// ============================================================================
// Rendezvous Service Library
// ============================================================================
//
// A rendezvous relay: peers that cannot address each other exchange
// signaling envelopes by depositing and retrieving them under a shared key.
// Entries live in an external ephemeral store and expire two minutes after
// the last write.
//
// ============================================================================

pub mod core;
pub mod handlers;
pub mod routes;
pub mod store;

use std::sync::Arc;

use beacon_config::Config;

use crate::core::RelayEngine;

/// Shared service context
pub struct RelayContext {
    pub engine: Arc<RelayEngine>,
    pub config: Arc<Config>,
}
