//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::config::Settings;
use crate::pipeline::GovernanceClient;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Bound governance client (cheap to clone, holds the store handle)
    pub client: GovernanceClient,

    /// Settings the server was started with; request defaults come from here
    pub settings: Settings,
}

impl AppState {
    pub fn new(client: GovernanceClient, settings: Settings) -> Self {
        Self { client, settings }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
