//! Application State

use std::sync::Arc;

use polar_api::Session;

/// Shared application state
#[derive(Clone, Default)]
pub struct AppState {
    /// Current Polar connection, replaced on every successful connect
    pub session: Arc<Session>,
}
