//! Application state for the HTTP server.

use std::sync::Arc;

use crate::services::TripQueries;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TripQueries>,
}

impl AppState {
    pub fn new(store: Arc<dyn TripQueries>) -> Self {
        Self { store }
    }
}
