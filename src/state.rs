//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::{config::AccountDefaults, registry::Registry};

#[derive(Clone)]
pub struct AppState {
    /// Storage backend chosen at startup
    pub registry: Arc<dyn Registry>,

    /// Policy parameters for accounts opened without explicit ones
    pub account_defaults: AccountDefaults,
}

impl AppState {
    pub fn new(registry: Arc<dyn Registry>, account_defaults: AccountDefaults) -> Self {
        Self {
            registry,
            account_defaults,
        }
    }
}
