//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the hub handle (the only way to reach chat state) and the runtime
//! config that connection tasks need.

use crate::config::Config;
use crate::services::hub::HubHandle;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; `HubHandle` is a channel sender and `Config`
/// is plain data.
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub config: Config,
}

impl AppState {
    #[must_use]
    pub fn new(hub: HubHandle, config: Config) -> Self {
        Self { hub, config }
    }
}
