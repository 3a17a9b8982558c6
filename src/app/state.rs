//! Application state shared across connections

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::game::Lobby;

/// Shared application state
///
/// The lobby sits behind a single process-wide mutex: every dispatched
/// message mutates state and broadcasts the result while holding it, so
/// game-state transitions are globally serialized.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lobby: Arc<Mutex<Lobby>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            lobby: Arc::new(Mutex::new(Lobby::new())),
        }
    }
}
