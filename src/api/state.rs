use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use crate::config::Config;
use crate::registry::{EventRegistry, SessionStore};
use crate::time::SharedClock;

/// Shared handler state. Every registry mutation holds the write lock for
/// its whole check-then-mutate sequence.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<EventRegistry>>,
    pub sessions: Arc<Mutex<SessionStore>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Arc<Config>, clock: SharedClock) -> Self {
        Self {
            registry: Arc::new(RwLock::new(EventRegistry::new(clock.clone()))),
            sessions: Arc::new(Mutex::new(SessionStore::new(clock))),
            config,
        }
    }
}
