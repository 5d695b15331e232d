// Application state module
// Holds what every connection task needs to serve a request

use std::sync::atomic::{AtomicU64, Ordering};

use super::types::Config;
use crate::routing::Router;

/// Application state shared by the accept loop and connection tasks
pub struct AppState {
    pub config: Config,
    pub router: Router,
    active_connections: AtomicU64,
}

impl AppState {
    pub fn new(config: Config, router: Router) -> Self {
        Self {
            config,
            router,
            active_connections: AtomicU64::new(0),
        }
    }

    /// Reserve a connection slot, honoring `performance.max_connections`
    ///
    /// Returns `false` when the limit is reached; a successful call must be paired
    /// with [`AppState::release_connection`].
    pub fn try_acquire_connection(&self) -> bool {
        let limit = self.config.performance.max_connections.unwrap_or(u64::MAX);
        self.active_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < limit).then_some(current + 1)
            })
            .is_ok()
    }

    pub fn release_connection(&self) {
        self.active_connections.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_limit() {
        let mut config = Config::load_from("does-not-exist").unwrap();
        config.performance.max_connections = Some(2);
        let state = AppState::new(config, Router::builder().build().unwrap());

        assert!(state.try_acquire_connection());
        assert!(state.try_acquire_connection());
        assert!(!state.try_acquire_connection());
        assert_eq!(state.active_connections(), 2);

        state.release_connection();
        assert!(state.try_acquire_connection());
    }
}
