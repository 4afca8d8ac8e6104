use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use kiln_core::api::AppContext;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub session_id: String,
    pub ctx: AppContext,
    pub stats: Arc<RwLock<ServerStats>>,
}

impl AppState {
    pub fn new(session_id: String, ctx: AppContext) -> Self {
        Self {
            session_id,
            ctx,
            stats: Arc::new(RwLock::new(ServerStats::new())),
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .increment_request(endpoint);
    }

    pub fn record_error(&self) {
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .increment_error();
    }
}

#[derive(Debug)]
pub struct ServerStats {
    pub started_at: Instant,
    pub requests_total: u64,
    pub errors_total: u64,
    pub requests_by_endpoint: BTreeMap<String, u64>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests_total: 0,
            errors_total: 0,
            requests_by_endpoint: BTreeMap::new(),
        }
    }

    pub fn increment_request(&mut self, endpoint: &str) {
        self.requests_total += 1;
        *self
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors_total += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
