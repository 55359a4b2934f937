use nc_feeds::IngestManager;
use nc_inference::Briefer;
use std::sync::Arc;

/// Shared by every request: one ingest manager (runs are serialized inside
/// it) and one briefer.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<IngestManager>,
    pub briefer: Arc<Briefer>,
}

impl AppState {
    pub fn new(manager: Arc<IngestManager>, briefer: Arc<Briefer>) -> Self {
        Self { manager, briefer }
    }
}
