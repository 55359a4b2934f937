use std::collections::VecDeque;
use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Thin wrapper over `tracing` that prepends a stack of prefixes
/// (e.g. the feed being processed) to every message.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: VecDeque<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            prefixes: VecDeque::new(),
        }
    }

    pub fn with_new_prefixes(mut self, prefix: String) -> Self {
        self.prefixes.clear();
        self.prefixes.push_back(prefix);
        self
    }

    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.prefixes.push_back(prefix);
        self
    }

    fn format(&self, message: &str) -> String {
        let prefix = self.prefixes.iter().map(|p| format!("{} ", p)).collect::<String>();
        format!("{}{}", prefix, message)
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}", self.format(message));
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}", self.format(message));
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}", self.format(message));
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}", self.format(message));
    }
}

/// Install the global fmt subscriber once; later calls are no-ops.
pub fn init_logging() -> Logger {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_max_level(Level::INFO)
                .init();
        });
    }
    Logger::new()
}
