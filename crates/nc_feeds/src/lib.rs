pub mod cli;
pub mod filters;
pub mod ingest_log;
pub mod logging;
pub mod manager;
pub mod resolver;
pub mod seen;
pub mod source;

pub use cli::{handle_command, FeedArgs, FeedCommands};
pub use filters::{FreshnessFilter, KeywordFilter};
pub use logging::{init_logging, Logger};
pub use manager::{FeedSummary, IngestManager, IngestOptions, IngestOutcome, IngestReport};
pub use resolver::FeedConfig;
pub use seen::SeenStore;
pub use source::{FeedSource, HttpFeedSource, RawEntry};

pub mod prelude {
    pub use super::manager::{IngestManager, IngestOutcome};
    pub use super::source::FeedSource;
    pub use nc_core::{Article, Error, Result};
}
