pub mod error;
pub mod fingerprint;
pub mod fs;
pub mod models;
pub mod settings;
pub mod similarity;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use fingerprint::{content_fingerprint, fingerprint};
pub use fs::write_atomic;
pub use models::{Embedder, ScriptWriter, SpeechSynthesizer};
pub use settings::Settings;
pub use similarity::{cosine_distance, cosine_similarity};
pub use storage::DocumentStore;
pub use types::{Article, ArticleStatus, Cluster, Document, DocumentMetadata, QueryHit, SeenRecord};
