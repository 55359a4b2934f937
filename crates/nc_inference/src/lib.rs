pub mod briefing;
pub mod cache;
pub mod clustering;
pub mod models;
pub mod prompt;
pub mod ranking;
pub mod speech;

pub use briefing::{Briefer, Briefing, BriefingConfig, StoryArticle};
pub use cache::{CachedEmbedder, EmbeddingCache};
pub use clustering::{cluster, cluster_labels, DEFAULT_SIMILARITY_THRESHOLD};
pub use models::{create_model, ModelKind, Models};
pub use prompt::BriefingMode;
pub use ranking::{rank, Ranked, DEFAULT_TOP_K};
pub use speech::{split_for_speech, write_audio};

pub mod prelude {
    pub use super::{Briefer, BriefingMode, CachedEmbedder, EmbeddingCache, ModelKind};
    pub use nc_core::{Article, Error, Result};
}
