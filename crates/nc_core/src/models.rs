use async_trait::async_trait;
use crate::Result;

/// Turns text into an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Text generation service that writes the spoken script.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    fn name(&self) -> &str;

    /// Generate a completion for `prompt` under the given system instructions.
    async fn write_script(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Speech service that reads the finished script aloud.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Encoded audio (MP3) for `text`.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
