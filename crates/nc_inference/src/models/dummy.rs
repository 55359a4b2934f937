use async_trait::async_trait;
use nc_core::{Embedder, Result, ScriptWriter, SpeechSynthesizer};
use std::fmt;

pub const DUMMY_DIMENSIONS: usize = 768;

/// Offline model: deterministic character-frequency embeddings and a script
/// that simply reads out the headlines found in the prompt.
#[derive(Default)]
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Embedder for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; DUMMY_DIMENSIONS];
        let text = text.to_lowercase();
        let total = text.chars().filter(|c| !c.is_whitespace()).count();
        if total == 0 {
            return Ok(embedding);
        }

        // Text length as a feature
        embedding[0] = text.len() as f32 / 1000.0;

        // Character frequencies bucketed by code point
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            let slot = 1 + (c as usize) % (DUMMY_DIMENSIONS - 1);
            embedding[slot] += 1.0 / total as f32;
        }

        Ok(embedding)
    }
}

#[async_trait]
impl ScriptWriter for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn write_script(&self, _system: &str, prompt: &str) -> Result<String> {
        let headlines: Vec<&str> = prompt
            .lines()
            .filter_map(|line| line.strip_prefix("Title: "))
            .collect();
        if headlines.is_empty() {
            return Ok("There is nothing new to report today.".to_string());
        }
        let mut script = String::from("Here are today's stories.\n");
        for headline in headlines {
            script.push_str(headline);
            script.push('\n');
        }
        script.push_str("That's all for now.");
        Ok(script)
    }
}

/// Not audio: the script's UTF-8 bytes, for exercising the output path offline.
#[async_trait]
impl SpeechSynthesizer for DummyModel {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}
