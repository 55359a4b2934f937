use async_trait::async_trait;
use nc_core::{Embedder, Error, Result, ScriptWriter, Settings, SpeechSynthesizer};

use crate::speech::split_for_speech;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for OpenAI-compatible `/embeddings`, `/chat/completions` and
/// `/audio/speech` endpoints.
pub struct OpenAiModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    embedding_model: String,
    chat_model: String,
    speech_model: String,
    speech_voice: String,
}

impl OpenAiModel {
    pub const TEMPERATURE: f32 = 0.3;
    /// Longest input `/audio/speech` accepts in one request.
    pub const SPEECH_INPUT_LIMIT: usize = 4096;
    const SPEECH_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(settings: &Settings) -> Result<Self> {
        let api_key = settings
            .openai_api_key
            .clone()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            embedding_model: settings.embedding_model.clone(),
            chat_model: settings.chat_model.clone(),
            speech_model: settings.speech_model.clone(),
            speech_voice: settings.speech_voice.clone(),
        })
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("speech_model", &self.speech_model)
            .field("speech_voice", &self.speech_voice)
            .finish()
    }
}

#[async_trait]
impl Embedder for OpenAiModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            input: text,
            model: &self.embedding_model,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Inference("embedding response contained no data".to_string()))
    }
}

#[async_trait]
impl ScriptWriter for OpenAiModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn write_script(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: Self::TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::Inference("completion response contained no message".to_string()))
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiModel {
    /// Long scripts are sent in several requests and the MP3 streams
    /// concatenated in order.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let mut audio = Vec::new();
        for chunk in split_for_speech(text, Self::SPEECH_INPUT_LIMIT) {
            let request = SpeechRequest {
                model: &self.speech_model,
                voice: &self.speech_voice,
                input: &chunk,
                response_format: "mp3",
            };
            let bytes = self
                .client
                .post(format!("{}/audio/speech", self.base_url))
                .bearer_auth(&self.api_key)
                .timeout(Self::SPEECH_TIMEOUT)
                .json(&request)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;
            audio.extend_from_slice(&bytes);
        }
        if audio.is_empty() {
            return Err(Error::Inference("speech response contained no audio".to_string()));
        }
        Ok(audio)
    }
}
