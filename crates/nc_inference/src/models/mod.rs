use nc_core::{Embedder, Error, Result, ScriptWriter, Settings, SpeechSynthesizer};
use std::str::FromStr;
use std::sync::Arc;

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAiModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    OpenAi,
    Dummy,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "dummy" => Ok(Self::Dummy),
            other => Err(Error::Config(format!(
                "unknown model: {} (available: openai, dummy)",
                other
            ))),
        }
    }
}

/// The capabilities a model provides to the pipeline. `speech` is unset when
/// speech is disabled or the model has no voice.
#[derive(Clone)]
pub struct Models {
    pub embedder: Arc<dyn Embedder>,
    pub writer: Arc<dyn ScriptWriter>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

pub fn create_model(kind: ModelKind, settings: &Settings) -> Result<Models> {
    match kind {
        ModelKind::OpenAi => {
            let model = Arc::new(OpenAiModel::new(settings)?);
            let speech: Option<Arc<dyn SpeechSynthesizer>> = if settings.speech_enabled {
                Some(model.clone())
            } else {
                None
            };
            Ok(Models {
                embedder: model.clone(),
                writer: model,
                speech,
            })
        }
        ModelKind::Dummy => {
            let model = Arc::new(DummyModel::new());
            Ok(Models {
                embedder: model.clone(),
                writer: model,
                speech: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("OpenAI".parse::<ModelKind>().unwrap(), ModelKind::OpenAi);
        assert_eq!("dummy".parse::<ModelKind>().unwrap(), ModelKind::Dummy);
        assert!("deepseek".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_create_dummy_model() {
        let models = create_model(ModelKind::Dummy, &Settings::default()).unwrap();
        assert_eq!(models.embedder.name(), "dummy");
        assert_eq!(models.writer.name(), "dummy");
        assert!(models.speech.is_none());
    }

    #[test]
    fn test_openai_speech_follows_settings() {
        let mut settings = Settings::default();
        settings.openai_api_key = Some("sk-test".to_string());
        assert!(create_model(ModelKind::OpenAi, &settings).unwrap().speech.is_some());

        settings.speech_enabled = false;
        assert!(create_model(ModelKind::OpenAi, &settings).unwrap().speech.is_none());
    }
}
