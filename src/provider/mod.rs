use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::wire::ChatMessage;

pub mod gemini;
pub mod ollama;
pub mod openai;

/// One call to the model: an optional system instruction plus the ordered
/// chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Opaque text producer. Implementations return the model's raw text.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn send(&self, req: &ModelRequest, debug: bool) -> Result<String>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(kind: ProviderKind, cfg: &Config) -> Result<DynProvider> {
    match kind {
        ProviderKind::Gemini => Ok(Box::new(gemini::Gemini::from_env(cfg)?)),
        ProviderKind::OpenAI => Ok(Box::new(openai::OpenAIProvider::new(
            cfg.model.clone(),
            cfg.timeout_secs,
        ))),
        ProviderKind::Ollama => Ok(Box::new(ollama::Ollama::new(cfg))),
    }
}
