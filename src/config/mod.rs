use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::ProviderKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub root: String,
    pub provider: ProviderKind,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub gemini_api_base: String,
    pub ollama_url: String,
    pub transcript_dir: String,
    pub save_transcripts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: ".".into(),
            provider: ProviderKind::Gemini,
            model: "gemini-2.5-flash".into(),
            timeout_secs: 300,
            temperature: 0.7,
            max_output_tokens: 8000,
            gemini_api_base: "https://generativelanguage.googleapis.com".into(),
            ollama_url: "http://localhost:11434".into(),
            transcript_dir: ".scaffold/tx".into(),
            save_transcripts: false,
        }
    }
}

impl Config {
    /// Load from a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(Path::new(p)),
            None => Ok(Self::default()),
        }
    }
}
