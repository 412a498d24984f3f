use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(ValueEnum, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "scaffold", version, about = "Generate a website scaffold from a prompt")]
pub struct Args {
    /// What to build, in plain words
    #[arg(long, short)]
    pub prompt: Option<String>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long)]
    pub root: Option<String>,

    /// TOML config file
    #[arg(long)]
    pub config: Option<String>,

    /// Feed saved model responses as batches instead of calling a provider
    #[arg(long)]
    pub replay: Vec<String>,

    /// Print the project tree as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Print the tree in the browser sandbox mount format
    #[arg(long, default_value_t = false)]
    pub mount: bool,

    /// Print one file after the build
    #[arg(long)]
    pub show: Option<String>,

    #[arg(long, default_value_t = false)]
    pub save_transcripts: bool,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl Args {
    /// Flags win over the config file.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(p) = self.provider {
            cfg.provider = p;
        }
        if let Some(m) = &self.model {
            cfg.model = m.clone();
        }
        if let Some(t) = self.timeout_secs {
            cfg.timeout_secs = t;
        }
        if let Some(r) = &self.root {
            cfg.root = r.clone();
        }
        if self.save_transcripts {
            cfg.save_transcripts = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "scaffold", "--prompt", "todo app", "--provider", "openai", "--model", "gpt-4o",
            "--replay", "a.txt", "--replay", "b.txt",
        ]);
        let mut cfg = Config::default();
        args.apply(&mut cfg);
        assert!(matches!(cfg.provider, ProviderKind::OpenAI));
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(args.replay, vec!["a.txt", "b.txt"]);
        assert_eq!(cfg.timeout_secs, Config::default().timeout_secs);
    }
}
