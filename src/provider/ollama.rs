use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ModelRequest, Provider};
use crate::config::Config;
use crate::errors::ScaffoldError;
use crate::wire::Role;

pub struct Ollama {
    pub model: String,
    pub url: String,
    pub timeout: Duration,
}

impl Ollama {
    pub fn new(cfg: &Config) -> Self {
        Self {
            model: cfg.model.clone(),
            url: cfg.ollama_url.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

fn to_messages(req: &ModelRequest) -> Vec<Msg<'_>> {
    let mut out = Vec::with_capacity(req.messages.len() + 1);
    if let Some(sys) = &req.system {
        out.push(Msg { role: "system", content: sys });
    }
    out.extend(req.messages.iter().map(|m| Msg {
        role: match m.role {
            Role::User => "user",
            Role::Model => "assistant",
        },
        content: &m.content,
    }));
    out
}

#[async_trait]
impl Provider for Ollama {
    async fn send(&self, req: &ModelRequest, debug: bool) -> Result<String> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let client = Client::builder().timeout(self.timeout).build()?;
        let body = ChatRequest {
            model: &self.model,
            messages: to_messages(req),
            stream: false,
            options: OllamaOptions {
                temperature: req.temperature,
                num_predict: req.max_output_tokens,
            },
        };

        if debug {
            eprintln!("debug[ollama]: POST {}", url);
        }

        let resp = client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("ollama request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("ollama read body failed")?;

        if debug {
            eprintln!("debug[ollama]: raw body:\n{}\n", text);
        }
        if !status.is_success() {
            return Err(ScaffoldError::Provider(format!("ollama error ({status}): {text}")).into());
        }

        // Fall back to the raw body when it is not a chat envelope.
        let content = match serde_json::from_str::<ChatResponse>(&text) {
            Ok(c) => c.message.content,
            Err(_) => text,
        };
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ChatMessage;

    #[test]
    fn system_goes_first_and_roles_map() {
        let req = ModelRequest {
            system: Some("sys".into()),
            messages: vec![ChatMessage::user("hi"), ChatMessage::model("yo")],
            temperature: 0.7,
            max_output_tokens: 10,
        };
        let roles: Vec<&str> = to_messages(&req).iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
    }
}
