use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::ModelRequest;
use crate::errors::ScaffoldError;
use crate::wire::Role;

/// OpenAI chat completions provider.
pub struct OpenAIProvider {
    model: String,
    client: Client,
    timeout_secs: u64,
}

impl OpenAIProvider {
    pub fn new(model: String, timeout_secs: u64) -> Self {
        Self {
            model,
            client: Client::new(),
            timeout_secs,
        }
    }
}

fn messages(req: &ModelRequest) -> Vec<Value> {
    let mut out = Vec::new();
    if let Some(sys) = &req.system {
        out.push(json!({ "role": "system", "content": sys }));
    }
    for m in &req.messages {
        let role = match m.role {
            Role::User => "user",
            Role::Model => "assistant",
        };
        out.push(json!({ "role": role, "content": m.content }));
    }
    out
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    async fn send(&self, req: &ModelRequest, debug: bool) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY env var is not set"))?;

        let body = json!({
            "model": self.model,
            "messages": messages(req),
            "temperature": req.temperature,
            "top_p": 1.0,
            "max_tokens": req.max_output_tokens,
        });

        if debug {
            eprintln!(
                "debug[openai]: HTTP POST /v1/chat/completions body:\n{}",
                serde_json::to_string_pretty(&body)?
            );
        }

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if debug {
            eprintln!("debug[openai]: raw status: {}", status);
            eprintln!("debug[openai]: raw response:\n{}", &text);
        }

        if !status.is_success() {
            return Err(ScaffoldError::Provider(format!("OpenAI API error ({status}): {text}")).into());
        }

        #[derive(Deserialize)]
        struct ChatMessage {
            #[serde(default)]
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessage,
        }
        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse OpenAI response: {e}\nRaw: {text}"))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ChatMessage;

    #[test]
    fn model_role_becomes_assistant() {
        let req = ModelRequest {
            system: None,
            messages: vec![ChatMessage::user("a"), ChatMessage::model("b")],
            temperature: 0.0,
            max_output_tokens: 1,
        };
        let msgs = messages(&req);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1]["role"], "assistant");
        assert_eq!(msgs[1]["content"], "b");
    }
}
