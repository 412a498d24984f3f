use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ModelRequest, Provider};
use crate::config::Config;
use crate::errors::ScaffoldError;
use crate::wire::Role;

pub struct Gemini {
    pub model: String,
    pub api_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    #[serde(default)]
    text: String,
}

impl Gemini {
    pub fn from_env(cfg: &Config) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY env var is not set"))?;
        Ok(Self {
            model: cfg.model.clone(),
            api_key,
            api_base: cfg.gemini_api_base.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

fn build_body(req: &ModelRequest) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: req
            .messages
            .iter()
            .map(|m| Content {
                role: Some(role_name(m.role)),
                parts: vec![Part { text: &m.content }],
            })
            .collect(),
        system_instruction: req
            .system
            .as_deref()
            .map(|s| Content { role: None, parts: vec![Part { text: s }] }),
        generation_config: GenerationConfig {
            max_output_tokens: req.max_output_tokens,
            temperature: req.temperature,
            top_p: 1.0,
            top_k: 1,
        },
    }
}

/// Text of the first candidate that has content, parts joined in order.
fn collect_text(parsed: GenerateResponse) -> String {
    parsed
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .next()
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default()
}

#[async_trait]
impl Provider for Gemini {
    async fn send(&self, req: &ModelRequest, debug: bool) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );
        let client = Client::builder().timeout(self.timeout).build()?;
        let body = build_body(req);

        if debug {
            eprintln!("debug[gemini]: POST {}", url);
        }

        let resp = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("gemini read body failed")?;
        if debug {
            eprintln!("debug[gemini]: raw status: {}", status);
            eprintln!("debug[gemini]: raw body:\n{}\n", text);
        }
        if !status.is_success() {
            return Err(ScaffoldError::Provider(format!("gemini API error ({status}): {text}")).into());
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("gemini response parse error: {}", e))?;

        Ok(collect_text(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ChatMessage;
    use serde_json::json;

    #[test]
    fn system_prompt_goes_to_system_instruction() {
        let req = ModelRequest {
            system: Some("be terse".into()),
            messages: vec![ChatMessage::user("hi"), ChatMessage::model("hello")],
            temperature: 0.5,
            max_output_tokens: 64,
        };
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(body["systemInstruction"], json!({ "parts": [{ "text": "be terse" }] }));
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 64);
    }

    #[test]
    fn no_system_instruction_when_absent() {
        let req = ModelRequest {
            system: None,
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.0,
            max_output_tokens: 16,
        };
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert!(body.get("systemInstruction").is_none());
        assert_eq!(role_name(Role::Model), "model");
    }

    #[test]
    fn first_candidate_with_content_is_joined() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                { "finishReason": "SAFETY" },
                { "content": { "parts": [{ "text": "<boltArtifact" }, { "text": ">" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(collect_text(parsed), "<boltArtifact>");

        let empty: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(collect_text(empty), "");
    }
}
