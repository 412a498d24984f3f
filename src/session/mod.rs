//! Two-phase build: classify the prompt into a template, fold the template's
//! starter artifact, then ask the model for code and fold its answer.
//!
//! Calls are strictly sequential. A failed stage stops the session but keeps
//! whatever was already folded.

use anyhow::Result;
use indicatif::ProgressBar;
use log::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::ScaffoldError;
use crate::parse;
use crate::prompt;
use crate::provider::{ModelRequest, Provider};
use crate::stepper::{Advance, ProjectState};
use crate::transcript;
use crate::wire::{ChatMessage, Template};

pub struct Session<'a> {
    provider: &'a dyn Provider,
    cfg: &'a Config,
    tx: Uuid,
    debug: bool,
    progress: ProgressBar,
    pub template: Option<Template>,
    pub history: Vec<ChatMessage>,
    pub state: ProjectState,
}

impl<'a> Session<'a> {
    pub fn new(provider: &'a dyn Provider, cfg: &'a Config, debug: bool) -> Self {
        Self {
            provider,
            cfg,
            tx: Uuid::new_v4(),
            debug,
            progress: ProgressBar::hidden(),
            template: None,
            history: Vec::new(),
            state: ProjectState::new(),
        }
    }

    /// Report each completed step on `bar`.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    pub fn transaction(&self) -> Uuid {
        self.tx
    }

    /// Full build for `prompt`.
    pub async fn run(&mut self, prompt: &str) -> Result<()> {
        let template = self.classify(prompt).await?;
        self.template = Some(template);
        info!("template: {template}");

        let prompts = prompt::template_prompts(template);
        for ui in &prompts.ui_prompts {
            self.apply_batch("template", ui)?;
        }
        self.history = prompts.prompts.into_iter().map(ChatMessage::user).collect();

        self.chat(prompt).await?;
        Ok(())
    }

    pub async fn classify(&self, prompt: &str) -> Result<Template> {
        let req = ModelRequest {
            system: Some(prompt::classify_instruction().to_string()),
            messages: vec![ChatMessage::user(prompt)],
            temperature: 0.0,
            max_output_tokens: 16,
        };
        let answer = self.call("template", &req).await?;
        answer
            .parse::<Template>()
            .map_err(|_| ScaffoldError::Classification(answer.trim().to_string()).into())
    }

    /// Send `prompt` after the current history and fold the reply.
    pub async fn chat(&mut self, prompt: &str) -> Result<Advance> {
        self.history.push(ChatMessage::user(prompt));
        let req = ModelRequest {
            system: Some(prompt::system_prompt()),
            messages: self.history.clone(),
            temperature: self.cfg.temperature,
            max_output_tokens: self.cfg.max_output_tokens,
        };
        let text = self.call("chat", &req).await?;
        let adv = self.apply_batch("chat", &text)?;
        self.history.push(ChatMessage::model(text));
        Ok(adv)
    }

    /// Parse one model response and merge it. Responses that yield no actions
    /// (nothing at all, or only the artifact marker) are refused before they
    /// reach the state.
    pub fn apply_batch(&mut self, stage: &'static str, text: &str) -> Result<Advance> {
        if text.trim().is_empty() {
            return Err(ScaffoldError::EmptyResponse(stage).into());
        }
        let batch = parse::parse_from(text, self.state.next_id());
        if batch.iter().all(parse::is_artifact_marker) {
            return Err(ScaffoldError::EmptyResponse(stage).into());
        }
        debug!("{stage}: {} step(s)", batch.len());
        self.progress.inc_length(batch.len() as u64);
        let bar = self.progress.clone();
        let adv = self.state.merge_with(batch, |step| {
            bar.set_message(step.title.clone());
            bar.inc(1);
        });
        Ok(adv)
    }

    async fn call(&self, stage: &str, req: &ModelRequest) -> Result<String> {
        let text = self.provider.send(req, self.debug).await?;
        if self.cfg.save_transcripts {
            let p = transcript::save_stage(stage, req, &text, self.tx, self.cfg)?;
            debug!("{stage}: transcript saved at {}", p.display());
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    use crate::wire::{Role, StepStatus};

    /// Replays canned answers in order and records every request.
    struct Scripted {
        answers: Mutex<Vec<String>>,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl Scripted {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().rev().map(|s| s.to_string()).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        async fn send(&self, req: &ModelRequest, _debug: bool) -> Result<String> {
            self.seen.lock().unwrap().push(req.clone());
            self.answers
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }
    }

    const CHAT: &str = r#"Here it is.
<boltArtifact id="todo" title="Todo App">
<boltAction type="file" filePath="src/App.tsx">export default function App() { return <h1>Todos</h1>; }</boltAction>
<boltAction type="shell">npm run dev</boltAction>
</boltArtifact>"#;

    #[tokio::test]
    async fn full_build_folds_both_batches() {
        let provider = Scripted::new(&["react", CHAT]);
        let cfg = Config::default();
        let mut s = Session::new(&provider, &cfg, false);
        s.run("a todo app").await.unwrap();

        assert_eq!(s.template, Some(Template::React));
        assert_eq!(
            s.state.tree.content("src/App.tsx"),
            Some("export default function App() { return <h1>Todos</h1>; }")
        );
        assert!(s.state.tree.contains("index.html"));
        assert!(s.state.steps.iter().all(|st| st.status == StepStatus::Completed));

        // Ids run on across the two batches.
        let ids: Vec<u32> = s.state.steps.iter().map(|st| st.id).collect();
        assert_eq!(ids, (1..=ids.len() as u32).collect::<Vec<_>>());

        let seen = provider.seen.lock().unwrap();
        let chat = &seen[1];
        assert_eq!(chat.messages.len(), 3);
        assert_eq!(chat.messages[2], ChatMessage::user("a todo app"));
        assert_eq!(s.history.last().map(|m| m.role), Some(Role::Model));
    }

    #[tokio::test]
    async fn unknown_template_stops_before_folding() {
        let provider = Scripted::new(&["vue"]);
        let cfg = Config::default();
        let mut s = Session::new(&provider, &cfg, false);
        let err = s.run("a blog").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScaffoldError>(),
            Some(ScaffoldError::Classification(a)) if a == "vue"
        ));
        assert!(s.state.steps.is_empty());
    }

    #[tokio::test]
    async fn empty_chat_keeps_template_files() {
        let provider = Scripted::new(&["node", "   "]);
        let cfg = Config::default();
        let mut s = Session::new(&provider, &cfg, false);
        let err = s.run("an api").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScaffoldError>(),
            Some(ScaffoldError::EmptyResponse("chat"))
        ));
        assert!(s.state.tree.contains("index.js"));
        assert_eq!(s.state.tree.file_count(), 2);
    }

    #[tokio::test]
    async fn prose_only_chat_is_refused() {
        let provider = Scripted::new(&["node", "Sorry, I can't build that."]);
        let cfg = Config::default();
        let mut s = Session::new(&provider, &cfg, false);
        let template_steps = parse::parse(&prompt::base_artifact(Template::Node)).len();
        let err = s.run("an api").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScaffoldError>(),
            Some(ScaffoldError::EmptyResponse("chat"))
        ));
        assert_eq!(s.state.steps.len(), template_steps);
        assert_eq!(s.state.tree.file_count(), 2);
        // The refused reply never joins the history.
        assert_eq!(s.history.last().map(|m| m.role), Some(Role::User));
    }

    #[tokio::test]
    async fn transcripts_are_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Scripted::new(&["node", CHAT]);
        let cfg = Config {
            root: dir.path().display().to_string(),
            save_transcripts: true,
            ..Config::default()
        };
        let mut s = Session::new(&provider, &cfg, false);
        s.run("x").await.unwrap();
        let tx_dir = transcript::tx_dir(dir.path(), &cfg, s.transaction());
        assert!(tx_dir.join("template.json").exists());
        assert!(tx_dir.join("chat.json").exists());
    }
}
