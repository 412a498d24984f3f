use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;
use crate::provider::ModelRequest;

#[derive(Debug, Serialize)]
struct Transcript<'a> {
    stage: &'a str,
    transaction: Uuid,
    timestamp: DateTime<Utc>,
    request: &'a ModelRequest,
    response: &'a str,
}

pub fn tx_dir(root: &Path, cfg: &Config, tx: Uuid) -> PathBuf {
    root.join(&cfg.transcript_dir).join(tx.to_string())
}

/// Write `<stage>.json` for one model call; returns where it went.
pub fn save_stage(
    stage: &str,
    req: &ModelRequest,
    resp: &str,
    tx: Uuid,
    cfg: &Config,
) -> anyhow::Result<PathBuf> {
    let dir = tx_dir(Path::new(&cfg.root), cfg, tx);
    fs::create_dir_all(&dir)?;
    let p = dir.join(format!("{stage}.json"));
    let record = Transcript {
        stage,
        transaction: tx,
        timestamp: Utc::now(),
        request: req,
        response: resp,
    };
    fs::write(&p, to_string_pretty(&record)?)?;
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ChatMessage;

    #[test]
    fn transcript_lands_under_tx_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config { root: dir.path().display().to_string(), ..Config::default() };
        let req = ModelRequest {
            system: None,
            messages: vec![ChatMessage::user("build a blog")],
            temperature: 0.0,
            max_output_tokens: 5,
        };
        let tx = Uuid::new_v4();
        let p = save_stage("template", &req, "react", tx, &cfg).unwrap();
        assert!(p.starts_with(dir.path().join(".scaffold/tx").join(tx.to_string())));
        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&p).unwrap()).unwrap();
        assert_eq!(v["stage"], "template");
        assert_eq!(v["response"], "react");
        assert_eq!(v["request"]["messages"][0]["role"], "user");
    }
}
