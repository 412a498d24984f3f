//! Turns a model response in the artifact format into ordered build steps.
//!
//! The parser never fails. It walks a ladder of strategies, each looser than
//! the last, and keeps the first one that recovers at least one action:
//!
//! 1. **Envelope**: actions inside the first `<boltArtifact ...>...</boltArtifact>`.
//! 2. **Unanchored**: no envelope, but a `<boltAction>` carrying `type="file"`
//!    or `type="shell"` exists somewhere; take the first one.
//! 3. **Loose**: treat the whole input as one implicit action, reading bare
//!    `type=`/`filePath=` attributes wherever they appear.
//!
//! Only `<boltArtifact` and `<boltAction` start tags are ever lexed; the prose
//! around them is skipped unread.
//!
//! Every non-empty result starts with a synthetic `CreateFolder` step carrying
//! the artifact title. If tokenizing fails outright, the loose pass runs on
//! the unsanitized input; when that recovers nothing the result is empty.

pub mod lexer;

use std::borrow::Cow;

use log::{debug, warn};

use crate::wire::{Step, StepKind};
use lexer::{find_attr, find_close, LexError, Lexer};

pub const DEFAULT_TITLE: &str = "Project Files";
pub const ARTIFACT_TAG: &str = "boltArtifact";
pub const ACTION_TAG: &str = "boltAction";

/// Which rung of the ladder produced the actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Envelope,
    Unanchored,
    Loose,
}

struct Ids(u32);

impl Ids {
    fn next(&mut self) -> u32 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// Drop control characters that are neither printable nor whitespace.
pub fn sanitize(input: &str) -> Cow<'_, str> {
    fn is_junk(c: char) -> bool {
        matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}')
    }
    if input.chars().any(is_junk) {
        Cow::Owned(input.chars().filter(|c| !is_junk(*c)).collect())
    } else {
        Cow::Borrowed(input)
    }
}

pub fn parse(text: &str) -> Vec<Step> {
    parse_from(text, 1)
}

/// Parse with ids starting at `first_id`, so a later batch continues the
/// numbering of an earlier one.
pub fn parse_from(text: &str, first_id: u32) -> Vec<Step> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let clean = sanitize(text);
    match scan(&clean, first_id) {
        Ok((steps, strategy)) => {
            debug!("parsed {} step(s) via {:?}", steps.len(), strategy);
            steps
        }
        Err(err) => {
            warn!("artifact scan failed ({err}); retrying loosely over raw input");
            let mut ids = Ids(first_id);
            let leading = ids.next();
            match loose(text, &mut ids) {
                Some(step) => vec![Step::artifact(leading, title_of(text, None)), step],
                None => Vec::new(),
            }
        }
    }
}

fn title_of<'a>(text: &'a str, envelope_title: Option<&'a str>) -> &'a str {
    envelope_title
        .or_else(|| find_attr(text, "title").map(|(v, _)| v))
        .unwrap_or(DEFAULT_TITLE)
}

fn scan(text: &str, first_id: u32) -> Result<(Vec<Step>, Option<Strategy>), LexError> {
    let mut ids = Ids(first_id);
    let envelope = find_envelope(text)?;
    let leading = Step::artifact(
        ids.next(),
        title_of(text, envelope.as_ref().and_then(|e| e.title)),
    );

    let (mut actions, mut strategy) = match &envelope {
        Some(env) => (extract_actions(env.body, &mut ids)?, Strategy::Envelope),
        None if has_action_marker(text) => (
            unanchored(text, &mut ids)?.into_iter().collect(),
            Strategy::Unanchored,
        ),
        None => (Vec::new(), Strategy::Loose),
    };

    if actions.is_empty() {
        debug!("no actions recovered via {strategy:?}; trying loose pass");
        actions.extend(loose(text, &mut ids));
        strategy = Strategy::Loose;
    }

    let mut steps = Vec::with_capacity(actions.len() + 1);
    steps.push(leading);
    let used = (!actions.is_empty()).then_some(strategy);
    steps.extend(actions);
    Ok((steps, used))
}

struct Envelope<'a> {
    title: Option<&'a str>,
    body: &'a str,
}

fn find_envelope(text: &str) -> Result<Option<Envelope<'_>>, LexError> {
    let mut lx = Lexer::new(text);
    while let Some(tag) = lx.next_tag(ARTIFACT_TAG)? {
        if tag.self_closing {
            continue;
        }
        let title = tag.attr("title");
        return Ok(lx
            .raw_until_close(ARTIFACT_TAG)
            .map(|body| Envelope { title, body }));
    }
    Ok(None)
}

fn has_action_marker(text: &str) -> bool {
    text.contains(r#"type="file""#) || text.contains(r#"type="shell""#)
}

fn extract_actions(body: &str, ids: &mut Ids) -> Result<Vec<Step>, LexError> {
    let mut lx = Lexer::new(body);
    let mut out = Vec::new();
    while let Some(tag) = lx.next_tag(ACTION_TAG)? {
        if tag.self_closing {
            debug!("skipping self-closing action");
            continue;
        }
        let Some(content) = lx.raw_until_close(ACTION_TAG) else {
            warn!("action without closing tag; ignoring the rest of the artifact");
            break;
        };
        out.extend(build_action(tag.attr("type"), tag.attr("filePath"), Some(content), ids));
    }
    Ok(out)
}

fn unanchored(text: &str, ids: &mut Ids) -> Result<Option<Step>, LexError> {
    let mut lx = Lexer::new(text);
    while let Some(tag) = lx.next_tag(ACTION_TAG)? {
        let Some(kind) = tag.attr("type") else { continue };
        if kind != "file" && kind != "shell" {
            continue;
        }
        let content = if tag.self_closing {
            None
        } else {
            Some(lx.raw_until_close(ACTION_TAG).unwrap_or_else(|| lx.rest()))
        };
        return Ok(build_action(Some(kind), tag.attr("filePath"), content, ids));
    }
    Ok(None)
}

fn loose(text: &str, ids: &mut Ids) -> Option<Step> {
    let (kind, after_type) = find_attr(text, "type")?;
    let path = find_attr(text, "filePath").map(|(v, _)| v);
    let content = text[after_type..].find('>').map(|gt| {
        let start = after_type + gt + 1;
        match find_close(text, start, ACTION_TAG) {
            Some((end, _)) => &text[start..end],
            None => &text[start..],
        }
    });
    build_action(Some(kind), path, content, ids)
}

fn build_action(
    kind: Option<&str>,
    path: Option<&str>,
    content: Option<&str>,
    ids: &mut Ids,
) -> Option<Step> {
    let code = content.map(str::trim);
    match kind {
        Some("file") => {
            let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
                warn!("skipping file action without filePath");
                return None;
            };
            let mut step = Step::create_file(ids.next(), path, code.unwrap_or_default());
            step.code = code.map(str::to_string);
            Some(step)
        }
        Some("shell") => match code.filter(|c| !c.is_empty()) {
            Some(cmd) => Some(Step::run_script(ids.next(), cmd)),
            None => {
                warn!("skipping empty shell action");
                None
            }
        },
        other => {
            warn!("skipping action of unsupported type {other:?}");
            None
        }
    }
}

/// True when the step is the synthetic artifact marker.
pub fn is_artifact_marker(step: &Step) -> bool {
    step.kind == StepKind::CreateFolder && step.path.is_none()
}
