use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ========================================
/// Build steps and project tree records
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    CreateFile,
    CreateFolder,
    // Reserved: the parser never emits these two.
    EditFile,
    DeleteFile,
    RunScript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    #[serde(alias = "current")]
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: u32,
    pub title: String,
    pub kind: StepKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub status: StepStatus,
}

impl Step {
    /// The leading "start of artifact" marker.
    pub fn artifact(id: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            kind: StepKind::CreateFolder,
            path: None,
            code: None,
            status: StepStatus::Pending,
        }
    }

    pub fn create_file(id: u32, path: impl Into<String>, code: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id,
            title: format!("Create {path}"),
            kind: StepKind::CreateFile,
            path: Some(path),
            code: Some(code.into()),
            status: StepStatus::Pending,
        }
    }

    pub fn run_script(id: u32, command: impl Into<String>) -> Self {
        Self {
            id,
            title: "Run command".to_string(),
            kind: StepKind::RunScript,
            path: None,
            code: Some(command.into()),
            status: StepStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Folder,
}

/// A node of the project tree as handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileItem>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self { role: Role::Model, content: content.into() }
    }
}

/// Project flavour picked by the classification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Node,
    React,
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`' || c == '.');
        match t.to_lowercase().as_str() {
            "node" => Ok(Template::Node),
            "react" => Ok(Template::React),
            _ => Err(format!("unknown template: {s}")),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Node => f.write_str("node"),
            Template::React => f.write_str("react"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn current_is_accepted_as_active() {
        let s: StepStatus = serde_json::from_str("\"current\"").unwrap();
        assert_eq!(s, StepStatus::Active);
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"active\"");
    }

    #[test]
    fn status_names_on_the_wire() {
        let all = [StepStatus::Pending, StepStatus::Active, StepStatus::Completed];
        let names: Vec<String> = all.iter().map(|s| serde_json::to_string(s).unwrap()).collect();
        assert_eq!(names, vec!["\"pending\"", "\"active\"", "\"completed\""]);
    }

    #[test]
    fn template_answer_is_normalized() {
        assert_eq!(" React\n".parse::<Template>(), Ok(Template::React));
        assert_eq!("'node'".parse::<Template>(), Ok(Template::Node));
        assert!("vue".parse::<Template>().is_err());
    }

    #[test]
    fn file_item_omits_fields_by_kind() {
        let item = FileItem {
            name: "a.txt".into(),
            path: "a.txt".into(),
            kind: FileKind::File,
            content: Some(String::new()),
            children: None,
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["type"], "file");
        assert_eq!(v["content"], "");
        assert!(v.get("children").is_none());
    }
}
