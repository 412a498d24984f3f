use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::errors::TreeError;
use crate::wire::{FileItem, FileKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
enum NodeKind {
    File { content: String },
    Folder { children: Vec<usize> },
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    path: String,
    kind: NodeKind,
}

/// Project file tree stored as an arena. Nodes are never removed, so an
/// index stays valid for the life of the tree.
#[derive(Debug, Clone, Default)]
pub struct ProjectTree {
    nodes: Vec<Node>,
    by_path: HashMap<String, usize>,
    roots: Vec<usize>,
}

/// Split a slash path into clean segments. Empty and `.` segments are
/// dropped; `..` is refused.
pub fn normalize(path: &str) -> Result<Vec<&str>, TreeError> {
    let mut out = Vec::new();
    for seg in path.trim().split('/') {
        match seg.trim() {
            "" | "." => {}
            ".." => return Err(TreeError::InvalidPath(path.to_string())),
            s => out.push(s),
        }
    }
    if out.is_empty() {
        return Err(TreeError::InvalidPath(path.to_string()));
    }
    Ok(out)
}

/// The key a path is stored under: `/src/./App.tsx` becomes `src/App.tsx`.
pub fn normalized(path: &str) -> Result<String, TreeError> {
    normalize(path).map(|segs| segs.join("/"))
}

impl ProjectTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n.kind, NodeKind::File { .. })).count()
    }

    pub fn folder_count(&self) -> usize {
        self.nodes.len() - self.file_count()
    }

    /// Index lookup that accepts any spelling `normalize` accepts.
    fn index_of(&self, path: &str) -> Option<usize> {
        match self.by_path.get(path) {
            Some(&idx) => Some(idx),
            None => self.by_path.get(&normalized(path).ok()?).copied(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index_of(path).is_some()
    }

    /// File content at `path`; `None` for folders and unknown paths.
    pub fn content(&self, path: &str) -> Option<&str> {
        let idx = self.index_of(path)?;
        match &self.nodes[idx].kind {
            NodeKind::File { content } => Some(content),
            NodeKind::Folder { .. } => None,
        }
    }

    /// Create or overwrite the file at `path`, creating missing ancestor
    /// folders first. On error the tree is left untouched.
    pub fn fold_file(&mut self, path: &str, code: &str) -> Result<FoldOutcome, TreeError> {
        let segs = normalize(path)?;
        let full = segs.join("/");

        // Validate the whole walk before mutating anything.
        let mut prefix = String::new();
        for seg in &segs[..segs.len() - 1] {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(seg);
            if let Some(&idx) = self.by_path.get(&prefix) {
                if matches!(self.nodes[idx].kind, NodeKind::File { .. }) {
                    return Err(TreeError::FileInPath(prefix));
                }
            }
        }
        if let Some(&idx) = self.by_path.get(&full) {
            return match &mut self.nodes[idx].kind {
                NodeKind::File { content } => {
                    *content = code.trim().to_string();
                    Ok(FoldOutcome::Updated)
                }
                NodeKind::Folder { .. } => Err(TreeError::FolderCollision(full)),
            };
        }

        let mut parent: Option<usize> = None;
        let mut prefix = String::new();
        for seg in &segs[..segs.len() - 1] {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(seg);
            let idx = match self.by_path.get(&prefix).copied() {
                Some(idx) => idx,
                None => self.insert(
                    parent,
                    Node {
                        name: seg.to_string(),
                        path: prefix.clone(),
                        kind: NodeKind::Folder { children: Vec::new() },
                    },
                ),
            };
            parent = Some(idx);
        }

        let name = segs[segs.len() - 1].to_string();
        self.insert(
            parent,
            Node { name, path: full, kind: NodeKind::File { content: code.trim().to_string() } },
        );
        Ok(FoldOutcome::Created)
    }

    fn insert(&mut self, parent: Option<usize>, node: Node) -> usize {
        let idx = self.nodes.len();
        self.by_path.insert(node.path.clone(), idx);
        self.nodes.push(node);
        match parent {
            Some(p) => {
                if let NodeKind::Folder { children } = &mut self.nodes[p].kind {
                    children.push(idx);
                }
            }
            None => self.roots.push(idx),
        }
        idx
    }

    /// Nested snapshot for renderers, in creation order.
    pub fn items(&self) -> Vec<FileItem> {
        self.roots.iter().map(|&i| self.item(i)).collect()
    }

    /// Single node (with its subtree) by path.
    pub fn get(&self, path: &str) -> Option<FileItem> {
        self.index_of(path).map(|i| self.item(i))
    }

    fn item(&self, idx: usize) -> FileItem {
        let n = &self.nodes[idx];
        match &n.kind {
            NodeKind::File { content } => FileItem {
                name: n.name.clone(),
                path: n.path.clone(),
                kind: FileKind::File,
                content: Some(content.clone()),
                children: None,
            },
            NodeKind::Folder { children } => FileItem {
                name: n.name.clone(),
                path: n.path.clone(),
                kind: FileKind::Folder,
                content: None,
                children: Some(children.iter().map(|&c| self.item(c)).collect()),
            },
        }
    }

    /// Tree in the browser sandbox mount format:
    /// `{"name": {"file": {"contents": ..}}}` / `{"name": {"directory": {..}}}`.
    pub fn mount_tree(&self) -> Value {
        Value::Object(self.mount_level(&self.roots))
    }

    fn mount_level(&self, level: &[usize]) -> Map<String, Value> {
        let mut out = Map::new();
        for &i in level {
            let n = &self.nodes[i];
            let v = match &n.kind {
                NodeKind::File { content } => json!({ "file": { "contents": content } }),
                NodeKind::Folder { children } => {
                    json!({ "directory": Value::Object(self.mount_level(children)) })
                }
            };
            out.insert(n.name.clone(), v);
        }
        out
    }
}

/// Editor language id for a file path, by extension.
pub fn language_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("tsx") | Some("ts") => "typescript",
        Some("jsx") | Some("js") | Some("mjs") | Some("cjs") => "javascript",
        Some("css") => "css",
        Some("html") => "html",
        Some("json") => "json",
        Some("md") => "markdown",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn creates_ancestors_once_in_order() {
        let mut t = ProjectTree::new();
        assert_eq!(t.fold_file("a/b/c.txt", "x"), Ok(FoldOutcome::Created));
        assert_eq!(t.fold_file("a/b/d.txt", "y"), Ok(FoldOutcome::Created));
        let items = t.items();
        assert_eq!(items.len(), 1);
        let a = &items[0];
        assert_eq!((a.path.as_str(), a.kind), ("a", FileKind::Folder));
        let b = &a.children.as_ref().unwrap()[0];
        assert_eq!((b.path.as_str(), b.kind), ("a/b", FileKind::Folder));
        let names: Vec<&str> = b.children.as_ref().unwrap().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c.txt", "d.txt"]);
        assert_eq!(t.folder_count(), 2);
        assert_eq!(t.file_count(), 2);
    }

    #[test]
    fn overwrite_replaces_content_in_place() {
        let mut t = ProjectTree::new();
        t.fold_file("x.txt", "one").unwrap();
        assert_eq!(t.fold_file("./x.txt", "  two \n"), Ok(FoldOutcome::Updated));
        assert_eq!(t.content("x.txt"), Some("two"));
        assert_eq!(t.items().len(), 1);
    }

    #[test]
    fn lookups_accept_unnormalized_paths() {
        let mut t = ProjectTree::new();
        t.fold_file("/src/App.tsx", "app").unwrap();
        assert_eq!(t.items()[0].path, "src");
        assert_eq!(t.content("src/App.tsx"), Some("app"));
        assert_eq!(t.content("/src/App.tsx"), Some("app"));
        assert_eq!(t.content("./src//App.tsx"), Some("app"));
        assert!(t.contains("/src"));
        assert_eq!(t.get("./src").map(|i| i.kind), Some(FileKind::Folder));
        assert_eq!(t.content("../src/App.tsx"), None);
        assert_eq!(normalized(" ./a/./b "), Ok("a/b".to_string()));
    }

    #[test]
    fn file_onto_folder_is_rejected() {
        let mut t = ProjectTree::new();
        t.fold_file("src/main.js", "").unwrap();
        assert_eq!(t.fold_file("src", "boom"), Err(TreeError::FolderCollision("src".into())));
        assert_eq!(t.get("src").unwrap().kind, FileKind::Folder);
    }

    #[test]
    fn folder_through_file_is_rejected_without_side_effects() {
        let mut t = ProjectTree::new();
        t.fold_file("lib", "file").unwrap();
        assert_eq!(
            t.fold_file("lib/x/y.js", "z"),
            Err(TreeError::FileInPath("lib".into()))
        );
        assert!(!t.contains("lib/x"));
        assert_eq!(t.content("lib"), Some("file"));
    }

    #[test]
    fn bad_paths_are_rejected() {
        assert!(normalize("").is_err());
        assert!(normalize("//").is_err());
        assert!(normalize("../etc/passwd").is_err());
        assert_eq!(normalize("/src//a.js").unwrap(), vec!["src", "a.js"]);
    }

    #[test]
    fn mount_tree_shape() {
        let mut t = ProjectTree::new();
        t.fold_file("package.json", "{}").unwrap();
        t.fold_file("src/index.js", "run()").unwrap();
        assert_eq!(
            t.mount_tree(),
            json!({
                "package.json": { "file": { "contents": "{}" } },
                "src": { "directory": { "index.js": { "file": { "contents": "run()" } } } }
            })
        );
    }

    #[test]
    fn languages_by_extension() {
        assert_eq!(language_for("src/App.tsx"), "typescript");
        assert_eq!(language_for("index.JS"), "javascript");
        assert_eq!(language_for("README.md"), "markdown");
        assert_eq!(language_for("Dockerfile"), "plaintext");
    }
}
