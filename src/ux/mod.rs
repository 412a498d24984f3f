use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::parse::is_artifact_marker;
use crate::stepper::ProjectState;
use crate::tree::language_for;
use crate::wire::{FileItem, FileKind, Step, StepKind, StepStatus};

pub fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn status_badge(status: StepStatus) -> colored::ColoredString {
    match status {
        StepStatus::Completed => "✔".green().bold(),
        StepStatus::Active => "▶".yellow().bold(),
        StepStatus::Pending => "·".dimmed(),
    }
}

fn kind_label(step: &Step) -> colored::ColoredString {
    match step.kind {
        _ if is_artifact_marker(step) => "[ARTIFACT]".magenta().bold(),
        StepKind::CreateFile => "[CREATE]".green().bold(),
        StepKind::CreateFolder => "[FOLDER]".blue().bold(),
        StepKind::EditFile => "[EDIT]".yellow().bold(),
        StepKind::DeleteFile => "[DELETE]".red().bold(),
        StepKind::RunScript => "[COMMAND]".cyan().bold(),
    }
}

pub fn show_steps(steps: &[Step]) {
    println!("\n=== STEPS ===");
    if steps.is_empty() {
        println!("(no steps)");
        return;
    }
    for s in steps {
        let detail = match (s.kind, &s.code) {
            (StepKind::RunScript, Some(cmd)) => format!("  $ {}", cmd.lines().next().unwrap_or_default()),
            _ => String::new(),
        };
        println!("{:>3}. {} {}  {}{}", s.id, status_badge(s.status), kind_label(s), s.title, detail.dimmed());
    }
}

pub fn show_tree(state: &ProjectState) {
    println!("\n=== FILES ===");
    let items = state.tree.items();
    if items.is_empty() {
        println!("(no files)");
        return;
    }
    let mut out = Vec::new();
    render_items(&items, "", state.selected.as_deref(), &mut out);
    for line in out {
        println!("{line}");
    }
    println!(
        "{} files, {} folders",
        state.tree.file_count(),
        state.tree.folder_count()
    );
}

/// Box-drawing lines for a tree level, selected file highlighted.
pub fn render_items(items: &[FileItem], prefix: &str, selected: Option<&str>, out: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        let last = i + 1 == items.len();
        let branch = if last { "└── " } else { "├── " };
        let name = match item.kind {
            FileKind::Folder => format!("{}/", item.name).blue().bold().to_string(),
            FileKind::File if selected == Some(item.path.as_str()) => {
                item.name.black().on_yellow().to_string()
            }
            FileKind::File => item.name.clone(),
        };
        out.push(format!("{prefix}{branch}{name}"));
        if let Some(children) = &item.children {
            let next = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_items(children, &next, selected, out);
        }
    }
}

pub fn show_file(state: &ProjectState, path: &str) {
    match state.tree.content(path) {
        Some(content) => {
            println!("\n--- {} ({}) ---", path.bold(), language_for(path));
            println!("{content}");
        }
        None => println!("\n{} {}", "no such file:".red(), path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_nested_tree() {
        colored::control::set_override(false);
        let mut st = ProjectState::new();
        st.merge(vec![
            Step::create_file(1, "src/a.js", "a"),
            Step::create_file(2, "src/lib/b.js", "b"),
            Step::create_file(3, "README.md", "r"),
        ]);
        let mut out = Vec::new();
        render_items(&st.tree.items(), "", None, &mut out);
        assert_eq!(
            out,
            vec![
                "├── src/",
                "│   ├── a.js",
                "│   └── lib/",
                "│       └── b.js",
                "└── README.md",
            ]
        );
    }
}
