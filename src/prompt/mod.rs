use crate::parse::{ACTION_TAG, ARTIFACT_TAG};
use crate::wire::Template;

/// Prompts handed back after classification: `prompts` go into the chat
/// history, `ui_prompts` are artifacts parsed into the first step batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePrompts {
    pub prompts: Vec<String>,
    pub ui_prompts: Vec<String>,
}

pub fn classify_instruction() -> &'static str {
    "Return either node or react based on what do you think the project should be. \
     Only return a single word either 'node' or 'react'. Do not return anything extra."
}

fn design_policy() -> &'static str {
r#"For all designs I ask you to make, have them be beautiful, not cookie cutter.
Make webpages that are fully featured and worthy for production.
By default, this template supports JSX syntax with Tailwind CSS classes, React hooks, and Lucide React for icons.
Do not install other packages for UI themes, icons, etc unless absolutely necessary or I request them.
Use icons from lucide-react for logos.
Use stock photos from unsplash where appropriate, only valid URLs you know exist. Do not download the images, only link to them in image tags."#
}

fn artifact_format() -> String {
    format!(
r#"Artifact format:
- Wrap the whole answer in ONE <{art} id="kebab-case-id" title="Short Title"> ... </{art}> block.
- Inside it, emit one <{act}> per step, in the order they must run:
  • Files: <{act} type="file" filePath="relative/path.ext"> FULL file contents </{act}>
  • Commands: <{act} type="shell"> single shell command </{act}>
- Always send complete file contents. Never use placeholders like "// rest of the code".
- A later file action for the same filePath replaces the earlier one.
- Install dependencies (package.json) before running anything; start the dev server last.
- Do not explain the artifact beyond one short sentence before it."#,
        art = ARTIFACT_TAG,
        act = ACTION_TAG,
    )
}

/// System prompt for the code generation chat.
pub fn system_prompt() -> String {
    format!(
        "You are an expert senior software engineer building websites that run in an in-browser Node.js sandbox.\n\
         The sandbox has no native binaries, no pip, no git. Prefer Vite for web servers and plain Node scripts otherwise.\n\n{}",
        artifact_format()
    )
}

fn node_artifact() -> String {
    format!(
r#"<{art} id="project-import" title="Project Files">
<{act} type="file" filePath="index.js">// run `node index.js` in the terminal

console.log(`Hello Node.js v${{process.versions.node}}!`);
</{act}>
<{act} type="file" filePath="package.json">{{
  "name": "node-starter",
  "private": true,
  "scripts": {{
    "test": "echo \"Error: no test specified\" && exit 1"
  }}
}}
</{act}>
</{art}>"#,
        art = ARTIFACT_TAG,
        act = ACTION_TAG,
    )
}

fn react_artifact() -> String {
    format!(
r#"<{art} id="project-import" title="Project Files">
<{act} type="file" filePath="package.json">{{
  "name": "vite-react-typescript-starter",
  "private": true,
  "version": "0.0.0",
  "type": "module",
  "scripts": {{
    "dev": "vite",
    "build": "vite build",
    "preview": "vite preview"
  }},
  "dependencies": {{
    "lucide-react": "^0.344.0",
    "react": "^18.3.1",
    "react-dom": "^18.3.1"
  }},
  "devDependencies": {{
    "@types/react": "^18.3.5",
    "@types/react-dom": "^18.3.0",
    "@vitejs/plugin-react": "^4.3.1",
    "autoprefixer": "^10.4.18",
    "postcss": "^8.4.35",
    "tailwindcss": "^3.4.1",
    "typescript": "^5.5.3",
    "vite": "^5.4.2"
  }}
}}
</{act}>
<{act} type="file" filePath="index.html"><!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Vite + React + TS</title>
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="/src/main.tsx"></script>
  </body>
</html>
</{act}>
<{act} type="file" filePath="vite.config.ts">import {{ defineConfig }} from 'vite';
import react from '@vitejs/plugin-react';

export default defineConfig({{
  plugins: [react()],
  optimizeDeps: {{
    exclude: ['lucide-react'],
  }},
}});
</{act}>
<{act} type="file" filePath="tailwind.config.js">/** @type {{import('tailwindcss').Config}} */
export default {{
  content: ['./index.html', './src/**/*.{{js,ts,jsx,tsx}}'],
  theme: {{
    extend: {{}},
  }},
  plugins: [],
}};
</{act}>
<{act} type="file" filePath="postcss.config.js">export default {{
  plugins: {{
    tailwindcss: {{}},
    autoprefixer: {{}},
  }},
}};
</{act}>
<{act} type="file" filePath="src/main.tsx">import {{ StrictMode }} from 'react';
import {{ createRoot }} from 'react-dom/client';
import App from './App.tsx';
import './index.css';

createRoot(document.getElementById('root')!).render(
  <StrictMode>
    <App />
  </StrictMode>
);
</{act}>
<{act} type="file" filePath="src/App.tsx">function App() {{
  return (
    <div className="min-h-screen bg-gray-100 flex items-center justify-center">
      <p>Start prompting (or editing) to see magic happen :)</p>
    </div>
  );
}}

export default App;
</{act}>
<{act} type="file" filePath="src/index.css">@tailwind base;
@tailwind components;
@tailwind utilities;
</{act}>
</{art}>"#,
        art = ARTIFACT_TAG,
        act = ACTION_TAG,
    )
}

/// The starter artifact for a template, as parsed into the first batch.
pub fn base_artifact(template: Template) -> String {
    match template {
        Template::Node => node_artifact(),
        Template::React => react_artifact(),
    }
}

fn project_context(artifact: &str) -> String {
    format!(
        "Here is an artifact that contains all files of the project visible to you.\n\
         Consider the contents of ALL files in the project.\n\n{artifact}\n\n\
         Here is a list of files that exist on the file system but are not being shown to you:\n\n\
         \x20 - .gitignore\n\x20 - package-lock.json\n"
    )
}

pub fn template_prompts(template: Template) -> TemplatePrompts {
    let artifact = base_artifact(template);
    let prompts = match template {
        Template::Node => vec![project_context(&artifact)],
        Template::React => vec![design_policy().to_string(), project_context(&artifact)],
    };
    TemplatePrompts { prompts, ui_prompts: vec![artifact] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use crate::wire::StepKind;

    #[test]
    fn base_artifacts_parse_into_files() {
        let react = parse(&base_artifact(Template::React));
        assert_eq!(react[0].title, "Project Files");
        assert!(react[1..].iter().all(|s| s.kind == StepKind::CreateFile));
        let paths: Vec<&str> = react.iter().filter_map(|s| s.path.as_deref()).collect();
        assert!(paths.contains(&"src/App.tsx"));
        assert!(paths.contains(&"index.html"));

        let node = parse(&base_artifact(Template::Node));
        assert_eq!(node.len(), 3);
        assert!(node[1].code.as_deref().unwrap().contains("process.versions.node"));
    }

    #[test]
    fn react_carries_design_prompt() {
        let p = template_prompts(Template::React);
        assert_eq!(p.prompts.len(), 2);
        assert!(p.prompts[1].contains("src/main.tsx"));
        assert_eq!(template_prompts(Template::Node).prompts.len(), 1);
    }
}
