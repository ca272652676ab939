//! Minimal CLI: one example document in, one schema document out.
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use crate::schema::{self, InferenceOptions};
use crate::tree;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate a JSON Schema (draft-07) from a single example JSON/JSONC document
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// path to the input JSON(-with-comments) document
    input: PathBuf,

    /// directory the generated schema is written into (must not already exist)
    #[arg(long, default_value = "build")]
    out_dir: PathBuf,

    /// JSON/JSONC file overriding the default inference option set
    #[arg(long)]
    options: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let source = std::fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read input file {}", self.input.display()))?;
        let options = match self.options.as_ref() {
            Some(path) => load_options(path)?,
            None => InferenceOptions::default(),
        };

        // 1) build the document tree; parse problems are warnings, not fatal
        let (root, issues) = tree::parse_tree(&source);
        for issue in &issues {
            eprintln!(
                "{} {} (offset {}, length {})",
                "warning:".yellow().bold(),
                issue.kind,
                issue.offset,
                issue.length
            );
        }
        let top = root
            .children
            .first()
            .context("input document contains no top-level value")?;

        // 2) infer and assemble the schema document
        let name = document_name(&self.input);
        let doc = schema::emit_document(top, &name, &options);
        let rendered = render_pretty(&doc)?;

        // 3) write into a fresh output directory
        std::fs::create_dir(&self.out_dir).with_context(|| {
            format!(
                "output directory {} already exists or cannot be created",
                self.out_dir.display()
            )
        })?;
        let out_file = self.out_dir.join(format!("{name}.schema.json"));
        std::fs::write(&out_file, rendered)
            .with_context(|| format!("failed to write {}", out_file.display()))?;
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schema".to_string())
}

/// Option files are themselves JSONC; run them through the same pipeline.
fn load_options(path: &Path) -> anyhow::Result<InferenceOptions> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read options file {}", path.display()))?;
    let (root, issues) = tree::parse_tree(&source);
    if let Some(issue) = issues.first() {
        anyhow::bail!(
            "options file {}: {} (offset {})",
            path.display(),
            issue.kind,
            issue.offset
        );
    }
    let top = root
        .children
        .first()
        .with_context(|| format!("options file {} contains no value", path.display()))?;
    serde_json::from_value(crate::value::materialize(top))
        .with_context(|| format!("options file {} does not match the option schema", path.display()))
}

/// 4-space indent.
fn render_pretty(doc: &serde_json::Value) -> anyhow::Result<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(doc, &mut serializer)?;
    Ok(String::from_utf8(out)?)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_name_is_the_file_stem() {
        assert_eq!(document_name(Path::new("conf/app.config.json")), "app.config");
        assert_eq!(document_name(Path::new("settings.jsonc")), "settings");
    }

    #[test]
    fn render_uses_four_space_indent() {
        let rendered = render_pretty(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(rendered, "{\n    \"a\": 1\n}");
    }
}
