use crate::config;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use dropzone_core::memory::{MemoryDropEvent, MemoryEditor, MemoryFile};
use dropzone_core::{
    DragAndDrop, DropHook, DropOptions, DropReport, DroppedFile, Editor, FileOutcome, HookOutcome, Selection,
};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct DropArgs {
    /// Files to drop, in drop order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Config file (defaults to dropzone.config.json in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Initial document text
    #[arg(short, long, default_value = "")]
    pub text: String,

    /// Caret position; without it the editor is unfocused and embeds go to the end
    #[arg(long)]
    pub cursor: Option<usize>,

    /// Veto files whose name matches PATTERN
    #[arg(long, value_name = "PATTERN")]
    pub veto: Vec<String>,

    /// Insert VALUE instead of the file content for files whose name matches PATTERN
    #[arg(long, value_name = "PATTERN=VALUE")]
    pub replace: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Decisions the simulated drop hook makes from the command line flags
#[derive(Debug, Default)]
struct HookRules {
    veto: Vec<Regex>,
    replace: Vec<(Regex, String)>,
}

impl HookRules {
    fn parse(veto: &[String], replace: &[String]) -> Result<Self> {
        let veto = veto
            .iter()
            .map(|pattern| Regex::new(pattern).with_context(|| format!("Invalid --veto pattern {:?}", pattern)))
            .collect::<Result<Vec<_>>>()?;

        let replace = replace
            .iter()
            .map(|entry| {
                let (pattern, value) = entry
                    .split_once('=')
                    .with_context(|| format!("Expected PATTERN=VALUE, got {:?}", entry))?;
                let pattern =
                    Regex::new(pattern).with_context(|| format!("Invalid --replace pattern {:?}", pattern))?;
                Ok((pattern, value.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { veto, replace })
    }

    fn is_empty(&self) -> bool {
        self.veto.is_empty() && self.replace.is_empty()
    }

    fn decide(&self, file_name: &str) -> HookOutcome {
        if self.veto.iter().any(|pattern| pattern.is_match(file_name)) {
            return HookOutcome::Veto;
        }

        self.replace
            .iter()
            .find(|(pattern, _)| pattern.is_match(file_name))
            .map(|(_, value)| HookOutcome::Override(value.clone()))
            .unwrap_or(HookOutcome::UseFallback)
    }

    fn into_hook(self) -> DropHook<MemoryFile> {
        DropHook::from_fn(move |file: MemoryFile, _| self.decide(&file.name()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DropSummary {
    intercepted: bool,
    delta: serde_json::Value,
    html: String,
    outcomes: Vec<FileOutcome>,
}

pub fn drop_files(args: DropArgs, cwd: &str) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let summary = runtime.block_on(simulate(&args, cwd))?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }
    Ok(())
}

async fn simulate(args: &DropArgs, cwd: &str) -> Result<DropSummary> {
    let config = config::load(cwd, args.config.as_deref())?;
    let hooks = HookRules::parse(&args.veto, &args.replace)?;

    let editor = Rc::new(MemoryEditor::with_text(&args.text));
    if let Some(cursor) = args.cursor {
        let length = editor.length();
        if cursor > length {
            anyhow::bail!("--cursor {} is past the end of the document (length {})", cursor, length);
        }
        editor.set_selection(Some(Selection::caret(cursor)));
    }

    let mut options = DropOptions::from_config(config);
    if !hooks.is_empty() {
        options = options.with_hook(hooks.into_hook());
    }
    let module = DragAndDrop::new(Rc::clone(&editor), options)?;

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(load_file(&PathBuf::from(cwd).join(path)).await);
    }

    let event = MemoryDropEvent::new(files);
    let report = match module.handle_drop(&event) {
        Some(pending) => pending.await,
        None => DropReport::default(),
    };

    Ok(DropSummary {
        intercepted: event.default_prevented(),
        delta: editor.delta(),
        html: editor.editable_root().to_html(),
        outcomes: report.outcomes,
    })
}

/// Read a file from disk. Read errors surface later as a failed slot.
async fn load_file(path: &Path) -> MemoryFile {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_default();

    match tokio::fs::read(path).await {
        Ok(content) => MemoryFile::new(name, mime_type, content),
        Err(err) => {
            tracing::debug!("Cannot read {}: {}", path.display(), err);
            MemoryFile::unreadable(name, mime_type, err.to_string())
        }
    }
}

fn print_summary(summary: &DropSummary) {
    if !summary.intercepted {
        println!("{} No draggable matched; the drop was left to the browser", "⚠️".yellow());
        return;
    }

    for outcome in &summary.outcomes {
        match outcome {
            FileOutcome::Embedded { file, index } => {
                println!("   {} {} embedded at {}", "✓".green(), file, index)
            }
            FileOutcome::Appended { file, tag } => {
                println!("   {} {} appended as <{}>", "✓".green(), file, tag)
            }
            FileOutcome::Vetoed { file } => println!("   {} {} vetoed", "-".yellow(), file),
            FileOutcome::Failed { file, error } => println!("   {} {}: {}", "✗".red(), file, error),
        }
    }

    println!();
    println!("{}", "Document:".bold());
    println!("{}", serde_json::to_string_pretty(&summary.delta).unwrap_or_default());
    println!();
    println!("{}", "Container:".bold());
    println!("{}", summary.html);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(files: &[&str]) -> DropArgs {
        DropArgs {
            files: files.iter().map(PathBuf::from).collect(),
            config: None,
            text: String::new(),
            cursor: None,
            veto: Vec::new(),
            replace: Vec::new(),
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_hook_rules() {
        let rules = HookRules::parse(&["\\.gif$".to_string()], &["^logo=/static/logo.png".to_string()]).unwrap();

        assert_eq!(rules.decide("anim.gif"), HookOutcome::Veto);
        assert_eq!(rules.decide("logo.png"), HookOutcome::Override("/static/logo.png".to_string()));
        assert_eq!(rules.decide("photo.png"), HookOutcome::UseFallback);
    }

    #[test]
    fn test_replace_requires_value() {
        assert!(HookRules::parse(&[], &["no-separator".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_simulate_image_drop() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.png"), [1u8, 2, 3]).unwrap();
        let cwd = dir.path().display().to_string();

        let mut drop_args = args(&["a.png"]);
        drop_args.text = "hi".to_string();
        drop_args.cursor = Some(1);

        let summary = simulate(&drop_args, &cwd).await.unwrap();
        assert!(summary.intercepted);
        assert_eq!(
            summary.delta,
            serde_json::json!({ "ops": [
                { "insert": "h" },
                { "insert": { "image": "data:image/png;base64,AQID" } },
                { "insert": "i" }
            ] })
        );
    }

    #[tokio::test]
    async fn test_simulate_unmatched_drop() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let summary = simulate(&args(&["notes.txt"]), &dir.path().display().to_string())
            .await
            .unwrap();
        assert!(!summary.intercepted);
        assert!(summary.outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_fails_its_slot() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.png"), "b").unwrap();

        let summary = simulate(&args(&["missing.png", "b.png"]), &dir.path().display().to_string())
            .await
            .unwrap();
        assert!(matches!(summary.outcomes[0], FileOutcome::Failed { .. }));
        assert!(summary.outcomes[1].is_inserted());
    }

    #[tokio::test]
    async fn test_cursor_past_end_fails() {
        let dir = TempDir::new().unwrap();
        let mut drop_args = args(&["a.png"]);
        drop_args.cursor = Some(5);
        assert!(simulate(&drop_args, &dir.path().display().to_string()).await.is_err());
    }
}
