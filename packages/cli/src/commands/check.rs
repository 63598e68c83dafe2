use crate::config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dropzone_core::RuleRegistry;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Config file (defaults to dropzone.config.json in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let config = config::load(cwd, args.config.as_deref())?;
    let registry = RuleRegistry::compile(&config.draggables)?;

    println!("🔍 {} draggable(s), in matching order:", registry.len());
    for (position, rule) in registry.rules().iter().enumerate() {
        println!(
            "   {}. {} → <{} {}>",
            position + 1,
            rule.pattern().cyan(),
            rule.tag().bright_white(),
            rule.attribute()
        );
    }

    if registry.is_empty() {
        println!("   {} no file will ever be accepted", "⚠️".yellow());
    }

    println!();
    println!("✨ {}", "Configuration is valid".green().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn check_json(json: &str) -> Result<()> {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("rules.json"), json).unwrap();
        check(
            CheckArgs {
                config: Some(PathBuf::from("rules.json")),
            },
            &dir.path().display().to_string(),
        )
    }

    #[test]
    fn test_valid_config() {
        assert!(check_json(r#"{ "draggables": [{ "contentTypePattern": "^image/", "tag": "img", "attr": "src" }] }"#).is_ok());
    }

    #[test]
    fn test_incomplete_draggable_names_descriptor() {
        let err = check_json(r#"{ "draggables": [{ "contentTypePattern": "^image/", "tag": "img" }] }"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("contentTypePattern, tag and attr"));
        assert!(message.contains("^image/"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = check_json(r#"{ "draggables": [{ "contentTypePattern": "(", "tag": "a", "attr": "href" }] }"#).unwrap_err();
        assert!(err.to_string().contains("Invalid contentTypePattern"));
    }
}
