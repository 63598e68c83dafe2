use crate::config::DEFAULT_CONFIG_NAME;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dropzone_core::DropConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!("{} {} already exists", "⚠️".yellow(), DEFAULT_CONFIG_NAME.bright_white());
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config_json = serde_json::to_string_pretty(&DropConfig::default())?;
    fs::write(&config_path, config_json + "\n")?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("Next steps:");
    println!("  1. Add draggables to {}", DEFAULT_CONFIG_NAME);
    println!("  2. Run: dropzone check");
    println!("  3. Try: dropzone drop <files...>");

    Ok(())
}
