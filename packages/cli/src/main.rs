mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, drop_files, init, CheckArgs, DropArgs, InitArgs};
use tracing_subscriber::EnvFilter;

/// Dropzone CLI - simulate file drops into a rich-text document
#[derive(Parser, Debug)]
#[command(name = "dropzone")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log pipeline decisions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a dropzone.config.json with the default draggables
    Init(InitArgs),

    /// Validate the configured draggables
    Check(CheckArgs),

    /// Drop files into an in-memory document and print the result
    Drop(DropArgs),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Check(args) => check(args, &cwd),
                Command::Drop(args) => drop_files(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
