mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, history, init, select, sessions, turn, undo, ApplyArgs, HistoryCommand, InitArgs,
    SelectArgs, SessionsCommand, TurnArgs, UndoArgs,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pagewright CLI - Apply and undo instruction-driven edits on HTML pages
#[derive(Parser, Debug)]
#[command(name = "pagewright")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding pagewright.config.json and session state
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default pagewright.config.json
    Init(InitArgs),

    /// Print a stable selector for an element
    Select(SelectArgs),

    /// Apply a batch of operations and print its inverse
    Apply(ApplyArgs),

    /// Apply an instruction-source response as the next turn of the active session
    Turn(TurnArgs),

    /// Undo (or redo) a turn of the active session
    Undo(UndoArgs),

    /// Browse and replay recorded designs
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Manage chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = match cli.config {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    }
    .display()
    .to_string();

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Select(args) => select(args, &cwd),
        Command::Apply(args) => apply(args, &cwd),
        Command::Turn(args) => turn(args, &cwd),
        Command::Undo(args) => undo(args, &cwd),
        Command::History { command } => history(command, &cwd),
        Command::Sessions { command } => sessions(command, &cwd),
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
