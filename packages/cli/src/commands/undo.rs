use super::{print_results, print_summary, read_page, write_page};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pagewright_editor::SessionStore;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct UndoArgs {
    /// HTML page the turn was applied to
    pub page: PathBuf,

    /// Turn index in the active session (defaults to the latest)
    #[arg(short, long)]
    pub turn: Option<usize>,

    /// Run the turn's operations again instead of undoing them
    #[arg(long)]
    pub redo: bool,

    /// Output file (defaults to overwriting the page)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn undo(args: UndoArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let session_path = config.session_path(cwd);
    let mut store = SessionStore::load(&session_path)?.with_max_sessions(config.max_sessions);
    let mut dom = read_page(&args.page)?;

    let session = store.active_session_mut()?;
    let index = match args.turn {
        Some(index) => index,
        None => session
            .turns
            .len()
            .checked_sub(1)
            .ok_or_else(|| anyhow!("{} has no turns", session.name))?,
    };

    let outcome = if args.redo {
        println!("{}", format!("↪️  Re-applying turn {}...", index).bright_blue().bold());
        session.reapply_turn(&mut dom, index)?
    } else {
        println!("{}", format!("↩️  Undoing turn {}...", index).bright_blue().bold());
        session.undo_turn(&mut dom, index)?
    };

    print_results(&outcome.results);
    println!();
    print_summary(&outcome.results);

    let written = write_page(&dom, &args.page, args.out.as_ref())?;
    if args.redo {
        store.save(&session_path)?;
    }

    println!();
    println!("{} Wrote {}", "✓".green(), written.display());
    Ok(())
}
