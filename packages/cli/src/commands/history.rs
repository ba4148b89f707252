use super::{print_results, print_summary, read_page, write_page};
use crate::config::Config;
use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use pagewright_editor::{host_of, History, HistoryItem};
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List recorded designs, newest first
    List {
        /// Only show designs recorded on this URL's host
        #[arg(long)]
        url: Option<String>,

        /// Show designs from every host
        #[arg(long)]
        all: bool,
    },

    /// Undo a recorded design on a page
    Undo {
        id: String,
        page: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Apply a recorded design to a page again
    Reapply {
        id: String,
        page: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Delete a recorded design
    Remove { id: String },
}

pub fn history(command: HistoryCommand, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let history_path = config.history_path(cwd);
    let mut history = History::load(&history_path, config.history_limit)?;

    match command {
        HistoryCommand::List { url, all } => {
            let host = url
                .as_deref()
                .filter(|_| config.filter_by_domain && !all)
                .and_then(host_of);
            let items: Vec<&HistoryItem> = match host {
                Some(host) => history.for_host(host).collect(),
                None => history.items().iter().collect(),
            };

            if items.is_empty() {
                println!("{}", "No designs recorded".yellow());
                return Ok(());
            }
            for item in items {
                print_item(item);
            }
        }
        HistoryCommand::Undo { id, page, out } => {
            let mut dom = read_page(&page)?;
            println!("{}", format!("↩️  Undoing {}...", id).bright_blue().bold());
            let outcome = history.undo(&id, &mut dom)?;
            print_results(&outcome.results);
            println!();
            print_summary(&outcome.results);
            let written = write_page(&dom, &page, out.as_ref())?;
            println!("{} Wrote {}", "✓".green(), written.display());
        }
        HistoryCommand::Reapply { id, page, out } => {
            let mut dom = read_page(&page)?;
            println!("{}", format!("↪️  Re-applying {}...", id).bright_blue().bold());
            let outcome = history.reapply(&id, &mut dom)?;
            print_results(&outcome.results);
            println!();
            print_summary(&outcome.results);
            let written = write_page(&dom, &page, out.as_ref())?;
            history.save(&history_path)?;
            println!("{} Wrote {}", "✓".green(), written.display());
        }
        HistoryCommand::Remove { id } => {
            let removed = history.remove(&id)?;
            history.save(&history_path)?;
            println!("{} Removed {}", "✓".green(), removed.instruction);
        }
    }
    Ok(())
}

fn print_item(item: &HistoryItem) {
    let failed = item.operation_results.iter().filter(|r| !r.success).count();
    let status = if failed == 0 {
        "✓".green()
    } else {
        "⚠️".yellow()
    };
    println!(
        "{} {} {} {}",
        status,
        item.id.bright_white(),
        item.timestamp.format("%Y-%m-%d %H:%M"),
        item.url.dimmed()
    );
    println!("    {}", item.instruction);
    if let Some(summary) = &item.summary {
        println!("    {}", summary.dimmed());
    }
    println!(
        "    {} operations, {} undo operations",
        item.operations.len(),
        item.undo_operations.len()
    );
}
