pub mod apply;
pub mod history;
pub mod init;
pub mod select;
pub mod sessions;
pub mod turn;
pub mod undo;

pub use apply::{apply, ApplyArgs};
pub use history::{history, HistoryCommand};
pub use init::{init, InitArgs};
pub use select::{select, SelectArgs};
pub use sessions::{sessions, SessionsCommand};
pub use turn::{turn, TurnArgs};
pub use undo::{undo, UndoArgs};

use anyhow::{Context, Result};
use colored::Colorize;
use pagewright_dom::Dom;
use pagewright_editor::OperationResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub(crate) fn read_page(path: &Path) -> Result<Dom> {
    let html = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let dom = Dom::parse_document(&html).with_context(|| format!("Cannot parse {}", path.display()))?;
    debug!(path = %path.display(), bytes = html.len(), "page loaded");
    Ok(dom)
}

/// Write the page to `out`, or back over `page` when no output is given
pub(crate) fn write_page(dom: &Dom, page: &Path, out: Option<&PathBuf>) -> Result<PathBuf> {
    let target = out.cloned().unwrap_or_else(|| page.to_path_buf());
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let html = dom.outer_html(dom.document());
    fs::write(&target, &html)?;
    debug!(path = %target.display(), bytes = html.len(), "page written");
    Ok(target)
}

pub(crate) fn print_results(results: &[OperationResult]) {
    for result in results {
        match &result.error {
            None => println!("  {} {}", "✓".green(), result.selector),
            Some(error) => println!("  {} {} - {}", "✗".red(), result.selector, error.red()),
        }
    }
}

pub(crate) fn print_summary(results: &[OperationResult]) {
    let succeeded = results.iter().filter(|r| r.success).count();
    if succeeded == results.len() {
        println!("{} Applied {} changes", "✓".green(), results.len());
    } else {
        println!(
            "{} Applied {}/{} changes. Some operations failed.",
            "⚠️".yellow(),
            succeeded,
            results.len()
        );
    }
}
