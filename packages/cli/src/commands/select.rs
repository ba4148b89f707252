use super::read_page;
use anyhow::{anyhow, Result};
use clap::Args;
use pagewright_editor::synthesize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// HTML page to inspect
    pub page: PathBuf,

    /// Selector for the element to address
    pub selector: String,

    /// Address every match instead of the first
    #[arg(short, long)]
    pub all: bool,
}

pub fn select(args: SelectArgs, _cwd: &str) -> Result<()> {
    let dom = read_page(&args.page)?;

    let nodes = if args.all {
        dom.query_selector_all(None, &args.selector)?
    } else {
        dom.query_selector(None, &args.selector)?.into_iter().collect()
    };

    if nodes.is_empty() {
        return Err(anyhow!("No element matches {}", args.selector));
    }

    for node in nodes {
        println!("{}", synthesize(&dom, node));
    }
    Ok(())
}
