use super::{print_results, print_summary, read_page, write_page};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use pagewright_editor::{
    apply_turn, check_budget, parse_design_response, History, HistoryItem, SessionStore,
    TokenEstimate,
};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TurnArgs {
    /// HTML page to edit
    pub page: PathBuf,

    /// Instruction-source response holding one or more design variations
    pub response: PathBuf,

    /// Instruction the response answers
    #[arg(short, long)]
    pub instruction: String,

    /// Root selector operations are scoped to
    #[arg(short, long)]
    pub root: Option<String>,

    /// Which variation to apply (0-based)
    #[arg(long, default_value_t = 0)]
    pub variation: usize,

    /// Page URL recorded in history (defaults to the page path)
    #[arg(long)]
    pub url: Option<String>,

    /// Screenshot stored with the session baseline
    #[arg(long)]
    pub screenshot: Option<String>,

    /// Output file (defaults to overwriting the page)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn turn(args: TurnArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let session_path = config.session_path(cwd);
    let history_path = config.history_path(cwd);

    let mut store = SessionStore::load(&session_path)?.with_max_sessions(config.max_sessions);
    let mut history = History::load(&history_path, config.history_limit)?;
    let mut dom = read_page(&args.page)?;

    let text = fs::read_to_string(&args.response)
        .with_context(|| format!("Cannot read {}", args.response.display()))?;
    let response = parse_design_response(&text)?;
    let count = response.variations.len();
    let variation = response
        .variations
        .into_iter()
        .nth(args.variation)
        .ok_or_else(|| anyhow!("Variation {} out of range ({} available)", args.variation, count))?;

    let session = store.active_session_mut()?;

    let mut estimate = TokenEstimate::for_session(session, &args.instruction);
    if let Some(prompt) = &config.custom_system_prompt {
        estimate.messages.push(prompt);
    }
    if config.send_screenshot && args.screenshot.is_some() && session.baseline.is_none() {
        estimate.attached_images += 1;
    }
    let tokens = check_budget(&estimate, config.max_tokens)?;

    println!(
        "{} {} ({}, ~{} tokens)",
        "🎨 Applying".bright_blue().bold(),
        variation.title.bright_white(),
        config.model_name,
        tokens
    );

    let mut request = variation.into_request(&args.instruction, args.root, response.usage);
    if config.send_screenshot {
        request.aux_snapshot = args.screenshot;
    }

    let url = args.url.unwrap_or_else(|| args.page.display().to_string());
    let session_name = session.name.clone();
    let turn = apply_turn(&mut dom, session, request)?;

    print_results(&turn.results);
    println!();
    print_summary(&turn.results);
    println!("  {} {}", "Session:".bright_white(), session_name);
    println!("  {} {}", "Summary:".bright_white(), turn.describe());
    if let Some(usage) = &turn.usage {
        println!(
            "  {} {} tokens (${:.4})",
            "Usage:".bright_white(),
            usage.total_token_count,
            usage.estimated_cost()
        );
    }

    let recorded = history.record(HistoryItem::from_turn(url, turn)).id.clone();
    println!("  {} {}", "History:".bright_white(), recorded);

    let written = write_page(&dom, &args.page, args.out.as_ref())?;
    store.save(&session_path)?;
    history.save(&history_path)?;

    println!();
    println!("{} Wrote {}", "✓".green(), written.display());
    Ok(())
}
