use crate::config::Config;
use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use pagewright_editor::SessionStore;

#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// List sessions; the active one is marked
    List,

    /// Start a new session and make it active
    New,

    /// Delete a session
    Delete { id: String },

    /// Make a session active
    Switch { id: String },

    /// Forget the active session's baseline and turns
    Clear,
}

pub fn sessions(command: SessionsCommand, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let session_path = config.session_path(cwd);
    let mut store = SessionStore::load(&session_path)?.with_max_sessions(config.max_sessions);

    match command {
        SessionsCommand::List => {
            for session in store.sessions() {
                let marker = if session.id == store.active_session_id() {
                    "●".green()
                } else {
                    "○".dimmed()
                };
                println!(
                    "{} {} {} ({} turns)",
                    marker,
                    session.id.bright_white(),
                    session.name,
                    session.turns.len()
                );
            }
            return Ok(());
        }
        SessionsCommand::New => {
            let session = store.create_session()?;
            println!("{} Created {} ({})", "✓".green(), session.name, session.id);
        }
        SessionsCommand::Delete { id } => {
            store.delete_session(&id)?;
            println!("{} Deleted {}", "✓".green(), id);
        }
        SessionsCommand::Switch { id } => {
            store.switch_session(&id)?;
            println!("{} Switched to {}", "✓".green(), store.active_session()?.name);
        }
        SessionsCommand::Clear => {
            let session = store.active_session_mut()?;
            session.clear();
            println!("{} Cleared {}", "✓".green(), session.name);
        }
    }

    store.save(&session_path)?;
    Ok(())
}
