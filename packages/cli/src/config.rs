use pagewright_editor::{DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_SESSIONS, DEFAULT_MAX_TOKENS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "pagewright.config.json";

/// Pagewright configuration file format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Model the instruction source runs against
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Extra system prompt forwarded with each instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_system_prompt: Option<String>,

    /// Attach a screenshot of the page to each instruction
    #[serde(default)]
    pub send_screenshot: bool,

    /// Only list history for the page's host
    #[serde(default = "default_true")]
    pub filter_by_domain: bool,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Estimated tokens allowed per instruction
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Session store, relative to the config directory
    #[serde(default = "default_session_file")]
    pub session_file: String,

    /// Design history, relative to the config directory
    #[serde(default = "default_history_file")]
    pub history_file: String,
}

fn default_model_name() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

fn default_max_tokens() -> u64 {
    DEFAULT_MAX_TOKENS
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_session_file() -> String {
    ".pagewright/sessions.json".to_string()
}

fn default_history_file() -> String {
    ".pagewright/history.json".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn session_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.session_file)
    }

    pub fn history_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.history_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            custom_system_prompt: None,
            send_screenshot: false,
            filter_by_domain: true,
            max_sessions: default_max_sessions(),
            max_tokens: default_max_tokens(),
            history_limit: default_history_limit(),
            session_file: default_session_file(),
            history_file: default_history_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "modelName": "gemini-2.5-pro",
            "customSystemPrompt": "Prefer muted colors",
            "maxSessions": 3,
            "maxTokens": 200000,
            "sessionFile": "state/sessions.json"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.model_name, "gemini-2.5-pro");
        assert_eq!(config.custom_system_prompt.as_deref(), Some("Prefer muted colors"));
        assert_eq!(config.max_sessions, 3);
        assert_eq!(config.max_tokens, 200_000);
        assert_eq!(config.session_file, "state/sessions.json");
        assert_eq!(config.history_file, ".pagewright/history.json");
        assert!(config.filter_by_domain);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model_name, "gemini-3-flash-preview");
        assert!(!config.send_screenshot);
        assert_eq!(config.max_sessions, 6);
        assert_eq!(config.max_tokens, 1_000_000);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_paths_are_relative_to_config_dir() {
        let config = Config::default();
        assert_eq!(
            config.session_path("/work"),
            PathBuf::from("/work/.pagewright/sessions.json")
        );
        assert_eq!(
            config.history_path("/work"),
            PathBuf::from("/work/.pagewright/history.json")
        );
    }
}
