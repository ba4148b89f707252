//! # Session Store
//!
//! Holds the chat sessions and which one is active, persisted as JSON.
//! There is always at least one session.

use std::path::Path;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::EditorError;
use crate::reconciler::Session;

pub const DEFAULT_MAX_SESSIONS: usize = 6;

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStore {
    sessions: Vec<Session>,
    active_session_id: String,
    #[serde(skip, default = "default_max_sessions")]
    max_sessions: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        let first = Session::new(next_id(&[]), "Chat 1");
        Self {
            active_session_id: first.id.clone(),
            sessions: vec![first],
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn active_session_id(&self) -> &str {
        &self.active_session_id
    }

    pub fn active_session(&self) -> Result<&Session, EditorError> {
        self.session(&self.active_session_id)
    }

    pub fn active_session_mut(&mut self) -> Result<&mut Session, EditorError> {
        let id = self.active_session_id.clone();
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(EditorError::SessionNotFound(id))
    }

    pub fn session(&self, id: &str) -> Result<&Session, EditorError> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| EditorError::SessionNotFound(id.to_string()))
    }

    /// Add a session named `Chat N` and make it active
    pub fn create_session(&mut self) -> Result<&Session, EditorError> {
        if self.sessions.len() >= self.max_sessions {
            return Err(EditorError::SessionLimit(self.max_sessions));
        }

        let ids: Vec<&str> = self.sessions.iter().map(|s| s.id.as_str()).collect();
        let session = Session::new(next_id(&ids), format!("Chat {}", self.sessions.len() + 1));
        debug!(id = %session.id, name = %session.name, "session created");

        self.active_session_id = session.id.clone();
        self.sessions.push(session);
        Ok(&self.sessions[self.sessions.len() - 1])
    }

    /// Remove a session. The last one cannot be removed; deleting the
    /// active session activates the first remaining one.
    pub fn delete_session(&mut self, id: &str) -> Result<(), EditorError> {
        if self.sessions.len() <= 1 {
            return Err(EditorError::LastSession);
        }
        let position = self
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| EditorError::SessionNotFound(id.to_string()))?;

        self.sessions.remove(position);
        if self.active_session_id == id {
            self.active_session_id = self.sessions[0].id.clone();
        }
        debug!(id, active = %self.active_session_id, "session deleted");
        Ok(())
    }

    pub fn switch_session(&mut self, id: &str) -> Result<(), EditorError> {
        self.session(id)?;
        self.active_session_id = id.to_string();
        Ok(())
    }

    /// Read a store from disk; a missing file yields a fresh store
    pub fn load(path: &Path) -> Result<Self, EditorError> {
        let mut store: SessionStore = match load_json(path)? {
            Some(store) => store,
            None => return Ok(Self::new()),
        };

        if store.sessions.is_empty() {
            return Ok(Self::new());
        }
        if store.session(&store.active_session_id).is_err() {
            store.active_session_id = store.sessions[0].id.clone();
        }
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<(), EditorError> {
        save_json(path, self)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Millisecond timestamp id, bumped past any id already taken
fn next_id(taken: &[&str]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while taken.contains(&candidate.to_string().as_str()) {
        candidate += 1;
    }
    candidate.to_string()
}

pub(crate) fn load_json<V: DeserializeOwned>(path: &Path) -> Result<Option<V>, EditorError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

pub(crate) fn save_json<V: Serialize>(path: &Path, value: &V) -> Result<(), EditorError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store() {
        let store = SessionStore::new();
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.active_session().unwrap().name, "Chat 1");
    }

    #[test]
    fn test_create_until_limit() {
        let mut store = SessionStore::new().with_max_sessions(3);
        assert_eq!(store.create_session().unwrap().name, "Chat 2");
        let third = store.create_session().unwrap().id.clone();
        assert_eq!(store.active_session_id(), third);

        assert!(matches!(store.create_session(), Err(EditorError::SessionLimit(3))));

        let ids: Vec<&str> = store.sessions().iter().map(|s| s.id.as_str()).collect();
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn test_delete_rules() {
        let mut store = SessionStore::new();
        let first = store.active_session_id().to_string();
        assert!(matches!(store.delete_session(&first), Err(EditorError::LastSession)));

        let second = store.create_session().unwrap().id.clone();
        store.delete_session(&second).unwrap();
        assert_eq!(store.active_session_id(), first);

        assert!(matches!(
            store.delete_session("missing"),
            Err(EditorError::LastSession)
        ));
    }

    #[test]
    fn test_switch_requires_existing_session() {
        let mut store = SessionStore::new();
        let first = store.active_session_id().to_string();
        store.create_session().unwrap();

        store.switch_session(&first).unwrap();
        assert_eq!(store.active_session_id(), first);
        assert!(store.switch_session("nope").is_err());
    }
}
