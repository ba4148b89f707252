//! # Design History
//!
//! Every applied turn across sessions, newest first and capped. Items can be
//! re-applied or undone later against whatever page is loaded.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::budget::Usage;
use crate::errors::EditorError;
use crate::executor::apply_batch;
use crate::operation::{BatchOutcome, Operation, OperationResult};
use crate::reconciler::Turn;
use crate::store::{load_json, save_json};
use crate::tree::DocumentTree;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub operations: Vec<Operation>,
    pub undo_operations: Vec<Operation>,
    #[serde(default)]
    pub operation_results: Vec<OperationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl HistoryItem {
    pub fn from_turn(url: impl Into<String>, turn: &Turn) -> Self {
        Self {
            id: turn.created_at.timestamp_millis().to_string(),
            timestamp: turn.created_at,
            url: url.into(),
            instruction: turn.instruction.clone(),
            summary: turn.summary.clone(),
            operations: turn.forward_ops.clone(),
            undo_operations: turn.inverse_ops.clone(),
            operation_results: turn.results.clone(),
            root_selector: turn.root_selector.clone(),
            usage: turn.usage,
        }
    }

    pub fn host(&self) -> Option<&str> {
        host_of(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct History {
    items: Vec<HistoryItem>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Insert at the front, dropping the oldest items past the limit.
    /// An id already present is made unique.
    pub fn record(&mut self, mut item: HistoryItem) -> &HistoryItem {
        while self.get(&item.id).is_some() {
            item.id = bump_id(&item.id);
        }
        self.items.insert(0, item);
        self.items.truncate(self.limit);
        &self.items[0]
    }

    pub fn remove(&mut self, id: &str) -> Result<HistoryItem, EditorError> {
        let position = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| EditorError::HistoryNotFound(id.to_string()))?;
        Ok(self.items.remove(position))
    }

    /// Items recorded on pages of `host`
    pub fn for_host<'a>(&'a self, host: &'a str) -> impl Iterator<Item = &'a HistoryItem> + 'a {
        self.items
            .iter()
            .filter(move |item| item.host().is_some_and(|h| h.eq_ignore_ascii_case(host)))
    }

    /// Apply an item's operations again and store the new results
    pub fn reapply<T: DocumentTree>(&mut self, id: &str, tree: &mut T) -> Result<BatchOutcome, EditorError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| EditorError::HistoryNotFound(id.to_string()))?;
        let outcome = apply_batch(tree, &item.operations, item.root_selector.as_deref());
        item.operation_results = outcome.results.clone();
        Ok(outcome)
    }

    pub fn undo<T: DocumentTree>(&self, id: &str, tree: &mut T) -> Result<BatchOutcome, EditorError> {
        let item = self
            .get(id)
            .ok_or_else(|| EditorError::HistoryNotFound(id.to_string()))?;
        Ok(apply_batch(tree, &item.undo_operations, item.root_selector.as_deref()))
    }

    pub fn load(path: &Path, limit: usize) -> Result<Self, EditorError> {
        let mut items: Vec<HistoryItem> = load_json(path)?.unwrap_or_default();
        let limit = limit.max(1);
        items.truncate(limit);
        Ok(Self { items, limit })
    }

    pub fn save(&self, path: &Path) -> Result<(), EditorError> {
        save_json(path, &self.items)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

fn bump_id(id: &str) -> String {
    match id.parse::<i64>().ok().and_then(|n| n.checked_add(1)) {
        Some(next) => next.to_string(),
        None => format!("{}-1", id),
    }
}

/// Host part of an absolute URL
pub fn host_of(url: &str) -> Option<&str> {
    static HOST: OnceLock<Option<Regex>> = OnceLock::new();
    let re = HOST
        .get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://(?:[^@/?#]*@)?(\[[^\]]*\]|[^:/?#]+)").ok())
        .as_ref()?;
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|host| !host.is_empty())
}
