//! # Turn Reconciliation
//!
//! A session is a linear history of turns against one baseline. Each turn's
//! operations describe the total desired change relative to that baseline,
//! so before applying a new turn the previous turn's inverse batch is run to
//! take the tree back to baseline. At most one turn's edits are in the tree
//! at any time.
//!
//! ```text
//! baseline ──T1──▶ S1
//!    ▲              │ inverse(T1)
//!    └──────────────┘
//! baseline ──T2──▶ S2          (never S1 + T2)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::budget::Usage;
use crate::errors::EditorError;
use crate::executor::apply_batch;
use crate::operation::{BatchOutcome, Operation, OperationResult};
use crate::tree::DocumentTree;

/// Document state captured before the first turn of a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub tree_snapshot: String,
    /// Companion capture such as a screenshot, opaque to the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux_snapshot: Option<String>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub forward_ops: Vec<Operation>,
    pub inverse_ops: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_selector: Option<String>,
    pub results: Vec<OperationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| !r.success)
    }

    /// One-line outcome for display
    pub fn describe(&self) -> String {
        let succeeded = self.results.iter().filter(|r| r.success).count();
        if self.has_errors() {
            format!(
                "Applied {}/{} changes. Some operations failed.",
                succeeded,
                self.forward_ops.len()
            )
        } else {
            self.summary
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Applied {} changes.", self.forward_ops.len()))
        }
    }
}

/// Input for [`apply_turn`]
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub instruction: String,
    pub summary: Option<String>,
    /// Cumulative operations relative to the baseline
    pub operations: Vec<Operation>,
    pub root_selector: Option<String>,
    pub usage: Option<Usage>,
    /// Stored with the baseline when this request starts the session
    pub aux_snapshot: Option<String>,
}

impl TurnRequest {
    pub fn new(instruction: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            instruction: instruction.into(),
            operations,
            ..Default::default()
        }
    }

    pub fn with_root(mut self, root_selector: impl Into<String>) -> Self {
        self.root_selector = Some(root_selector.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Baseline>,
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl Session {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            baseline: None,
            turns: Vec::new(),
        }
    }

    pub fn latest_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Forget the baseline and every turn; the tree is left as is
    pub fn clear(&mut self) {
        self.baseline = None;
        self.turns.clear();
    }

    /// Run a stored turn's inverse batch outside turn chaining
    pub fn undo_turn<T: DocumentTree>(&self, tree: &mut T, index: usize) -> Result<BatchOutcome, EditorError> {
        let turn = self.turns.get(index).ok_or(EditorError::TurnNotFound(index))?;
        Ok(apply_batch(tree, &turn.inverse_ops, turn.root_selector.as_deref()))
    }

    /// Run a stored turn's forward batch again and record the new results
    pub fn reapply_turn<T: DocumentTree>(&mut self, tree: &mut T, index: usize) -> Result<BatchOutcome, EditorError> {
        let turn = self.turns.get_mut(index).ok_or(EditorError::TurnNotFound(index))?;
        let outcome = apply_batch(tree, &turn.forward_ops, turn.root_selector.as_deref());
        turn.results = outcome.results.clone();
        Ok(outcome)
    }
}

/// Revert the most recent turn, apply `request`, and record it as the new
/// most recent turn.
///
/// The baseline is captured on the first call; a capture failure is
/// returned before the tree is touched. Failures while reverting are
/// tolerated per operation and do not stop the new batch.
#[instrument(skip(tree, session, request), fields(session = %session.id, turn = session.turns.len()))]
pub fn apply_turn<'s, T: DocumentTree>(
    tree: &mut T,
    session: &'s mut Session,
    request: TurnRequest,
) -> Result<&'s Turn, EditorError> {
    if session.baseline.is_none() {
        session.baseline = Some(Baseline {
            tree_snapshot: tree.snapshot()?,
            aux_snapshot: request.aux_snapshot.clone(),
            captured_at: Utc::now(),
        });
        info!("baseline captured");
    }

    if let Some(previous) = session.turns.last().filter(|t| !t.inverse_ops.is_empty()) {
        let reverted = apply_batch(tree, &previous.inverse_ops, previous.root_selector.as_deref());
        if reverted.has_errors() {
            warn!(
                failed = reverted.failures().count(),
                "previous turn did not fully revert"
            );
        }
    }

    let outcome = apply_batch(tree, &request.operations, request.root_selector.as_deref());

    let turn = Turn {
        instruction: request.instruction,
        summary: request.summary,
        forward_ops: request.operations,
        inverse_ops: outcome.inverse,
        root_selector: request.root_selector,
        results: outcome.results,
        usage: request.usage,
        created_at: Utc::now(),
    };

    let index = session.turns.len();
    session.turns.push(turn);
    Ok(&session.turns[index])
}
