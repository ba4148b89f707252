//! # Pagewright Editor
//!
//! Mutation and undo engine for live documents edited by an instruction
//! source.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ address: node → selector                    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ executor: batch of operations → tree        │
//! │  - Resolve each selector within a root      │
//! │  - Capture the inverse before applying      │
//! │  - Record failures, keep going              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ reconciler: turns against one baseline      │
//! │  - Revert previous turn, apply next         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Selectors, not references**: every operation resolves afresh
//! 2. **Failures are data**: a batch never aborts on one bad operation
//! 3. **Cumulative turns**: each turn describes the whole change from baseline
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagewright_dom::Dom;
//! use pagewright_editor::{apply_turn, Operation, Session, TurnRequest};
//!
//! let mut dom = Dom::parse_document(&html)?;
//! let mut session = Session::new("1", "Chat 1");
//!
//! let request = TurnRequest::new(
//!     "make the heading red",
//!     vec![Operation::set_style("h1", [("color", "red")])],
//! );
//! let turn = apply_turn(&mut dom, &mut session, request)?;
//!
//! // Undo outside turn chaining
//! session.undo_turn(&mut dom, 0)?;
//! ```

mod address;
mod budget;
mod errors;
mod executor;
mod history;
mod instruction;
mod operation;
mod queue;
mod reconciler;
mod store;
mod tree;

pub use address::synthesize;
pub use budget::{check_budget, estimate_tokens, TokenEstimate, Usage, DEFAULT_MAX_TOKENS, TOKENS_PER_IMAGE};
pub use errors::{EditorError, MutationError};
pub use executor::{apply_batch, ROOT_NOT_FOUND};
pub use history::{host_of, History, HistoryItem, DEFAULT_HISTORY_LIMIT};
pub use instruction::{parse_design_response, DesignResponse, Variation};
pub use operation::{Action, Batch, BatchOutcome, Mutation, Operation, OperationResult};
pub use queue::TurnQueue;
pub use reconciler::{apply_turn, Baseline, Session, Turn, TurnRequest};
pub use store::{SessionStore, DEFAULT_MAX_SESSIONS};
pub use tree::{is_scope_sentinel, DocumentTree, InsertPosition, SCOPE_SENTINEL};
