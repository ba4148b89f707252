//! # Turn Queue
//!
//! Turns must not overlap: the revert of one turn and the apply of the next
//! would interleave and break baseline reconciliation. [`TurnQueue`] owns
//! the tree and the session store behind an async mutex and runs each
//! submitted turn to completion while holding it. Storage freed by the
//! turn's edits is reclaimed before the lock is released.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::EditorError;
use crate::reconciler::{apply_turn, Turn, TurnRequest};
use crate::store::SessionStore;
use crate::tree::DocumentTree;

struct QueueState<T> {
    tree: T,
    store: SessionStore,
}

/// Clonable handle; every clone feeds the same queue
pub struct TurnQueue<T> {
    state: Arc<Mutex<QueueState<T>>>,
}

impl<T> Clone for TurnQueue<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: DocumentTree> TurnQueue<T> {
    pub fn new(tree: T, store: SessionStore) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState { tree, store })),
        }
    }

    /// Apply a turn to the active session once every earlier submission
    /// has settled
    pub async fn submit(&self, request: TurnRequest) -> Result<Turn, EditorError> {
        let mut state = self.state.lock().await;
        let QueueState { tree, store } = &mut *state;

        let session = store.active_session_mut()?;
        debug!(session = %session.id, instruction = %request.instruction, "turn dequeued");
        let turn = apply_turn(tree, session, request)?.clone();
        tree.compact();
        Ok(turn)
    }

    /// Run `f` with exclusive access to the tree and store
    pub async fn with_state<R>(&self, f: impl FnOnce(&mut T, &mut SessionStore) -> R) -> R {
        let mut state = self.state.lock().await;
        let QueueState { tree, store } = &mut *state;
        f(tree, store)
    }
}
