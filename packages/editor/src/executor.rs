//! # Mutation Executor
//!
//! Applies an ordered batch of [`Operation`]s to a tree. Each operation is
//! resolved, its inverse captured, then applied; a failure is recorded in
//! the results and the batch moves on. Only a missing root fails the whole
//! batch.
//!
//! Inverses are prepended as they are produced, so the inverse batch plays
//! back newest-first.

use tracing::{debug, info, instrument, warn};

use crate::address::synthesize;
use crate::errors::MutationError;
use crate::operation::{BatchOutcome, Mutation, Operation, OperationResult};
use crate::tree::{DocumentTree, InsertPosition, SCOPE_SENTINEL};

pub const ROOT_NOT_FOUND: &str = "Root element not found";

/// Resolution context shared by every operation of a batch
struct Scope<N> {
    root: Option<N>,
    /// A root selector was given; no whole-document fallback
    explicit: bool,
}

impl<N: Copy + Eq> Scope<N> {
    fn resolve<T>(&self, tree: &T, selector: &str) -> Result<Option<N>, MutationError>
    where
        T: DocumentTree<Node = N>,
    {
        if let Some(found) = tree.resolve(self.root, selector)? {
            return Ok(Some(found));
        }
        if self.explicit || self.root.is_none() {
            return Ok(None);
        }
        tree.resolve(None, selector)
    }
}

/// Apply `operations` scoped to `root_selector` (the content container when
/// `None` or empty).
#[instrument(skip(tree, operations), fields(operations = operations.len()))]
pub fn apply_batch<T: DocumentTree>(
    tree: &mut T,
    operations: &[Operation],
    root_selector: Option<&str>,
) -> BatchOutcome {
    let root_selector = root_selector.filter(|s| !s.trim().is_empty());

    let scope = match root_selector {
        Some(selector) => match tree.resolve(None, selector) {
            Ok(Some(root)) => Scope {
                root: Some(root),
                explicit: true,
            },
            Ok(None) => return root_failure(selector, ROOT_NOT_FOUND),
            Err(err) => return root_failure(selector, &err.to_string()),
        },
        None => Scope {
            root: tree.default_root(),
            explicit: false,
        },
    };

    let mut outcome = BatchOutcome::default();

    for operation in operations {
        debug!(selector = %operation.selector, action = %operation.action, "applying operation");

        match apply_operation(tree, operation, &scope) {
            Ok(inverse) => {
                outcome.inverse.insert(0, inverse);
                outcome.results.push(OperationResult::ok(&operation.selector));
            }
            Err(err) => {
                warn!(selector = %operation.selector, error = %err, "operation failed");
                outcome
                    .results
                    .push(OperationResult::failed(&operation.selector, err.to_string()));
            }
        }
    }

    info!(
        succeeded = outcome.succeeded(),
        failed = outcome.results.len() - outcome.succeeded(),
        "batch applied"
    );

    outcome
}

fn root_failure(selector: &str, error: &str) -> BatchOutcome {
    warn!(root = selector, error, "batch root did not resolve");
    BatchOutcome {
        results: vec![OperationResult::failed(selector, error)],
        inverse: Vec::new(),
    }
}

/// Resolve, capture the inverse, apply. Returns the inverse.
fn apply_operation<T: DocumentTree>(
    tree: &mut T,
    operation: &Operation,
    scope: &Scope<T::Node>,
) -> Result<Operation, MutationError> {
    let mutation = operation.to_mutation()?;
    let target = scope
        .resolve(tree, &operation.selector)?
        .ok_or(MutationError::NotFound)?;

    let inverse = capture_inverse(tree, operation, mutation, target, scope)?;

    match mutation {
        Mutation::Replace { content } => tree.set_children(target, content)?,
        Mutation::Append { content } => tree.insert_children(target, InsertPosition::End, content)?,
        Mutation::Prepend { content } => tree.insert_children(target, InsertPosition::Start, content)?,
        Mutation::SetStyle { styles } => {
            for (property, value) in styles {
                tree.set_style(target, property, value)?;
            }
        }
        Mutation::Remove => tree.detach(target)?,
    }

    Ok(inverse)
}

fn capture_inverse<T: DocumentTree>(
    tree: &T,
    operation: &Operation,
    mutation: Mutation<'_>,
    target: T::Node,
    scope: &Scope<T::Node>,
) -> Result<Operation, MutationError> {
    match mutation {
        Mutation::Replace { .. } | Mutation::Append { .. } | Mutation::Prepend { .. } => Ok(
            Operation::replace(&operation.selector, tree.serialize_children(target)),
        ),
        Mutation::SetStyle { styles } => Ok(Operation::set_style(
            &operation.selector,
            styles
                .keys()
                .map(|property| (property.clone(), tree.style(target, property))),
        )),
        Mutation::Remove => {
            let parent = tree.parent(target).ok_or(MutationError::NoParent)?;
            let selector = parent_address(tree, &operation.selector, parent, scope)?;
            Ok(Operation::replace(selector, tree.serialize_children(parent)))
        }
    }
}

/// Address for the parent of a node about to be removed: its id, the
/// scope sentinel, the forward selector minus its last child step, or a
/// synthesized address, whichever applies first.
fn parent_address<T: DocumentTree>(
    tree: &T,
    selector: &str,
    parent: T::Node,
    scope: &Scope<T::Node>,
) -> Result<String, MutationError> {
    if let Some(id) = tree.attribute(parent, "id").filter(|id| !id.is_empty()) {
        return Ok(format!("#{}", pagewright_dom::css_escape(id)));
    }

    if scope.root == Some(parent) {
        return Ok(SCOPE_SENTINEL.to_string());
    }

    if let Some((prefix, _)) = selector.rsplit_once('>') {
        let prefix = prefix.trim();
        if !prefix.is_empty() && matches!(scope.resolve(tree, prefix), Ok(Some(found)) if found == parent) {
            return Ok(prefix.to_string());
        }
    }

    Ok(synthesize(tree, parent))
}
