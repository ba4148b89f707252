//! # Document Tree Boundary
//!
//! Everything the engine needs from a live document, expressed as a trait so
//! the executor and reconciler can run against any tree that can resolve
//! selectors, serialize children and take structural edits.
//!
//! [`pagewright_dom::Dom`] is the in-tree implementation.

use std::fmt::Debug;

use pagewright_dom::{Dom, NodeId, Position};

use crate::errors::{EditorError, MutationError};

/// Selector meaning "the scope node itself"
pub const SCOPE_SENTINEL: &str = ":scope";

/// Whether `selector` addresses the scope node rather than a descendant
pub fn is_scope_sentinel(selector: &str) -> bool {
    let selector = selector.trim();
    selector.is_empty() || selector == SCOPE_SENTINEL
}

/// Where inserted children land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Start,
    End,
}

pub trait DocumentTree {
    type Node: Copy + Eq + Debug;

    /// Resolve `selector` among the descendants of `scope` (the whole
    /// document when `None`). The sentinel selector returns the scope
    /// itself, or the default root when there is no scope.
    fn resolve(&self, scope: Option<Self::Node>, selector: &str) -> Result<Option<Self::Node>, MutationError>;

    /// Content container used when a batch names no root (`body`)
    fn default_root(&self) -> Option<Self::Node>;

    /// Top-level element (`html`)
    fn document_element(&self) -> Option<Self::Node>;

    /// Parent element; `None` for the top-level element and detached nodes
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn tag_name(&self, node: Self::Node) -> Option<&str>;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    fn class_list(&self, node: Self::Node) -> Vec<&str>;

    /// 1-based position among the parent's element children
    fn element_index(&self, node: Self::Node) -> Option<usize>;

    fn serialize_children(&self, node: Self::Node) -> String;

    fn serialize_whole(&self, node: Self::Node) -> String;

    /// Whole-document capture used as a session baseline
    fn snapshot(&self) -> Result<String, EditorError>;

    fn set_children(&mut self, node: Self::Node, content: &str) -> Result<(), MutationError>;

    fn insert_children(
        &mut self,
        node: Self::Node,
        position: InsertPosition,
        content: &str,
    ) -> Result<(), MutationError>;

    /// Current inline value of `property`, empty when unset
    fn style(&self, node: Self::Node, property: &str) -> String;

    /// Set an inline style property; the empty string removes it
    fn set_style(&mut self, node: Self::Node, property: &str, value: &str) -> Result<(), MutationError>;

    fn detach(&mut self, node: Self::Node) -> Result<(), MutationError>;

    /// Release storage held by detached nodes. Node handles do not survive
    /// the call; selectors do.
    fn compact(&mut self) {}
}

impl DocumentTree for Dom {
    type Node = NodeId;

    fn resolve(&self, scope: Option<NodeId>, selector: &str) -> Result<Option<NodeId>, MutationError> {
        if is_scope_sentinel(selector) {
            return Ok(scope.or_else(|| self.body()));
        }
        Ok(self
            .query_selector(scope, selector)
            .map_err(pagewright_dom::DomError::from)?)
    }

    fn default_root(&self) -> Option<NodeId> {
        self.body()
    }

    fn document_element(&self) -> Option<NodeId> {
        Dom::document_element(self)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent_element(node)
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        Dom::tag_name(self, node)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|e| e.attribute(name))
    }

    fn class_list(&self, node: NodeId) -> Vec<&str> {
        self.element(node).map(|e| e.class_list()).unwrap_or_default()
    }

    fn element_index(&self, node: NodeId) -> Option<usize> {
        Dom::element_index(self, node)
    }

    fn serialize_children(&self, node: NodeId) -> String {
        self.inner_html(node)
    }

    fn serialize_whole(&self, node: NodeId) -> String {
        self.outer_html(node)
    }

    fn snapshot(&self) -> Result<String, EditorError> {
        if self.body().is_none() {
            return Err(EditorError::Capture("document has no body".to_string()));
        }
        Ok(self.outer_html(self.document()))
    }

    fn set_children(&mut self, node: NodeId, content: &str) -> Result<(), MutationError> {
        Ok(self.set_inner_html(node, content)?)
    }

    fn insert_children(
        &mut self,
        node: NodeId,
        position: InsertPosition,
        content: &str,
    ) -> Result<(), MutationError> {
        let position = match position {
            InsertPosition::Start => Position::AfterBegin,
            InsertPosition::End => Position::BeforeEnd,
        };
        Ok(self.insert_html(node, position, content)?)
    }

    fn style(&self, node: NodeId, property: &str) -> String {
        Dom::style(self, node, property)
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), MutationError> {
        Ok(Dom::set_style(self, node, property, value)?)
    }

    fn detach(&mut self, node: NodeId) -> Result<(), MutationError> {
        Ok(Dom::detach(self, node)?)
    }

    fn compact(&mut self) {
        Dom::compact(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        assert!(is_scope_sentinel(":scope"));
        assert!(is_scope_sentinel(""));
        assert!(is_scope_sentinel("  "));
        assert!(!is_scope_sentinel(":scope > p"));
    }

    #[test]
    fn test_resolve_sentinel_returns_scope() {
        let dom = Dom::parse_document("<main id=\"app\"><p>x</p></main>").unwrap();
        let main = dom.resolve(None, "#app").unwrap().unwrap();

        assert_eq!(dom.resolve(Some(main), ":scope").unwrap(), Some(main));
        assert_eq!(dom.resolve(None, "").unwrap(), dom.body());
    }

    #[test]
    fn test_invalid_selector_is_mutation_error() {
        let dom = Dom::parse_document("<p>x</p>").unwrap();
        let err = dom.resolve(None, "p:hover").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported pseudo-class :hover");
    }
}
