//! # Document Tree
//!
//! Arena-backed tree of markup nodes. Nodes are addressed by [`NodeId`]
//! handles; detached nodes stay in the arena but are unreachable from the
//! document until [`Dom::compact`] drops them.
//!
//! ```text
//! #document
//!   └─ html
//!        ├─ head
//!        └─ body   ← default content container
//! ```

use crate::error::DomError;
use crate::parser;
use crate::style::StyleDeclarations;
use tracing::trace;

/// Handle to a node inside a [`Dom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where inserted markup lands relative to existing children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Before the first child (`afterbegin`)
    AfterBegin,
    /// After the last child (`beforeend`)
    BeforeEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

/// Element payload. `style` is kept out of `attributes` and lives in
/// `styles` so property edits never re-parse attribute text.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub styles: StyleDeclarations,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            styles: StyleDeclarations::new(),
        }
    }

    /// Build from parsed attributes, lifting `style` into declarations
    pub fn from_parts(tag: impl Into<String>, attributes: Vec<(String, String)>) -> Self {
        let mut element = Self::new(tag);
        for (name, value) in attributes {
            if name == "style" {
                element.styles = StyleDeclarations::parse(&value);
            } else {
                element.attributes.push((name, value));
            }
        }
        element
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        if name == "style" {
            self.styles = StyleDeclarations::parse(&value.into());
            return;
        }
        match self.attributes.iter_mut().find(|(attr, _)| *attr == name) {
            Some((_, existing)) => *existing = value.into(),
            None => self.attributes.push((name, value.into())),
        }
    }

    /// Non-empty `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.attribute("id").filter(|id| !id.is_empty())
    }

    /// Whitespace-separated `class` tokens, in source order
    pub fn class_list(&self) -> Vec<&str> {
        self.attribute("class")
            .map(|classes| classes.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().contains(&class)
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Mutable markup document
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<NodeData>,
    document: NodeId,
}

impl Dom {
    /// Empty document (no `html` element)
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            document: NodeId(0),
        }
    }

    /// Parse a full page. `html`, `head` and `body` always exist afterwards.
    pub fn parse_document(html: &str) -> Result<Self, DomError> {
        let mut dom = Self::new();
        let nodes = parser::parse_fragment(&mut dom, html)?;
        for node in nodes {
            dom.append_child(dom.document, node);
        }
        dom.ensure_structure();
        trace!(nodes = dom.nodes.len(), "document parsed");
        Ok(dom)
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The `html` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.document).next()
    }

    pub fn head(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html).find(|&n| self.tag_name(n) == Some("head"))
    }

    /// The `body` element, the document's content container
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html).find(|&n| self.tag_name(n) == Some("body"))
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub(crate) fn kind_mut(&mut self, node: NodeId) -> &mut NodeKind {
        &mut self.nodes[node.0].kind
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Parent only if it is an element (stops at the document node)
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node).iter().copied().filter(|&c| self.is_element(c))
    }

    /// 1-based position among the parent's element children
    pub fn element_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.element_children(parent)
            .position(|c| c == node)
            .map(|i| i + 1)
    }

    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings: Vec<NodeId> = self.element_children(parent).collect();
        let index = siblings.iter().position(|&c| c == node)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// Whether `node` is still reachable from the document node
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.document {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Descendants in document order (pre-order), excluding `node`
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn text_content(&self, node: NodeId) -> String {
        match self.kind(node) {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Comment(_) | NodeKind::Doctype(_) => String::new(),
            _ => self
                .descendants(node)
                .into_iter()
                .filter_map(|n| match self.kind(n) {
                    NodeKind::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Arena size, detached nodes included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every node no longer reachable from the document and renumber
    /// the rest in document order. Handles taken before the call are
    /// invalid afterwards. Returns the number of nodes dropped.
    pub fn compact(&mut self) -> usize {
        let mut order = vec![self.document];
        order.extend(self.descendants(self.document));
        if order.len() == self.nodes.len() {
            return 0;
        }

        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        for (new, old) in order.iter().enumerate() {
            remap[old.0] = Some(NodeId(new));
        }

        let mut old_nodes: Vec<Option<NodeData>> = std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for old in &order {
            let Some(mut data) = old_nodes[old.0].take() else {
                continue;
            };
            data.parent = data.parent.and_then(|p| remap[p.0]);
            data.children = data.children.iter().filter_map(|c| remap[c.0]).collect();
            nodes.push(data);
        }

        let dropped = old_nodes.len() - nodes.len();
        self.nodes = nodes;
        self.document = NodeId(0);
        trace!(dropped, kept = self.nodes.len(), "arena compacted");
        dropped
    }

    /// Allocate a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create(NodeKind::Element(Element::new(tag)))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    /// Insert `child` at `index` (clamped), moving it out of any previous parent
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.unlink(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Remove a node from its parent
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.document {
            return Err(DomError::DocumentNode);
        }
        if self.parent(node).is_none() {
            return Err(DomError::Detached);
        }
        self.unlink(node);
        Ok(())
    }

    fn unlink(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Replace all children with parsed markup. On a parse error the
    /// existing children are left untouched.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), DomError> {
        self.check_container(node)?;
        let container = self.tag_name(node).map(str::to_string);
        let parsed = parser::parse_fragment_in(self, html, container)?;

        for child in self.children(node).to_vec() {
            self.unlink(child);
        }
        for child in parsed {
            self.append_child(node, child);
        }
        Ok(())
    }

    /// Insert parsed markup at the start or end of the children
    pub fn insert_html(&mut self, node: NodeId, position: Position, html: &str) -> Result<(), DomError> {
        self.check_container(node)?;
        let container = self.tag_name(node).map(str::to_string);
        let parsed = parser::parse_fragment_in(self, html, container)?;

        let mut index = match position {
            Position::AfterBegin => 0,
            Position::BeforeEnd => self.children(node).len(),
        };
        for child in parsed {
            self.insert_child(node, index, child);
            index += 1;
        }
        Ok(())
    }

    fn check_container(&self, node: NodeId) -> Result<(), DomError> {
        match self.kind(node) {
            NodeKind::Element(_) => Ok(()),
            NodeKind::Document => Err(DomError::DocumentNode),
            _ => Err(DomError::NotAnElement),
        }
    }

    /// Current value of an inline style property, empty when unset
    pub fn style(&self, node: NodeId, property: &str) -> String {
        self.element(node)
            .and_then(|e| e.styles.get(property))
            .unwrap_or_default()
            .to_string()
    }

    /// Set an inline style property; an empty value removes it
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let element = self.element_mut(node).ok_or(DomError::NotAnElement)?;
        element.styles.set(property, value);
        Ok(())
    }

    /// Make sure `html > head + body` exists, moving stray top-level
    /// content into `body`
    fn ensure_structure(&mut self) {
        let document = self.document;

        let html = match self.document_element() {
            Some(html) if self.tag_name(html) == Some("html") => html,
            _ => {
                let html = self.create_element("html");
                let stray: Vec<NodeId> = self
                    .children(document)
                    .iter()
                    .copied()
                    .filter(|&c| !matches!(self.kind(c), NodeKind::Doctype(_)))
                    .collect();
                self.append_child(document, html);
                for node in stray {
                    self.append_child(html, node);
                }
                html
            }
        };

        if self.head().is_none() {
            let head = self.create_element("head");
            self.insert_child(html, 0, head);
        }

        let body = match self.body() {
            Some(body) => body,
            None => {
                let body = self.create_element("body");
                self.append_child(html, body);
                body
            }
        };

        let stray: Vec<NodeId> = self
            .children(html)
            .iter()
            .copied()
            .filter(|&c| !matches!(self.tag_name(c), Some("head") | Some("body")))
            .filter(|&c| !self.is_blank_text(c))
            .collect();
        for node in stray {
            self.append_child(body, node);
        }
    }

    fn is_blank_text(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Text(text) if text.trim().is_empty())
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_builds_structure() {
        let dom = Dom::parse_document("<p>Hello</p>").unwrap();
        let html = dom.document_element().unwrap();
        assert_eq!(dom.tag_name(html), Some("html"));

        let body = dom.body().unwrap();
        assert_eq!(dom.inner_html(body), "<p>Hello</p>");
        assert!(dom.head().is_some());
    }

    #[test]
    fn test_full_document_is_kept() {
        let source = "<!DOCTYPE html><html><head><title>T</title></head><body><main id=\"app\"></main></body></html>";
        let dom = Dom::parse_document(source).unwrap();
        assert_eq!(dom.outer_html(dom.document()), source);
    }

    #[test]
    fn test_element_index_counts_elements_only() {
        let dom = Dom::parse_document("<body>text<b></b> <i></i></body>").unwrap();
        let body = dom.body().unwrap();
        let italic = dom.element_children(body).nth(1).unwrap();
        assert_eq!(dom.element_index(italic), Some(2));
    }

    #[test]
    fn test_detach_and_attached() {
        let mut dom = Dom::parse_document("<ul><li>a</li><li>b</li></ul>").unwrap();
        let body = dom.body().unwrap();
        let list = dom.element_children(body).next().unwrap();
        let first = dom.element_children(list).next().unwrap();

        dom.detach(first).unwrap();
        assert!(!dom.is_attached(first));
        assert_eq!(dom.inner_html(list), "<li>b</li>");
        assert_eq!(dom.detach(first), Err(DomError::Detached));
    }

    #[test]
    fn test_compact_drops_detached_nodes() {
        let mut dom = Dom::parse_document("<ul id=\"list\"><li>a</li><li>b</li></ul>").unwrap();
        let before = dom.outer_html(dom.document());
        dom.compact();
        let baseline = dom.node_count();
        assert_eq!(dom.compact(), 0);

        let list = dom.element_children(dom.body().unwrap()).next().unwrap();
        for _ in 0..10 {
            dom.set_inner_html(list, "<li>a</li><li>b</li>").unwrap();
        }
        let grown = dom.node_count();

        let dropped = dom.compact();
        assert!(dropped >= 40, "dropped {}", dropped);
        assert_eq!(dom.node_count(), grown - dropped);
        assert_eq!(dom.node_count(), baseline);
        assert_eq!(dom.outer_html(dom.document()), before);

        let list = dom.element_children(dom.body().unwrap()).next().unwrap();
        assert_eq!(dom.element(list).and_then(|e| e.id()), Some("list"));
        assert_eq!(dom.parent(list), dom.body());
        dom.set_inner_html(list, "<li>c</li>").unwrap();
        assert_eq!(dom.inner_html(list), "<li>c</li>");
    }

    #[test]
    fn test_set_inner_html_failure_keeps_children() {
        let mut dom = Dom::parse_document("<div><span>keep</span></div>").unwrap();
        let div = dom.element_children(dom.body().unwrap()).next().unwrap();

        let result = dom.set_inner_html(div, "<!-- broken");
        assert!(result.is_err());
        assert_eq!(dom.inner_html(div), "<span>keep</span>");
    }

    #[test]
    fn test_insert_html_positions() {
        let mut dom = Dom::parse_document("<ul><li>b</li></ul>").unwrap();
        let list = dom.element_children(dom.body().unwrap()).next().unwrap();

        dom.insert_html(list, Position::AfterBegin, "<li>a</li>").unwrap();
        dom.insert_html(list, Position::BeforeEnd, "<li>c</li>").unwrap();
        assert_eq!(dom.inner_html(list), "<li>a</li><li>b</li><li>c</li>");
    }

    #[test]
    fn test_styles() {
        let mut dom = Dom::parse_document("<div style=\"color:blue\"></div>").unwrap();
        let div = dom.element_children(dom.body().unwrap()).next().unwrap();

        assert_eq!(dom.style(div, "color"), "blue");
        assert_eq!(dom.style(div, "margin"), "");

        dom.set_style(div, "backgroundColor", "red").unwrap();
        assert_eq!(
            dom.outer_html(div),
            "<div style=\"color: blue; background-color: red;\"></div>"
        );
    }
}
