//! Nodes → markup
//!
//! Output is deterministic: attributes in source order, `style` last in
//! normalized form, no end tags for void elements.

use crate::escape::{escape_attribute, escape_text};
use crate::node::{Dom, NodeId, NodeKind};
use crate::parser::{is_raw_text, is_void};

impl Dom {
    /// Markup of the node's children (`innerHTML`)
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        let raw = self.tag_name(node).is_some_and(is_raw_text);
        for &child in self.children(node) {
            self.write_node(child, raw, &mut out);
        }
        out
    }

    /// Markup of the node itself (`outerHTML`); for the document node this
    /// is the whole page
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        match self.kind(node) {
            NodeKind::Document => {
                for &child in self.children(node) {
                    self.write_node(child, false, &mut out);
                }
            }
            _ => {
                let raw = self
                    .parent_element(node)
                    .and_then(|p| self.tag_name(p))
                    .is_some_and(is_raw_text);
                self.write_node(node, raw, &mut out);
            }
        }
        out
    }

    fn write_node(&self, node: NodeId, raw_parent: bool, out: &mut String) {
        match self.kind(node) {
            NodeKind::Document => {
                for &child in self.children(node) {
                    self.write_node(child, false, out);
                }
            }
            NodeKind::Doctype(name) => {
                out.push_str("<!");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            NodeKind::Text(text) => {
                if raw_parent {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        escape_attribute(value, out);
                        out.push('"');
                    }
                }
                if !element.styles.is_empty() {
                    out.push_str(" style=\"");
                    escape_attribute(&element.styles.to_css_text(), out);
                    out.push('"');
                }
                out.push('>');

                if is_void(&element.tag) {
                    return;
                }

                let raw = is_raw_text(&element.tag);
                for &child in self.children(node) {
                    self.write_node(child, raw, out);
                }

                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}
