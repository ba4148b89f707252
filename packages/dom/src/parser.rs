//! Markup → nodes
//!
//! A forgiving tree builder over [`MarkupToken`]s: unmatched end tags are
//! dropped, unclosed elements are closed at the end of input, void elements
//! never take children. It is not an HTML5 tree-construction algorithm.

use logos::Logos;

use crate::error::{ParseError, ParseResult};
use crate::escape::decode_entities;
use crate::lexer::{end_tag_name, lex_start_tag, MarkupToken};
use crate::node::{Dom, Element, NodeId, NodeKind};

/// Elements that never have children or an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content runs verbatim up to the matching end tag
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Like raw text, but character references are decoded
pub const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Content is serialized without escaping
pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

fn is_text_only(tag: &str) -> bool {
    is_raw_text(tag) || ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&tag)
}

fn text_content_for(tag: &str, raw: &str) -> String {
    if is_raw_text(tag) {
        raw.to_string()
    } else {
        decode_entities(raw).into_owned()
    }
}

/// Parse markup into detached top-level nodes owned by `dom`
pub fn parse_fragment(dom: &mut Dom, source: &str) -> ParseResult<Vec<NodeId>> {
    parse_fragment_in(dom, source, None)
}

/// Parse markup destined for a container element. Text-only containers
/// (`<style>`, `<script>`, `<textarea>`, `<title>`) receive their content as
/// a single text node.
pub fn parse_fragment_in(
    dom: &mut Dom,
    source: &str,
    container: Option<String>,
) -> ParseResult<Vec<NodeId>> {
    if let Some(tag) = container.as_deref().filter(|tag| is_text_only(tag)) {
        if source.is_empty() {
            return Ok(Vec::new());
        }
        return Ok(vec![dom.create(NodeKind::Text(text_content_for(tag, source)))]);
    }

    let mut builder = TreeBuilder::new(dom);
    let mut lexer = MarkupToken::lexer(source);

    while let Some(token) = lexer.next() {
        let span = lexer.span();
        let token = token.map_err(|_| match lexer.slice() {
            s if s.starts_with("<!--") => ParseError::UnterminatedComment { pos: span.start },
            _ => ParseError::lexer_error(span.start),
        })?;

        match token {
            MarkupToken::Text(text) => builder.text(&decode_entities(text)),
            MarkupToken::Lt => builder.text("<"),
            MarkupToken::Comment(body) => builder.leaf(NodeKind::Comment(body.to_string())),
            MarkupToken::Doctype(raw) => {
                let name = raw[2..raw.len() - 1].trim().to_string();
                builder.leaf(NodeKind::Doctype(name));
            }
            MarkupToken::EndTag(raw) => builder.close(&end_tag_name(raw)),
            MarkupToken::StartTag(raw) => {
                let tag = lex_start_tag(raw, span.start)?;
                let name = tag.name.clone();
                let void = is_void(&name) || tag.self_closing;
                let element = builder.open(Element::from_parts(tag.name, tag.attributes), void);

                if is_text_only(&name) && !void {
                    let rest = lexer.remainder();
                    let end = find_raw_text_end(rest, &name).ok_or_else(|| {
                        ParseError::UnterminatedRawText {
                            pos: span.start,
                            tag: name.clone(),
                        }
                    })?;
                    if end > 0 {
                        let content = text_content_for(&name, &rest[..end]);
                        let text = builder.dom.create(NodeKind::Text(content));
                        builder.dom.append_child(element, text);
                    }
                    // skip content and the end tag itself
                    let close_len = rest[end..].find('>').map(|i| i + 1).unwrap_or(rest.len() - end);
                    lexer.bump(end + close_len);
                    builder.close(&name);
                }
            }
        }
    }

    Ok(builder.finish())
}

/// Byte offset of `</tag` (case-insensitive) in `rest`
fn find_raw_text_end(rest: &str, tag: &str) -> Option<usize> {
    let needle = format!("</{}", tag);
    let lowered = rest.to_ascii_lowercase();
    let mut from = 0;
    while let Some(found) = lowered[from..].find(&needle) {
        let at = from + found;
        let after = lowered.as_bytes().get(at + needle.len());
        if matches!(after, Some(b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'/')) {
            return Some(at);
        }
        from = at + needle.len();
    }
    None
}

struct TreeBuilder<'a> {
    dom: &'a mut Dom,
    roots: Vec<NodeId>,
    open: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(dom: &'a mut Dom) -> Self {
        Self {
            dom,
            roots: Vec::new(),
            open: Vec::new(),
        }
    }

    fn attach(&mut self, node: NodeId) {
        match self.open.last() {
            Some(&parent) => self.dom.append_child(parent, node),
            None => self.roots.push(node),
        }
    }

    fn siblings(&self) -> &[NodeId] {
        match self.open.last() {
            Some(&parent) => self.dom.children(parent),
            None => &self.roots,
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.siblings().last() {
            if let NodeKind::Text(existing) = self.dom.kind_mut(last) {
                existing.push_str(text);
                return;
            }
        }
        let node = self.dom.create(NodeKind::Text(text.to_string()));
        self.attach(node);
    }

    fn leaf(&mut self, kind: NodeKind) {
        let node = self.dom.create(kind);
        self.attach(node);
    }

    fn open(&mut self, element: Element, void: bool) -> NodeId {
        if let Some(&current) = self.open.last() {
            if closes_implicitly(self.dom.tag_name(current), &element.tag) {
                self.open.pop();
            }
        }

        let node = self.dom.create(NodeKind::Element(element));
        self.attach(node);
        if !void {
            self.open.push(node);
        }
        node
    }

    fn close(&mut self, tag: &str) {
        let position = self
            .open
            .iter()
            .rposition(|&n| self.dom.tag_name(n) == Some(tag));
        if let Some(position) = position {
            self.open.truncate(position);
        }
    }

    fn finish(self) -> Vec<NodeId> {
        self.roots
    }
}

/// `<p>` and `<li>` close an open sibling of the same kind
fn closes_implicitly(open: Option<&str>, incoming: &str) -> bool {
    matches!(
        (open, incoming),
        (Some("p"), "p") | (Some("li"), "li") | (Some("option"), "option")
    )
}
