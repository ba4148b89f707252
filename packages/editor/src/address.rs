//! # Address Synthesis
//!
//! Builds a selector that resolves back to a given node in an unmodified
//! tree. Priority order:
//!
//! 1. `#id` when the node has an id; ids are treated as document-unique.
//! 2. `body` for the content container.
//! 3. Tag name plus every class token, each escaped. Tokens containing `:`
//!    are state variants (`hover:bg-red`) and are left out.
//! 4. Unless the parent is the top-level element, the candidate is
//!    qualified as `<parent> > <candidate>:nth-child(k)` where `<parent>`
//!    is the parent's `#id` or tag name.
//!
//! A tag-name parent reference can be ambiguous (`article > h2:nth-child(1)`
//! matches the heading of every article). When the result does not resolve
//! back to the node, a structural path anchored at the top-level element or
//! the nearest ancestor with an id is returned instead.
//!
//! Addresses are not stable across structural edits to ancestors; callers
//! re-synthesize after such edits.

use pagewright_dom::css_escape;

use crate::tree::DocumentTree;

const CONTENT_CONTAINER: &str = "body";

pub fn synthesize<T: DocumentTree>(tree: &T, node: T::Node) -> String {
    if let Some(id) = id_reference(tree, node) {
        return id;
    }

    if tree.default_root() == Some(node) {
        return CONTENT_CONTAINER.to_string();
    }

    let mut candidate = tag(tree, node);
    for class in tree.class_list(node) {
        if class.contains(':') {
            continue;
        }
        candidate.push('.');
        candidate.push_str(&css_escape(class));
    }

    let Some(parent) = tree.parent(node) else {
        return candidate;
    };
    if tree.document_element() == Some(parent) {
        return candidate;
    }

    let parent_reference = id_reference(tree, parent).unwrap_or_else(|| tag(tree, parent));
    let position = tree.element_index(node).unwrap_or(1);
    let selector = format!("{} > {}:nth-child({})", parent_reference, candidate, position);

    match tree.resolve(None, &selector) {
        Ok(Some(found)) if found == node => selector,
        _ => structural_path(tree, node),
    }
}

/// `html > body:nth-child(2) > ... > tag:nth-child(k)`, cut short at the
/// first ancestor with an id
fn structural_path<T: DocumentTree>(tree: &T, node: T::Node) -> String {
    let mut steps = Vec::new();
    let mut current = node;

    loop {
        if let Some(id) = id_reference(tree, current) {
            steps.push(id);
            break;
        }
        match tree.parent(current) {
            Some(parent) => {
                let position = tree.element_index(current).unwrap_or(1);
                steps.push(format!("{}:nth-child({})", tag(tree, current), position));
                current = parent;
            }
            None => {
                steps.push(tag(tree, current));
                break;
            }
        }
    }

    steps.reverse();
    steps.join(" > ")
}

fn tag<T: DocumentTree>(tree: &T, node: T::Node) -> String {
    tree.tag_name(node).unwrap_or("*").to_ascii_lowercase()
}

fn id_reference<T: DocumentTree>(tree: &T, node: T::Node) -> Option<String> {
    tree.attribute(node, "id")
        .filter(|id| !id.is_empty())
        .map(|id| format!("#{}", css_escape(id)))
}
