//! Executor properties against real markup
//!
//! This tests:
//! - Inverse correctness per action
//! - Re-apply behavior (replace/setStyle settle, append/prepend stack up)
//! - Partial failure isolation
//! - Address synthesis resolving back to the original node

use pagewright_dom::Dom;
use pagewright_editor::{apply_batch, synthesize, DocumentTree, Operation, OperationResult};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Store</title></head>
<body>
  <nav id="top"><a href="/">Home</a><a href="/shop">Shop</a></nav>
  <main class="container mx-auto">
    <section class="grid md:grid-cols-2 w-1/2">
      <article class="card"><h2>Apples</h2><p>Crisp</p></article>
      <article class="card"><h2>Pears</h2><p>Sweet</p></article>
      <article class="card featured [&amp;>p]:italic"><h2>Plums</h2><p>Tart</p></article>
    </section>
    <aside style="color: blue; padding: 4px">Sale</aside>
  </main>
</body>
</html>"#;

fn page() -> Dom {
    Dom::parse_document(PAGE).unwrap()
}

fn children(dom: &Dom, selector: &str) -> String {
    let node = dom.query_selector(None, selector).unwrap().unwrap();
    dom.inner_html(node)
}

#[test]
fn test_inverse_restores_each_action() {
    let forward = [
        Operation::replace("nav", "<span>gone</span>"),
        Operation::append("section.grid", "<article class=\"card\"><h2>Figs</h2></article>"),
        Operation::prepend("section.grid", "<p>Fresh today</p>"),
        Operation::set_style("aside", [("color", "red"), ("fontWeight", "bold")]),
        Operation::remove("article.featured"),
    ];

    for operation in forward {
        let mut dom = page();
        let before = dom.outer_html(dom.document());

        let outcome = apply_batch(&mut dom, std::slice::from_ref(&operation), None);
        assert_eq!(outcome.results, vec![OperationResult::ok(&operation.selector)]);
        assert_ne!(dom.outer_html(dom.document()), before, "{:?} changed nothing", operation.action);

        let undo = apply_batch(&mut dom, &outcome.inverse, None);
        assert!(!undo.has_errors(), "{:?}: {:?}", operation.action, undo.results);
        assert_eq!(dom.outer_html(dom.document()), before, "{:?} did not restore", operation.action);
    }
}

#[test]
fn test_inverse_batch_plays_back_newest_first() {
    let mut dom = page();
    let before = dom.outer_html(dom.document());

    let outcome = apply_batch(
        &mut dom,
        &[
            Operation::append("article.featured", "<em>new</em>"),
            Operation::remove("article.featured"),
            Operation::replace("#top", "x"),
        ],
        None,
    );
    assert!(!outcome.has_errors());
    assert_eq!(outcome.inverse.len(), 3);
    assert_eq!(outcome.inverse[0].selector, "#top");

    apply_batch(&mut dom, &outcome.inverse, None);
    assert_eq!(dom.outer_html(dom.document()), before);
}

#[test]
fn test_reapply_replace_and_set_style_is_stable() {
    let mut dom = page();
    let batch = [
        Operation::replace("#top", "<a href=\"/\">Start</a>"),
        Operation::set_style("aside", [("color", "green")]),
    ];

    apply_batch(&mut dom, &batch, None);
    let once = dom.outer_html(dom.document());
    apply_batch(&mut dom, &batch, None);
    assert_eq!(dom.outer_html(dom.document()), once);
}

#[test]
fn test_reapply_append_doubles_content() {
    let mut dom = page();
    let batch = [Operation::append("#top", "<a href=\"/cart\">Cart</a>")];

    apply_batch(&mut dom, &batch, None);
    apply_batch(&mut dom, &batch, None);

    assert_eq!(
        children(&dom, "#top"),
        "<a href=\"/\">Home</a><a href=\"/shop\">Shop</a><a href=\"/cart\">Cart</a><a href=\"/cart\">Cart</a>"
    );
}

#[test]
fn test_partial_failure_isolation() {
    let mut dom = page();
    let outcome = apply_batch(
        &mut dom,
        &[
            Operation::replace("#top", "one"),
            Operation::replace("#does-not-exist", "two"),
            Operation::set_style("aside", [("color", "red")]),
        ],
        None,
    );

    assert_eq!(
        outcome.results,
        vec![
            OperationResult::ok("#top"),
            OperationResult::failed("#does-not-exist", "Element not found"),
            OperationResult::ok("aside"),
        ]
    );
    assert_eq!(
        outcome.inverse,
        vec![
            Operation::set_style("aside", [("color", "blue")]),
            Operation::replace("#top", "<a href=\"/\">Home</a><a href=\"/shop\">Shop</a>"),
        ]
    );
}

#[test]
fn test_scope_set_style_scenario() {
    let mut dom = Dom::parse_document("<div id=\"card\" style=\"color: blue\">x</div>").unwrap();
    let root = Some("#card");

    let outcome = apply_batch(
        &mut dom,
        &[Operation::set_style(":scope", [("color", "red")])],
        root,
    );
    assert_eq!(outcome.results, vec![OperationResult::ok(":scope")]);
    assert_eq!(
        outcome.inverse,
        vec![Operation::set_style(":scope", [("color", "blue")])]
    );

    let card = dom.query_selector(None, "#card").unwrap().unwrap();
    assert_eq!(dom.style(card, "color"), "red");

    apply_batch(&mut dom, &outcome.inverse, root);
    assert_eq!(dom.style(card, "color"), "blue");
}

#[test]
fn test_synthesized_addresses_resolve_back() {
    let dom = page();
    let body = dom.body().unwrap();

    for node in dom.descendants(body) {
        if !dom.is_element(node) {
            continue;
        }
        // sibling articles share tag and classes; only the position tells them apart
        let selector = synthesize(&dom, node);
        let resolved = dom.resolve(None, &selector).unwrap();
        assert_eq!(resolved, Some(node), "{} resolved elsewhere", selector);
    }
}

#[test]
fn test_escaped_class_address() {
    let dom = page();
    let section = dom.query_selector(None, "section").unwrap().unwrap();
    assert_eq!(
        synthesize(&dom, section),
        "main > section.grid.w-1\\/2:nth-child(1)"
    );

    let featured = dom.query_selector(None, ".featured").unwrap().unwrap();
    assert_eq!(
        synthesize(&dom, featured),
        "section > article.card.featured:nth-child(3)"
    );
}
