//! Integration tests for editor crate

use pagewright_dom::Dom;
use pagewright_editor::{
    apply_batch, apply_turn, check_budget, parse_design_response, EditorError, History, HistoryItem,
    Operation, Session, SessionStore, TokenEstimate, TurnQueue, TurnRequest,
};

const LANDING: &str = r#"<html><head><title>Landing</title></head><body><header id="hero" style="background: white"><h1>Build faster</h1><p class="tagline">Ship today</p></header><section id="features"><div class="feature">Fast</div><div class="feature">Safe</div></section></body></html>"#;

fn landing() -> Dom {
    Dom::parse_document(LANDING).unwrap()
}

fn whole(dom: &Dom) -> String {
    dom.outer_html(dom.document())
}

fn turn_one() -> Vec<Operation> {
    vec![
        Operation::set_style("#hero", [("background", "black"), ("color", "white")]),
        Operation::replace("#hero h1", "Build <em>much</em> faster"),
        Operation::remove("#features > .feature:nth-child(2)"),
    ]
}

fn turn_two() -> Vec<Operation> {
    vec![
        Operation::set_style("#hero", [("background", "navy")]),
        Operation::append("#features", "<div class=\"feature\">Friendly</div>"),
    ]
}

#[test]
fn test_turn_chaining_matches_direct_application() {
    let mut chained = landing();
    let mut session = Session::new("s1", "Chat 1");

    apply_turn(&mut chained, &mut session, TurnRequest::new("dark hero", turn_one())).unwrap();
    apply_turn(&mut chained, &mut session, TurnRequest::new("navy instead", turn_two())).unwrap();

    let mut direct = landing();
    let outcome = apply_batch(&mut direct, &turn_two(), None);
    assert!(!outcome.has_errors());

    assert_eq!(whole(&chained), whole(&direct));
    assert_eq!(session.turns.len(), 2);
}

#[test]
fn test_turns_scoped_to_a_root() {
    let mut dom = landing();
    let mut session = Session::new("s1", "Chat 1");

    let first = TurnRequest::new("tag it", vec![Operation::set_style(":scope", [("color", "red")])]).with_root("#features");
    apply_turn(&mut dom, &mut session, first).unwrap();

    let second = TurnRequest::new("only text", vec![Operation::replace(".feature", "Quick")]).with_root("#features");
    let turn = apply_turn(&mut dom, &mut session, second).unwrap();
    assert!(!turn.has_errors());

    let features = dom.query_selector(None, "#features").unwrap().unwrap();
    assert_eq!(dom.style(features, "color"), "");
    assert_eq!(
        dom.outer_html(features),
        "<section id=\"features\"><div class=\"feature\">Quick</div><div class=\"feature\">Safe</div></section>"
    );
}

#[test]
fn test_revert_failures_do_not_block_new_turn() {
    let mut dom = landing();
    let mut session = Session::new("s1", "Chat 1");

    apply_turn(
        &mut dom,
        &mut session,
        TurnRequest::new("tagline", vec![Operation::replace(".tagline", "Ship now")]),
    )
    .unwrap();

    // someone else removed the node the previous turn edited
    let tagline = dom.query_selector(None, ".tagline").unwrap().unwrap();
    dom.detach(tagline).unwrap();

    let turn = apply_turn(
        &mut dom,
        &mut session,
        TurnRequest::new("heading", vec![Operation::replace("h1", "Build better")]),
    )
    .unwrap();
    assert!(!turn.has_errors());
    assert!(whole(&dom).contains("<h1>Build better</h1>"));
}

#[test]
fn test_baseline_capture_failure_propagates() {
    let mut dom = Dom::new();
    let mut session = Session::new("s1", "Chat 1");

    let result = apply_turn(&mut dom, &mut session, TurnRequest::new("x", vec![]));
    assert!(matches!(result, Err(EditorError::Capture(_))));
    assert!(session.turns.is_empty());
    assert!(session.baseline.is_none());
}

#[test]
fn test_response_to_turn_to_history() {
    let response = parse_design_response(
        r##"```json
        {"variations": [{"title": "Contrast", "summary": "Darker hero", "operations": [
            {"selector": "#hero", "action": "setStyle", "styles": {"background": "black"}}
        ]}], "usageMetadata": {"promptTokenCount": 1200, "candidatesTokenCount": 300, "totalTokenCount": 1500}}
        ```"##,
    )
    .unwrap();
    let usage = response.usage;
    assert_eq!(usage.map(|u| u.total_token_count), Some(1500));

    let mut dom = landing();
    let mut session = Session::new("s1", "Chat 1");
    let mut history = History::default();

    let estimate = TokenEstimate::for_session(&session, "make it darker");
    check_budget(&estimate, 1_000).unwrap();

    let variation = response.variations.into_iter().next().unwrap();
    let turn = apply_turn(&mut dom, &mut session, variation.into_request("make it darker", None, usage)).unwrap();
    assert_eq!(turn.describe(), "Darker hero");
    assert_eq!(turn.usage, usage);

    let item = history.record(HistoryItem::from_turn("https://example.com/landing", turn)).clone();
    assert_eq!(item.usage, usage);
    assert_eq!(history.for_host("example.com").count(), 1);

    history.undo(&item.id, &mut dom).unwrap();
    assert_eq!(whole(&dom), whole(&landing()));

    let estimate = TokenEstimate::for_session(&session, "again");
    assert!(matches!(
        check_budget(&estimate, 10),
        Err(EditorError::TokenLimitExceeded { .. })
    ));
}

#[test]
fn test_store_and_history_persist() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sessions_path = dir.path().join(".pagewright/sessions.json");
    let history_path = dir.path().join(".pagewright/history.json");

    let mut dom = landing();
    let mut store = SessionStore::load(&sessions_path)?;
    let mut history = History::load(&history_path, 50)?;

    let turn = apply_turn(
        &mut dom,
        store.active_session_mut()?,
        TurnRequest::new("dark", turn_one()),
    )?;
    history.record(HistoryItem::from_turn("https://example.com", turn));
    store.create_session()?;

    store.save(&sessions_path)?;
    history.save(&history_path)?;

    let store_again = SessionStore::load(&sessions_path)?;
    let history_again = History::load(&history_path, 50)?;
    assert_eq!(store_again, store);
    assert_eq!(history_again.items(), history.items());
    assert_eq!(store_again.sessions()[0].turns[0].forward_ops, turn_one());
    Ok(())
}

#[tokio::test]
async fn test_queue_serializes_concurrent_turns() {
    let queue = TurnQueue::new(landing(), SessionStore::new());

    let mut handles = Vec::new();
    for i in 0..8 {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            let ops = vec![
                Operation::append("#features", format!("<div class=\"feature\">Extra {}</div>", i)),
                Operation::set_style("#hero", [("padding", format!("{}px", i))]),
            ];
            queue.submit(TurnRequest::new(format!("turn {}", i), ops)).await
        }));
    }
    for handle in handles {
        let turn = handle.await.unwrap().unwrap();
        assert!(!turn.has_errors());
    }

    let (html, last_ops, turns) = queue
        .with_state(|dom, store| {
            let session = store.active_session().unwrap();
            (
                whole(dom),
                session.latest_turn().unwrap().forward_ops.clone(),
                session.turns.len(),
            )
        })
        .await;

    // only the last turn's edits are in the tree, applied once
    let mut expected = landing();
    apply_batch(&mut expected, &last_ops, None);
    assert_eq!(turns, 8);
    assert_eq!(html, whole(&expected));
}
