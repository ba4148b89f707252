use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagewright_dom::Dom;

fn landing_page() -> String {
    let mut cards = String::new();
    for i in 0..50 {
        cards.push_str(&format!(
            r#"<article class="card card-{i}" data-index="{i}">
                <h3 class="title">Card {i}</h3>
                <p class="w-[50%] text-sm">Description &amp; details for card {i}</p>
                <a href="/cards/{i}" style="color: blue">Read more</a>
            </article>"#
        ));
    }
    format!(
        r#"<!DOCTYPE html><html><head><title>Bench</title></head><body>
            <header id="top"><nav><ul><li>Home</li><li>About</li></ul></nav></header>
            <main id="app"><section class="grid">{cards}</section></main>
        </body></html>"#
    )
}

fn parse_document(c: &mut Criterion) {
    let source = landing_page();
    c.bench_function("parse_document", |b| {
        b.iter(|| Dom::parse_document(black_box(&source)))
    });
}

fn query_selector(c: &mut Criterion) {
    let dom = Dom::parse_document(&landing_page()).unwrap();
    c.bench_function("query_selector_nth_child", |b| {
        b.iter(|| dom.query_selector(None, black_box("#app > section.grid > article:nth-child(42) p")))
    });
    c.bench_function("query_selector_escaped_class", |b| {
        b.iter(|| dom.query_selector_all(None, black_box("p.w-\\[50\\%\\]")))
    });
}

fn serialize_document(c: &mut Criterion) {
    let dom = Dom::parse_document(&landing_page()).unwrap();
    c.bench_function("serialize_document", |b| {
        b.iter(|| dom.outer_html(black_box(dom.document())))
    });
}

criterion_group!(benches, parse_document, query_selector, serialize_document);
criterion_main!(benches);
