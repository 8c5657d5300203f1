#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use elemtree::build::{read_document, read_document_with, BuildOptions};
use elemtree::select::Selectors;
use elemtree::serial::serialize;
use elemtree::Document;
use std::fmt::Write;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a small document with approximately 10 elements.
fn make_small_doc() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<root>\n");
    for i in 0..10 {
        let _ = writeln!(xml, "  <item id=\"{i}\">Value {i}</item>");
    }
    xml.push_str("</root>\n");
    xml
}

/// Generates a medium document with approximately 100 elements.
fn make_medium_doc() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<catalog>\n");
    for i in 0..100 {
        let _ = writeln!(
            xml,
            "  <book id=\"bk{i}\"><title>Title {i}</title>\
             <author>Author {i}</author>\
             <price>{}.99</price></book>",
            10 + i
        );
    }
    xml.push_str("</catalog>\n");
    xml
}

/// Generates a large document with approximately 1000 elements.
fn make_large_doc() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<database>\n");
    for i in 0..1000 {
        let _ = writeln!(
            xml,
            "  <record id=\"{i}\"><name>Record {i}</name>\
             <value>{}</value><status>active</status></record>",
            i * 42
        );
    }
    xml.push_str("</database>\n");
    xml
}

/// Generates a deeply nested document with the given nesting depth.
fn make_nested_doc(depth: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n");
    for i in 0..depth {
        let _ = write!(xml, "<level{i}>");
    }
    xml.push_str("leaf");
    for i in (0..depth).rev() {
        let _ = write!(xml, "</level{i}>");
    }
    xml.push('\n');
    xml
}

/// Builds a flat element with `count` children directly, without parsing.
fn make_wide_tree(count: usize) -> Document {
    let mut doc = Document::new();
    let root = doc.new_element("root").expect("element name");
    doc.set_root(root).expect("root");
    for i in 0..count {
        let child = doc
            .new_element(if i % 2 == 0 { "even" } else { "odd" })
            .expect("element name");
        doc.append(root, child).expect("append");
        doc.append(root, format!("text {i}")).expect("append");
    }
    doc
}

// ---------------------------------------------------------------------------
// Build benchmarks
// ---------------------------------------------------------------------------

fn bench_read_small(c: &mut Criterion) {
    let xml = make_small_doc();
    c.bench_function("read_small", |b| {
        b.iter(|| read_document(black_box(&xml)));
    });
}

fn bench_read_medium(c: &mut Criterion) {
    let xml = make_medium_doc();
    c.bench_function("read_medium", |b| {
        b.iter(|| read_document(black_box(&xml)));
    });
}

fn bench_read_large(c: &mut Criterion) {
    let xml = make_large_doc();
    c.bench_function("read_large", |b| {
        b.iter(|| read_document(black_box(&xml)));
    });
}

fn bench_read_deeply_nested(c: &mut Criterion) {
    let xml = make_nested_doc(50);
    c.bench_function("read_deeply_nested", |b| {
        b.iter(|| read_document(black_box(&xml)));
    });
}

fn bench_read_noblanks(c: &mut Criterion) {
    let xml = make_large_doc();
    let opts = BuildOptions::default().ignore_whitespace(true);
    c.bench_function("read_noblanks", |b| {
        b.iter(|| read_document_with(black_box(&xml), &opts));
    });
}

// ---------------------------------------------------------------------------
// Serialization benchmarks
// ---------------------------------------------------------------------------

fn bench_serialize_medium(c: &mut Criterion) {
    let doc = read_document(&make_medium_doc()).expect("parse failed");
    c.bench_function("serialize_medium", |b| {
        b.iter(|| serialize(black_box(&doc)));
    });
}

fn bench_serialize_large(c: &mut Criterion) {
    let doc = read_document(&make_large_doc()).expect("parse failed");
    c.bench_function("serialize_large", |b| {
        b.iter(|| serialize(black_box(&doc)));
    });
}

fn bench_roundtrip(c: &mut Criterion) {
    let xml = make_medium_doc();
    c.bench_function("roundtrip", |b| {
        b.iter(|| {
            let doc = read_document(black_box(&xml)).expect("parse failed");
            serialize(&doc).expect("serialize failed")
        });
    });
}

// ---------------------------------------------------------------------------
// Edit benchmarks
// ---------------------------------------------------------------------------

/// Splices nodes in and out of the middle of a wide child list.
fn bench_edit_churn(c: &mut Criterion) {
    c.bench_function("edit_churn", |b| {
        b.iter(|| {
            let mut doc = make_wide_tree(100);
            let root = doc.root().expect("root");
            let children: Vec<_> = doc.children(root).collect();
            for pair in children.chunks(2) {
                doc.unlink(pair[0]);
                doc.prepend_sibling(pair[1], pair[0]).expect("splice");
            }
            for &child in children.iter().step_by(3) {
                doc.substitute(child, "replaced").expect("substitute");
            }
            doc
        });
    });
}

fn bench_deep_copy(c: &mut Criterion) {
    let mut doc = read_document(&make_medium_doc()).expect("parse failed");
    let root = doc.root().expect("root");
    c.bench_function("deep_copy", |b| {
        b.iter(|| {
            let dup = doc.copy(black_box(root));
            black_box(dup)
        });
    });
}

fn bench_traversal(c: &mut Criterion) {
    let doc = make_wide_tree(1000);
    let root = doc.root().expect("root");
    c.bench_function("traversal", |b| {
        b.iter(|| {
            let elements = doc.elements(black_box(root)).count();
            let texts = doc.texts_reversed(black_box(root)).count();
            (elements, texts)
        });
    });
}

// ---------------------------------------------------------------------------
// Selector benchmarks
// ---------------------------------------------------------------------------

fn bench_selector_literal(c: &mut Criterion) {
    let doc = make_wide_tree(500);
    let root = doc.root().expect("root");
    let selectors = Selectors::new();
    c.bench_function("selector_literal", |b| {
        b.iter(|| selectors.all(&doc, black_box(root), "odd"));
    });
}

fn bench_selector_handler(c: &mut Criterion) {
    let doc = make_wide_tree(500);
    let root = doc.root().expect("root");
    let mut selectors = Selectors::new();
    selectors.register(":odd", |doc, element, reversed| {
        let mut odd: Vec<_> = doc
            .children(element)
            .enumerate()
            .filter_map(|(i, c)| (i % 2 == 1).then_some(c))
            .collect();
        if reversed {
            odd.reverse();
        }
        odd
    });
    c.bench_function("selector_handler", |b| {
        b.iter(|| selectors.all(&doc, black_box(root), ":odd"));
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    building,
    bench_read_small,
    bench_read_medium,
    bench_read_large,
    bench_read_deeply_nested,
    bench_read_noblanks,
);

criterion_group!(
    serialization,
    bench_serialize_medium,
    bench_serialize_large,
    bench_roundtrip,
);

criterion_group!(editing, bench_edit_churn, bench_deep_copy, bench_traversal);

criterion_group!(selectors, bench_selector_literal, bench_selector_handler);

criterion_main!(building, serialization, editing, selectors);
