//! Benchmarks for document building.
//!
//! Run with: cargo bench
//!
//! Inputs are synthetic block lists: each page has lines of words, a table
//! and a few key/value pairs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

/// Creates a synthetic block-list document with the given number of pages.
fn create_test_document(page_count: usize) -> Value {
    let mut blocks = Vec::new();

    for p in 1..=page_count {
        let mut children = Vec::new();

        for l in 0..40 {
            let line_id = format!("p{}-l{}", p, l);
            let word_ids: Vec<String> = (0..8).map(|w| format!("{}-w{}", line_id, w)).collect();
            for (w, id) in word_ids.iter().enumerate() {
                blocks.push(json!({
                    "Id": id, "BlockType": "WORD", "Text": format!("word{}", w),
                    "Confidence": 99.0, "Page": p
                }));
            }
            blocks.push(json!({
                "Id": line_id, "BlockType": "LINE", "Text": "word0 word1 word2 word3",
                "Confidence": 98.0, "Page": p,
                "Geometry": {"BoundingBox": {"Left": 0.1, "Top": l as f64 * 0.02, "Width": 0.8, "Height": 0.01}},
                "Relationships": [{"Type": "CHILD", "Ids": word_ids}]
            }));
            children.push(line_id);
        }

        let table_id = format!("p{}-t", p);
        let mut cell_ids = Vec::new();
        for r in 0..10 {
            for c in 0..5 {
                let cell_id = format!("{}-c{}-{}", table_id, r, c);
                blocks.push(json!({
                    "Id": cell_id, "BlockType": "CELL", "RowIndex": r, "ColumnIndex": c,
                    "Page": p, "Relationships": [{"Type": "CHILD", "Ids": [format!("p{}-l{}-w0", p, r)]}]
                }));
                cell_ids.push(cell_id);
            }
        }
        blocks.push(json!({
            "Id": table_id, "BlockType": "TABLE", "Page": p,
            "Relationships": [{"Type": "CHILD", "Ids": cell_ids}]
        }));
        children.push(table_id);

        for k in 0..5 {
            let key_id = format!("p{}-k{}", p, k);
            let value_id = format!("p{}-v{}", p, k);
            blocks.push(json!({
                "Id": key_id, "BlockType": "KEY_VALUE_SET", "EntityTypes": ["KEY"], "Page": p,
                "Relationships": [
                    {"Type": "VALUE", "Ids": [value_id]},
                    {"Type": "CHILD", "Ids": [format!("p{}-l{}-w1", p, k)]}
                ]
            }));
            blocks.push(json!({
                "Id": value_id, "BlockType": "KEY_VALUE_SET", "EntityTypes": ["VALUE"], "Page": p,
                "Relationships": [{"Type": "CHILD", "Ids": [format!("p{}-l{}-w2", p, k)]}]
            }));
        }

        blocks.push(json!({
            "Id": format!("p{}", p), "BlockType": "PAGE", "Page": p,
            "Relationships": [{"Type": "CHILD", "Ids": children}]
        }));
    }

    json!({"DocumentMetadata": {"Pages": page_count}, "Blocks": blocks})
}

/// Benchmark the full decode and build at various sizes.
fn bench_document_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_build");

    for page_count in [1, 5, 20].iter() {
        let data = serde_json::to_vec(&create_test_document(*page_count)).unwrap();

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| layoutdoc::parse_bytes(black_box(&data)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark single-object versus array input detection.
fn bench_array_fallback(c: &mut Criterion) {
    let single = serde_json::to_vec(&create_test_document(1)).unwrap();
    let array = serde_json::to_vec(&json!([create_test_document(1)])).unwrap();

    c.bench_function("decode_single_object", |b| {
        b.iter(|| layoutdoc::load_slice(black_box(&single)).unwrap());
    });

    c.bench_function("decode_array", |b| {
        b.iter(|| layoutdoc::load_slice(black_box(&array)).unwrap());
    });
}

/// Benchmark key search over a built document.
fn bench_key_search(c: &mut Criterion) {
    let data = serde_json::to_vec(&create_test_document(20)).unwrap();
    let doc = layoutdoc::parse_bytes(&data).unwrap();

    c.bench_function("find_key_value_pairs", |b| {
        b.iter(|| doc.find_key_value_pairs(black_box("WORD1")));
    });
}

criterion_group!(
    benches,
    bench_document_build,
    bench_array_fallback,
    bench_key_search,
);
criterion_main!(benches);
