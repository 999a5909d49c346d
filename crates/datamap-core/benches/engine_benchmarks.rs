//! Benchmarks for buffered and streaming rule application
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use datamap_core::expression::{compile, evaluate, Clock, Environment};
use datamap_core::{apply_rules, stream_transform, MappingRule, MappingRuleBuilder, TransformKind};
use serde_json::{json, Map, Value};

fn create_rules() -> Vec<MappingRule> {
    vec![
        MappingRuleBuilder::new("customer.name")
            .destination("person.fullName")
            .transform(TransformKind::Capitalize)
            .build()
            .unwrap(),
        MappingRuleBuilder::new("customer.gender")
            .destination("person.gender")
            .transform(TransformKind::MapGender)
            .build()
            .unwrap(),
        MappingRuleBuilder::new("customer.dob")
            .destination("person.dateOfBirth")
            .transform(TransformKind::FormatDate)
            .build()
            .unwrap(),
        MappingRuleBuilder::new("order.total")
            .destination("billing.totalWithTax")
            .expression("round(value * 1.2, 2)")
            .build()
            .unwrap(),
        MappingRuleBuilder::new("order.items")
            .destination("billing.itemCount")
            .expression("len(value)")
            .build()
            .unwrap(),
        MappingRuleBuilder::new("customer.id")
            .destination("person.customerId")
            .required()
            .build()
            .unwrap(),
    ]
}

fn create_document(i: usize) -> Value {
    json!({
        "customer": {"name": format!("customer {}", i), "gender": "female", "dob": "02-January-1990"},
        "order": {"total": i as f64 * 10.5, "items": [1, 2, 3]}
    })
}

fn create_batch(size: usize) -> String {
    let batch: Map<String, Value> = (0..size)
        .map(|i| (format!("record{}", i), create_document(i)))
        .collect();
    Value::Object(batch).to_string()
}

fn bench_buffered(c: &mut Criterion) {
    let rules = create_rules();
    let doc = create_document(1);
    let input = doc.as_object().unwrap();

    c.bench_function("apply_rules_single_document", |b| {
        b.iter(|| apply_rules(black_box(input), black_box(&rules)))
    });
}

fn bench_buffered_vs_streaming(c: &mut Criterion) {
    let rules = create_rules();
    let mut group = c.benchmark_group("batch_transform");

    for size in [10usize, 100, 1000] {
        let text = create_batch(size);

        group.bench_with_input(BenchmarkId::new("buffered", size), &text, |b, text| {
            b.iter(|| {
                let parsed: Map<String, Value> = serde_json::from_str(text).unwrap();
                let out: Map<String, Value> = parsed
                    .into_iter()
                    .map(|(key, value)| match value {
                        Value::Object(doc) => (key, Value::Object(apply_rules(&doc, &rules))),
                        other => (key, other),
                    })
                    .collect();
                serde_json::to_vec(&out).unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("streaming", size), &text, |b, text| {
            b.iter(|| {
                let mut out = Vec::with_capacity(text.len());
                stream_transform(text.as_bytes(), &mut out, &rules).unwrap();
                out
            })
        });
    }

    group.finish();
}

fn bench_expressions(c: &mut Criterion) {
    let mut env = Environment::new(Clock::system());
    env.bind("value", json!("some customer name"));

    let expressions = [
        ("simple", "value"),
        ("call", "toUpper(value)"),
        ("conditional", "len(value) > 5 ? toUpper(value) : toLower(value) + '_short'"),
    ];

    let mut group = c.benchmark_group("expressions");
    for (name, source) in expressions {
        group.bench_function(BenchmarkId::new("compile", name), |b| {
            b.iter(|| compile(black_box(source)))
        });
        group.bench_function(BenchmarkId::new("evaluate", name), |b| {
            b.iter(|| evaluate(black_box(source), &env))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_buffered, bench_buffered_vs_streaming, bench_expressions);
criterion_main!(benches);
