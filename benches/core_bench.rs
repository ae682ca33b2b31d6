//! Benchmarks for galley core operations.
//!
//! Run with: cargo bench
//!
//! Results include 95% confidence intervals via Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use galley::core::patch::apply_patches;
use galley::core::types::{Definition, Ingredient, Patch};
use galley::core::validate::validate;
use galley::history::hasher::hash_record;
use galley::store::memory::MemoryStore;
use serde_json::json;

fn definition(v: serde_json::Value) -> Definition {
    serde_json::from_value(v).unwrap()
}

/// A base recipe with `n` ingredients and a linear chain of `n` steps.
fn base_recipe(n: usize) -> Definition {
    let ingredients: Vec<_> = (0..n)
        .map(|i| json!({"id": format!("ing{i}"), "quantity": i * 10, "unit": "g"}))
        .collect();
    let steps: Vec<_> = (0..n)
        .map(|i| {
            if i == 0 {
                json!({"id": "s0", "text": "start"})
            } else {
                json!({"id": format!("s{i}"), "text": "next", "depends_on": [format!("s{}", i - 1)]})
            }
        })
        .collect();
    definition(json!({
        "version": "1.2.0",
        "yield": {"amount": 1000, "unit": "g"},
        "ingredients": ingredients,
        "steps": steps
    }))
}

/// base <- d1 <- d2 ... <- d{depth}, with `top` composing the last one twice.
fn chain_store(size: usize, depth: usize) -> MemoryStore {
    let mut store = MemoryStore::new().with("d0", base_recipe(size));
    for d in 1..=depth {
        store = store.with(
            &format!("d{d}"),
            definition(json!({
                "version": "1.2.0",
                "derives_from": {
                    "id": format!("d{}", d - 1),
                    "constraint": "^1.0.0",
                    "ingredient_patches": [{"id": "ing0", "quantity": d}],
                    "step_patches": [{"op": "add", "id": format!("extra{d}"), "text": "extra"}]
                }
            })),
        );
    }
    store.with(
        "top",
        definition(json!({
            "uses": [
                {"id": "a", "recipe": format!("d{depth}")},
                {"id": "b", "recipe": format!("d{depth}"), "include_steps": ["s0"]}
            ]
        })),
    )
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for depth in [1, 4, 16] {
        let store = chain_store(32, depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &store, |b, store| {
            b.iter(|| galley::resolve(black_box(store), "top").unwrap());
        });
    }
    group.finish();
}

fn bench_apply_patches(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_patches");
    for n in [10, 100, 1000] {
        let base: Vec<Ingredient> = base_recipe(n).ingredients.unwrap_or_default();
        let patches: Vec<Patch> = (0..n)
            .step_by(2)
            .map(|i| {
                serde_json::from_value(json!({"id": format!("ing{i}"), "quantity": 1}))
                    .unwrap()
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| apply_patches(black_box(&base), black_box(&patches)).unwrap());
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for n in [10, 100, 1000] {
        let doc = galley::ResolvedRecipe::from(base_recipe(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &doc, |b, doc| {
            b.iter(|| {
                let report = validate(black_box(doc));
                black_box(report);
            });
        });
    }
    group.finish();
}

fn bench_hash_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_record");
    for n in [10, 100, 1000] {
        let raw = base_recipe(n).to_raw().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &raw, |b, raw| {
            b.iter(|| hash_record(black_box(raw)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_resolve,
    bench_apply_patches,
    bench_validate,
    bench_hash_record
);
criterion_main!(benches);
