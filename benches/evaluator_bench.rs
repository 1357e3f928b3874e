//! Micro-benchmark for the evaluator's hot recursive path: repeated
//! one-step unwinding of `diamond`/`until`-shaped queries, the residuals
//! that grow largest under `Repeat` before an SMT `simplify` call would
//! collapse them back down.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ldl_monitor::evaluator::evaluate;
use ldl_monitor::query::{diamond, until, AttrValue, GroundFact, Proposition, Query};
use std::collections::HashSet;

fn fact_query(name: &str) -> Query {
    Query::formula(Proposition::fact(GroundFact::new(
        name,
        vec![AttrValue::Str(name.to_string())],
    )))
}

fn bench_diamond_step(c: &mut Criterion) {
    let q = diamond(fact_query("curl"));
    let facts: HashSet<GroundFact> = HashSet::new();
    c.bench_function("evaluate diamond one step (no match)", |b| {
        b.iter(|| evaluate(black_box(&q), black_box(&facts), false))
    });
}

fn bench_until_chain(c: &mut Criterion) {
    let q = until(fact_query("a"), fact_query("b"));
    let mut facts = HashSet::new();
    facts.insert(GroundFact::new("a", vec![AttrValue::Str("a".into())]));
    c.bench_function("evaluate until one step (still pending)", |b| {
        b.iter(|| evaluate(black_box(&q), black_box(&facts), false))
    });
}

fn bench_residual_growth(c: &mut Criterion) {
    // Repeatedly feed a non-matching fact set through a `diamond`
    // residual, the steady-state cost of an unbounded trace that never
    // triggers an SMT `simplify` collapse.
    let mut residual = diamond(fact_query("curl"));
    let empty: HashSet<GroundFact> = HashSet::new();
    c.bench_function("evaluate diamond residual after 50 non-matching steps", |b| {
        b.iter(|| {
            let mut current = residual.clone();
            for _ in 0..50 {
                match evaluate(black_box(&current), black_box(&empty), false) {
                    ldl_monitor::query::QueryValue::Unstable(next) => current = next,
                    other => {
                        residual = diamond(fact_query("curl"));
                        return other;
                    }
                }
            }
            ldl_monitor::query::QueryValue::Unstable(current)
        })
    });
}

criterion_group!(benches, bench_diamond_step, bench_until_chain, bench_residual_growth);
criterion_main!(benches);
