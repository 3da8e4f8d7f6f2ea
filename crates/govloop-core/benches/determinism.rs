use criterion::{black_box, criterion_group, criterion_main, Criterion};
use govloop_core::{CostEvaluator, CycleBenefit, CycleCost, SemanticHasher, AUTO};

fn bench_hash_text(c: &mut Criterion) {
    let hasher = SemanticHasher::default();
    c.bench_function("hash_text_en", |b| {
        b.iter(|| hasher.hash_text(black_box("Create user alice@example.com with role admin"), AUTO))
    });
    c.bench_function("hash_text_zh", |b| {
        b.iter(|| hasher.hash_text(black_box("建立使用者張三並批准權限"), AUTO))
    });
}

fn bench_record_cycle(c: &mut Criterion) {
    c.bench_function("record_100_cycles", |b| {
        b.iter(|| {
            let mut evaluator = CostEvaluator::new();
            for i in 0..100u32 {
                let id = format!("c{}", i);
                evaluator.record_cycle(
                    CycleCost::new(&id).with_compute_cost(10.0 + f64::from(i)),
                    CycleBenefit::new(&id).with_problems_resolved(i % 3),
                );
            }
            black_box(evaluator.summary())
        })
    });
}

criterion_group!(benches, bench_hash_text, bench_record_cycle);
criterion_main!(benches);
