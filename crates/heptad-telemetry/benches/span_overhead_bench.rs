//! Observes the cost of wrapping an operation in a span, with and without
//! the `spans` feature (not asserted — no toolchain run is part of this
//! exercise; compare the two `cargo bench --features spans` runs by hand).

use criterion::{criterion_group, criterion_main, Criterion};
use heptad_telemetry::{traced_span, SpanRecorder};

fn bench_traced_noop(c: &mut Criterion) {
    let mut recorder = SpanRecorder::new();
    c.bench_function("traced_span_noop", |b| {
        b.iter(|| {
            traced_span!(&mut recorder, "noop", {
                std::hint::black_box(1 + 1)
            })
        });
    });
}

criterion_group!(benches, bench_traced_noop);
criterion_main!(benches);
