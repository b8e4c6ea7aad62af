//! Export Performance Benchmarks
//!
//! Benchmarks handing native aggregates to the host under the copy, move
//! and reference policies, and evaluating expressions for export.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tenbind_cast::{to_host, CleanupList, ExportPolicy, ToHost, ToHostRef};
use tenbind_dense::{DenseExt, MatrixX, PlainStorage};

const SIZES: [usize; 3] = [8, 64, 512];

fn matrix(n: usize) -> MatrixX<f64> {
    MatrixX::from_fn(n, n, |i, j| (i * n + j) as f64)
}

// ============================================================================
// Policies
// ============================================================================

fn bench_owned_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("owned_export");

    for n in SIZES {
        let m = matrix(n);
        group.throughput(Throughput::Bytes((n * n * 8) as u64));

        group.bench_with_input(BenchmarkId::new("copy", n), &m, |b, m| {
            b.iter(|| black_box(to_host(m.clone(), ExportPolicy::Copy)))
        });
        group.bench_with_input(BenchmarkId::new("move", n), &m, |b, m| {
            b.iter(|| black_box(to_host(m.clone(), ExportPolicy::Move)))
        });
    }

    group.finish();
}

fn bench_reference_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_export");

    for n in SIZES {
        let m = matrix(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &m, |b, m| {
            b.iter(|| {
                let cleanup = CleanupList::new();
                // SAFETY: `m` outlives the exported array
                black_box(unsafe { m.to_host_ref(ExportPolicy::Reference, &cleanup) })
            })
        });
    }

    group.finish();
}

// ============================================================================
// Expressions
// ============================================================================

fn bench_expression_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression_export");

    for n in SIZES {
        let lhs = matrix(n);
        let rhs = matrix(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &(lhs, rhs), |b, (lhs, rhs)| {
            b.iter(|| {
                let cleanup = CleanupList::new();
                black_box(lhs.plus(rhs).to_host(ExportPolicy::Automatic, &cleanup))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_owned_export,
    bench_reference_export,
    bench_expression_export
);
criterion_main!(benches);
