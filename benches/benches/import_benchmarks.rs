//! Import Performance Benchmarks
//!
//! Benchmarks binding host arrays to native aggregates: copying into plain
//! matrices, converting on the way in, and zero-copy map binding.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tenbind_cast::{load, CastFlags, CleanupList};
use tenbind_dense::{DenseBase, Map, MatrixX, MatrixXR, Strided};
use tenbind_runtime::{ArrayOrder, DType, HostValue, NdArray};

const SIZES: [usize; 3] = [8, 64, 512];

fn host_matrix(n: usize, dtype: DType, order: ArrayOrder) -> HostValue {
    let values: Vec<f64> = (0..n * n).map(|v| v as f64).collect();
    let array = NdArray::from_vec(values, &[n, n])
        .expect("square shape")
        .convert(dtype, order);
    HostValue::Array(array)
}

// ============================================================================
// Plain Import
// ============================================================================

fn bench_plain_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("plain_import");

    for n in SIZES {
        let host = host_matrix(n, DType::Float64, ArrayOrder::Fortran);
        group.throughput(Throughput::Bytes((n * n * 8) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &host, |b, host| {
            b.iter(|| {
                let cleanup = CleanupList::new();
                let m = load::<MatrixX<f64>>(black_box(host), CastFlags::NONE, &cleanup);
                black_box(m)
            })
        });
    }

    group.finish();
}

fn bench_converting_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("converting_import");

    for n in SIZES {
        // int32 in row-major order into a column-major double matrix
        let host = host_matrix(n, DType::Int32, ArrayOrder::C);
        group.bench_with_input(BenchmarkId::from_parameter(n), &host, |b, host| {
            b.iter(|| {
                let cleanup = CleanupList::new();
                let m = load::<MatrixX<f64>>(black_box(host), CastFlags::CONVERT, &cleanup);
                black_box(m)
            })
        });
    }

    group.finish();
}

// ============================================================================
// Map Binding
// ============================================================================

fn bench_map_binding(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_binding");

    for n in SIZES {
        let host = host_matrix(n, DType::Float64, ArrayOrder::C);
        group.bench_with_input(BenchmarkId::new("contiguous", n), &host, |b, host| {
            b.iter(|| {
                let cleanup = CleanupList::new();
                let map = load::<Map<'_, MatrixXR<f64>>>(black_box(host), CastFlags::NONE, &cleanup)
                    .map(|map| map.rows());
                black_box(map)
            })
        });
        group.bench_with_input(BenchmarkId::new("strided", n), &host, |b, host| {
            b.iter(|| {
                let cleanup = CleanupList::new();
                let map = load::<Map<'_, MatrixX<f64>, Strided>>(
                    black_box(host),
                    CastFlags::NONE,
                    &cleanup,
                )
                .map(|map| map.row_stride());
                black_box(map)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plain_import, bench_converting_import, bench_map_binding);
criterion_main!(benches);
