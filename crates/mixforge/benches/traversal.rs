//! Performance benchmarks for serialization and traversal
//!
//! Run with: cargo bench --bench traversal

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mixforge::prelude::*;

/// A list of `width` records, each a dict holding a tuple and a nested list.
fn build_graph(heap: &mut Heap, width: usize) -> Value {
    let records = (0..width as i64)
        .map(|i| {
            let pair = heap.tuple(vec![Value::Int(i), Value::str(format!("item-{i}"))]);
            let tags = heap.list(vec![Value::str("a"), Value::str("b"), Value::Float(i as f64)]);
            heap.str_dict([("pair", pair), ("tags", tags), ("flag", Value::Bool(i % 2 == 0))])
        })
        .collect();
    heap.list(records)
}

fn bench_flatten(c: &mut Criterion) {
    let forge = Forge::default();
    let mut group = c.benchmark_group("flatten");
    for width in [10, 100, 1_000] {
        let mut heap = Heap::new();
        let root = build_graph(&mut heap, width);
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &root, |b, root| {
            b.iter(|| forge.flatten(black_box(&heap), black_box(root)).unwrap());
        });
    }
    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let forge = Forge::default();
    let mut heap = Heap::new();
    let root = build_graph(&mut heap, 1_000);
    let classinfo: ClassInfo = BuiltinKind::Int.into();

    c.bench_function("find_ints_1000", |b| {
        b.iter(|| forge.find(black_box(&heap), black_box(&root), &classinfo).unwrap());
    });
}

fn bench_transform(c: &mut Criterion) {
    let forge = Forge::default();
    let classinfo: ClassInfo = BuiltinKind::Int.into();

    c.bench_function("transform_ints_1000", |b| {
        b.iter_batched(
            || {
                let mut heap = Heap::new();
                let root = build_graph(&mut heap, 1_000);
                (heap, root)
            },
            |(mut heap, root)| {
                forge
                    .transform(&mut heap, &root, &classinfo, |_, v| {
                        Ok(Value::Int(v.as_int().unwrap_or_default() * 2))
                    })
                    .unwrap()
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_serialization(c: &mut Criterion) {
    let forge = Forge::default();
    let mut heap = Heap::new();
    let root = build_graph(&mut heap, 1_000);
    let text = forge.dumps(&heap, &root).unwrap();

    c.bench_function("dumps_1000", |b| {
        b.iter(|| forge.dumps(black_box(&heap), black_box(&root)).unwrap());
    });

    c.bench_function("loads_1000", |b| {
        b.iter_batched(
            Heap::new,
            |mut heap| forge.loads(&mut heap, black_box(text.as_str())).unwrap(),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_flatten,
    bench_find,
    bench_transform,
    bench_serialization
);
criterion_main!(benches);
