use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use xqdb_array::Array;

pub fn insert(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let positions: Vec<usize> = (0..10_000).map(|i| rng.gen_range(0..=i)).collect();
    let mut group = c.benchmark_group("insert");

    group.bench_function("random 10k, N=8", |b| {
        b.iter(|| {
            let mut arr = Array::<u32, 8>::new();
            for (i, &idx) in positions.iter().enumerate() {
                arr = arr.insert_before(idx, i as u32).unwrap();
            }
            black_box(arr)
        })
    });

    group.bench_function("random 10k, N=32", |b| {
        b.iter(|| {
            let mut arr = Array::<u32, 32>::new();
            for (i, &idx) in positions.iter().enumerate() {
                arr = arr.insert_before(idx, i as u32).unwrap();
            }
            black_box(arr)
        })
    });

    group.bench_function("snoc 10k, N=32", |b| {
        b.iter(|| {
            let mut arr = Array::<u32, 32>::new();
            for i in 0..10_000 {
                arr = arr.snoc(i);
            }
            black_box(arr)
        })
    });

    group.bench_function("cons 10k, N=32", |b| {
        b.iter(|| {
            let mut arr = Array::<u32, 32>::new();
            for i in 0..10_000 {
                arr = arr.cons(i);
            }
            black_box(arr)
        })
    });
}

pub fn slice(c: &mut Criterion) {
    let input = [0; 10000];
    let mut group = c.benchmark_group("slice");

    group.bench_function("slice 100 out of 10k, N=8", |b| {
        let arr: Array<_, 8> = input.iter().copied().collect();
        b.iter(|| black_box(arr.slice(5000, 5100).unwrap()));
    });

    group.bench_function("iter 100 out of 10k, N=8", |b| {
        let arr: Array<_, 8> = input.iter().copied().collect();
        let sliced = arr.slice(5000, 5100).unwrap();
        b.iter(|| black_box(sliced.iter().count()));
    });

    group.bench_function("slice 100 out of 10k, N=64", |b| {
        let arr: Array<_, 64> = input.iter().copied().collect();
        b.iter(|| black_box(arr.slice(5000, 5100).unwrap()));
    });

    group.bench_function("iter_starting_at 5k out of 10k, N=64", |b| {
        let arr: Array<_, 64> = input.iter().copied().collect();
        b.iter(|| black_box(arr.iter_starting_at(5000).unwrap().count()));
    });
}

pub fn concat(c: &mut Criterion) {
    let mut group = c.benchmark_group("concat");

    group.bench_function("10k ++ 10k, N=32", |b| {
        let left: Array<u32, 32> = (0..10_000).collect();
        let right: Array<u32, 32> = (0..10_000).collect();
        b.iter(|| black_box(left.concat(&right)));
    });

    group.bench_function("10k ++ 10, N=32", |b| {
        let left: Array<u32, 32> = (0..10_000).collect();
        let right: Array<u32, 32> = (0..10).collect();
        b.iter(|| black_box(left.concat(&right)));
    });

    group.bench_function("1k appends of 10, N=32", |b| {
        let piece: Array<u32, 32> = (0..10).collect();
        b.iter_batched(
            Array::<u32, 32>::new,
            |mut arr| {
                for _ in 0..1_000 {
                    arr.append(piece.clone());
                }
                arr
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, insert, slice, concat);
criterion_main!(benches);
