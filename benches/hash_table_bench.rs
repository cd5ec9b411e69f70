use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use erased_containers::{CallbackTable, HashTable, KeyBytes, TableConfig};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("table::insert_fresh_100k", |b| {
        b.iter_batched(
            || HashTable::<String, u64>::new().unwrap(),
            |mut t| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    let _ = t.insert(&key(x), &(i as u64)).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_reserved_100k(c: &mut Criterion) {
    c.bench_function("table::insert_reserved_100k", |b| {
        b.iter_batched(
            || {
                let mut t = HashTable::<String, u64>::new().unwrap();
                t.reserve(200_000).unwrap();
                t
            },
            |mut t| {
                for (i, x) in lcg(2).take(100_000).enumerate() {
                    let _ = t.insert(&key(x), &(i as u64)).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_miss_100k(c: &mut Criterion) {
    let mut t = HashTable::<String, u64>::new().unwrap();
    let hits: Vec<String> = lcg(3).take(100_000).map(key).collect();
    for (i, k) in hits.iter().enumerate() {
        t.insert(k, &(i as u64)).unwrap();
    }
    let misses: Vec<String> = lcg(4).take(100_000).map(key).collect();

    c.bench_function("table::find_hit_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for k in &hits {
                sum = sum.wrapping_add(*t.find(k).unwrap());
            }
            black_box(sum)
        })
    });
    c.bench_function("table::find_miss_100k", |b| {
        b.iter(|| {
            let mut n = 0usize;
            for k in &misses {
                n += t.contains_key(k) as usize;
            }
            black_box(n)
        })
    });
}

fn bench_churn_with_tombstones(c: &mut Criterion) {
    c.bench_function("table::insert_remove_churn_50k", |b| {
        b.iter_batched(
            || HashTable::<u64, u64>::with_config(TableConfig::new(1 << 12)).unwrap(),
            |mut t| {
                for x in lcg(5).take(50_000) {
                    let k = x % 4096;
                    if t.remove(&k).is_err() {
                        t.insert(&k, &x).unwrap();
                    }
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn fold_hash(k: KeyBytes<'_>) -> u64 {
    k.as_bytes()
        .iter()
        .fold(0xcbf29ce484222325u64, |h, &b| (h ^ b as u64).wrapping_mul(0x100000001b3))
}

fn bench_custom_hash_10k(c: &mut Criterion) {
    c.bench_function("table::insert_custom_hash_10k", |b| {
        b.iter_batched(
            || {
                let keys = CallbackTable::NONE.with_hash(fold_hash);
                HashTable::<u64, u64>::with_callbacks(TableConfig::default(), keys, CallbackTable::NONE)
                    .unwrap()
            },
            |mut t| {
                for x in lcg(6).take(10_000) {
                    t.insert(&x, &x).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2))
        .sample_size(20)
}

criterion_group! {
    name = benches;
    config = config();
    targets =
        bench_insert_fresh_100k,
        bench_insert_reserved_100k,
        bench_find_hit_miss_100k,
        bench_churn_with_tombstones,
        bench_custom_hash_10k
}
criterion_main!(benches);
