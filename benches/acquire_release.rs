use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recycle_pool::ObjectPool;

fn acquire_release(c: &mut Criterion) {
    let mut pool = ObjectPool::builder()
        .factory(|| Vec::<u8>::with_capacity(4096))
        .on_release(|buf: &mut Vec<u8>| buf.clear())
        .preload(64)
        .build()
        .unwrap();

    c.bench_function("acquire_release", |b| {
        b.iter(|| {
            let handle = pool.acquire().unwrap();
            pool.get_mut(handle).unwrap().push(black_box(1));
            pool.release(handle).unwrap();
        })
    });

    c.bench_function("release_all_active_32", |b| {
        b.iter(|| {
            for _ in 0..32 {
                black_box(pool.acquire().unwrap());
            }
            pool.release_all_active().unwrap()
        })
    });
}

criterion_group!(benches, acquire_release);
criterion_main!(benches);
