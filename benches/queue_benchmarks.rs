use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rust_bounded_queue::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const ITEMS: usize = 10_000;

fn transfer<Q: BlockingQueue<usize> + 'static>(queue: Arc<Q>, producers: usize, consumers: usize) {
    let per_producer = ITEMS / producers;
    let total = per_producer * producers;

    let mut handles = Vec::with_capacity(producers + consumers);
    for _ in 0..producers {
        let queue = Arc::clone(&queue);
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                queue.put(i);
            }
        }));
    }
    for c in 0..consumers {
        let queue = Arc::clone(&queue);
        let quota = total / consumers + usize::from(c < total % consumers);
        handles.push(thread::spawn(move || {
            for _ in 0..quota {
                black_box(queue.take());
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Benchmark thread panicked");
    }
}

fn benchmark_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc_transfer_10k");
    group.sample_size(20);

    for &(producers, consumers) in &[(1, 1), (4, 4)] {
        for &capacity in &[1usize, 64] {
            let label = format!("{}p{}c_cap{}", producers, consumers, capacity);
            group.bench_with_input(
                BenchmarkId::new("condvar", &label),
                &capacity,
                |b, &capacity| {
                    b.iter(|| {
                        let queue =
                            Arc::new(BoundedQueue::new(capacity).expect("Failed to create queue"));
                        transfer(queue, producers, consumers);
                    });
                },
            );
            group.bench_with_input(
                BenchmarkId::new("polling", &label),
                &capacity,
                |b, &capacity| {
                    b.iter(|| {
                        let queue =
                            Arc::new(PollingQueue::new(capacity).expect("Failed to create queue"));
                        transfer(queue, producers, consumers);
                    });
                },
            );
        }
    }

    group.finish();
}

fn benchmark_uncontended(c: &mut Criterion) {
    let queue = BoundedQueue::new(1024).expect("Failed to create queue");
    c.bench_function("bounded_put_take_uncontended", |b| {
        b.iter(|| {
            queue.put(black_box(1u64));
            black_box(queue.take());
        });
    });
}

fn benchmark_pool_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_submission");

    group.bench_function("execute_1000_then_shutdown", |b| {
        b.iter_batched(
            || {
                WorkerPool::with_config(
                    WorkerPoolConfig::new(4).with_poll_interval(Duration::from_millis(10)),
                )
                .expect("Failed to create pool")
            },
            |pool| {
                for _ in 0..1000 {
                    pool.execute(|| {
                        black_box(1 + 1);
                        Ok(())
                    });
                }
                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("submit_all_1000_then_shutdown", |b| {
        b.iter_batched(
            || {
                let pool = WorkerPool::with_config(
                    WorkerPoolConfig::new(4).with_poll_interval(Duration::from_millis(10)),
                )
                .expect("Failed to create pool");
                let jobs: Vec<BoxedJob> = (0..1000)
                    .map(|_| Box::new(ClosureJob::new(|| Ok(()))) as BoxedJob)
                    .collect();
                (pool, jobs)
            },
            |(pool, jobs)| {
                pool.submit_all(jobs);
                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_strategies,
    benchmark_uncontended,
    benchmark_pool_submission
);
criterion_main!(benches);
