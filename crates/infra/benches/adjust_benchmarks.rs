use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use hubledger_catalog::{NewHub, NewSku};
use hubledger_core::{HubId, SkuId};
use hubledger_infra::{AdjustmentEngine, InMemoryStore};
use hubledger_inventory::{AdjustmentRequest, Direction, LogFilter, LogLimit};
use tokio::runtime::Runtime;

type Engine = AdjustmentEngine<Arc<InMemoryStore>>;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("tokio runtime")
}

/// Engine with one hub and `skus` SKUs registered.
fn seeded(rt: &Runtime, skus: usize) -> (Arc<Engine>, HubId, Vec<SkuId>) {
    rt.block_on(async {
        let engine = AdjustmentEngine::new(Arc::new(InMemoryStore::new()));
        let hub = engine
            .register_hub(NewHub::new("BENCH", "Bench Hub"))
            .await
            .expect("hub");
        let mut ids = Vec::with_capacity(skus);
        for i in 0..skus {
            let sku = engine
                .register_sku(NewSku::new(format!("SKU-{i}"), format!("Item {i}")))
                .await
                .expect("sku");
            ids.push(sku.id);
        }
        (Arc::new(engine), hub.id, ids)
    })
}

fn bench_single_key_latency(c: &mut Criterion) {
    let rt = runtime();
    let (engine, hub, skus) = seeded(&rt, 1);
    let sku = skus[0];

    let mut group = c.benchmark_group("adjust_latency");
    group.throughput(Throughput::Elements(1));

    group.bench_function("in_single_key", |b| {
        b.iter(|| {
            let req = AdjustmentRequest::new(hub, sku, Direction::In, 1);
            rt.block_on(engine.adjust(black_box(req), None)).expect("adjust")
        })
    });

    group.bench_function("out_rejected", |b| {
        b.iter(|| {
            let req = AdjustmentRequest::new(hub, sku, Direction::Out, i64::MAX);
            black_box(rt.block_on(engine.adjust(req, None)).is_err())
        })
    });

    group.finish();
}

fn bench_concurrent_throughput(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("adjust_concurrent");

    // Same total work spread over 1 key (fully serialized) up to 16 keys.
    for key_count in [1usize, 4, 16] {
        let (engine, hub, skus) = seeded(&rt, key_count);
        let calls = 256usize;
        group.throughput(Throughput::Elements(calls as u64));
        group.bench_with_input(
            BenchmarkId::new("keys", key_count),
            &key_count,
            |b, _| {
                b.iter(|| {
                    rt.block_on(async {
                        let mut handles = Vec::with_capacity(calls);
                        for i in 0..calls {
                            let engine = Arc::clone(&engine);
                            let req = AdjustmentRequest::new(hub, skus[i % skus.len()], Direction::In, 1);
                            handles.push(tokio::spawn(async move { engine.adjust(req, None).await }));
                        }
                        for h in handles {
                            h.await.expect("join").expect("adjust");
                        }
                    })
                })
            },
        );
    }

    group.finish();
}

fn bench_log_query(c: &mut Criterion) {
    let rt = runtime();
    let (engine, hub, skus) = seeded(&rt, 8);
    rt.block_on(async {
        for i in 0..5_000 {
            let req = AdjustmentRequest::new(hub, skus[i % skus.len()], Direction::In, 1);
            engine.adjust(req, None).await.expect("adjust");
        }
    });

    let mut group = c.benchmark_group("log_query");
    for limit in [LogLimit::DEFAULT, LogLimit::MAX] {
        group.bench_with_input(BenchmarkId::new("newest_first", limit), &limit, |b, &limit| {
            b.iter(|| {
                rt.block_on(engine.list_log(
                    LogFilter::default(),
                    LogLimit::clamped(i64::from(limit)),
                    None,
                ))
                .expect("query")
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_single_key_latency,
    bench_concurrent_throughput,
    bench_log_query
);
criterion_main!(benches);
