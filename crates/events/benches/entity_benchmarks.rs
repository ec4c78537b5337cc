use std::sync::OnceLock;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};

use sourced_events::{Entity, EntityBase, EntityId, EntityResult, Event, HandlerTable};

#[derive(Debug, Serialize, Deserialize)]
struct Counter {
    #[serde(flatten)]
    base: EntityBase<EntityId>,
    total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Add {
    delta: i64,
}

impl Counter {
    fn new() -> Self {
        Self {
            base: EntityBase::new::<Self>(EntityId::new()).expect("concrete scope"),
            total: 0,
        }
    }

    fn add(&mut self, data: Add) -> EntityResult<&mut Self> {
        self.total += data.delta;
        self.record("add", &data)
    }
}

impl Entity for Counter {
    type Id = EntityId;

    fn base(&self) -> &EntityBase<EntityId> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase<EntityId> {
        &mut self.base
    }

    fn handlers() -> &'static HandlerTable<Self> {
        static HANDLERS: OnceLock<HandlerTable<Counter>> = OnceLock::new();
        HANDLERS.get_or_init(|| {
            HandlerTable::new().on("add", |c: &mut Counter, data: Add| c.add(data).map(drop))
        })
    }
}

fn history(len: usize) -> Vec<Event<EntityId>> {
    let mut counter = Counter::new();
    for i in 0..len {
        counter.add(Add { delta: i as i64 }).expect("record");
    }
    counter.take_events()
}

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("record");
    for &n in &[10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut counter = Counter::new();
                for i in 0..n {
                    counter.add(Add { delta: i as i64 }).expect("record");
                }
                black_box(counter.base().revision())
            });
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    for &n in &[10usize, 100, 1_000] {
        let events = history(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &events, |b, events| {
            b.iter(|| {
                let mut counter = Counter::new();
                counter.replay_all(events).expect("replay");
                black_box(counter.total)
            });
        });
    }
    group.finish();
}

fn bench_snapshot_restore(c: &mut Criterion) {
    let mut source = Counter::new();
    for i in 0..100 {
        source.add(Add { delta: i }).expect("record");
    }
    let snapshot = source.snap().expect("snap");

    c.bench_function("snapshot_restore", |b| {
        b.iter(|| {
            let mut counter = Counter::new();
            counter.restore(black_box(&snapshot)).expect("restore");
            black_box(counter.total)
        });
    });
}

criterion_group!(benches, bench_record, bench_replay, bench_snapshot_restore);
criterion_main!(benches);
