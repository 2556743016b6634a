//! Basic benchmarks for the `listeners` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};
use listeners::{Callback, Caller, EventDispatcher, HandlerPool, arg};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const LISTENER_COUNTS: &[usize] = &[1, 2, 10];

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("listeners_dispatch");

    for &count in LISTENER_COUNTS {
        let dispatcher = EventDispatcher::builder()
            .pool(Rc::new(HandlerPool::new()))
            .build();

        for _ in 0..count {
            dispatcher.on(
                "tick",
                Caller::none(),
                Callback::new(|call| {
                    black_box(call.len());
                }),
                None,
            );
        }

        group.bench_function(format!("event_{count}"), |b| {
            b.iter(|| black_box(dispatcher.event(black_box("tick"))));
        });

        let payload = arg(42_u64);
        group.bench_function(format!("event_with_{count}"), |b| {
            b.iter(|| black_box(dispatcher.event_with(black_box("tick"), Rc::clone(&payload))));
        });
    }

    // Steady state: every registration reuses the handler recovered by the previous removal.
    let dispatcher = EventDispatcher::builder()
        .pool(Rc::new(HandlerPool::new()))
        .build();
    let owner = Rc::new(());
    let callback = Callback::new(|_| {});

    group.bench_function("on_off_pooled", |b| {
        b.iter(|| {
            dispatcher.on("tick", Caller::of(&owner), callback.clone(), None);
            dispatcher.off("tick", &Caller::of(&owner), &callback);
        });
    });

    let dispatcher = EventDispatcher::builder()
        .pool(Rc::new(HandlerPool::new()))
        .build();

    group.bench_function("once_fire", |b| {
        b.iter(|| {
            dispatcher.once("tick", Caller::none(), callback.clone(), None);
            black_box(dispatcher.event("tick"));
        });
    });

    group.finish();
}
