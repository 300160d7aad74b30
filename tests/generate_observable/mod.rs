use std::{cell::Cell, rc::Rc, time::Duration};

use rxlite::{
    scheduler::{Scheduler, VirtualScheduler},
    sources::poll_every,
    subscribe::{Subscriber, Teardown},
    Observable, Subscribeable, Unsubscribeable,
};

/// Counters shared between a generated observable and the test.
#[derive(Clone, Default)]
pub struct ProducerStats {
    /// How many times the producer ran.
    pub subscribed: Rc<Cell<u32>>,
    /// How many times its teardown ran.
    pub torn_down: Rc<Cell<u32>>,
    /// The last value it emitted.
    pub last_emit: Rc<Cell<Option<u32>>>,
}

/// Synchronously emits `0..=end` and completes, stopping as soon as the
/// subscriber is closed.
pub fn generate_u32_observable(end: u32) -> (Observable<u32>, ProducerStats) {
    let stats = ProducerStats::default();
    let stats_c = stats.clone();

    let observable = Observable::new(move |o: Subscriber<u32>| {
        stats_c.subscribed.set(stats_c.subscribed.get() + 1);

        for i in 0..=end {
            if o.is_closed() {
                break;
            }
            stats_c.last_emit.set(Some(i));
            o.next(i);
        }
        o.complete();

        let torn_down = Rc::clone(&stats_c.torn_down);
        Teardown::from_fn(move || torn_down.set(torn_down.get() + 1))
    });
    (observable, stats)
}

/// Emits an increasing counter, starting at 0, right away and then on every
/// `period` of a virtual clock.
pub fn generate_interval_observable(
    period: Duration,
) -> (Observable<u32>, VirtualScheduler, ProducerStats) {
    let scheduler = VirtualScheduler::new();
    let stats = ProducerStats::default();
    let stats_c = stats.clone();

    let counter = Rc::new(Cell::new(0u32));
    let ticks = poll_every(
        Rc::new(scheduler.clone()) as Rc<dyn Scheduler>,
        period,
        move || {
            let v = counter.get();
            counter.set(v + 1);
            v
        },
    );

    let observable = Observable::new(move |o: Subscriber<u32>| {
        stats_c.subscribed.set(stats_c.subscribed.get() + 1);
        let last_emit = Rc::clone(&stats_c.last_emit);
        let o_next = o.clone();
        let inner = Subscriber::new(
            move |v| {
                last_emit.set(Some(v));
                o_next.next(v);
            },
            {
                let o = o.clone();
                move |e| o.error(e)
            },
            {
                let o = o.clone();
                move || o.complete()
            },
        );

        let subscription = ticks.subscribe(inner);
        let torn_down = Rc::clone(&stats_c.torn_down);
        Teardown::from_fn(move || {
            subscription.unsubscribe();
            torn_down.set(torn_down.get() + 1);
        })
    });
    (observable, scheduler, stats)
}
