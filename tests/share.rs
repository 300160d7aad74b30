mod generate_observable;
mod register_emissions;

use std::{cell::RefCell, rc::Rc, time::Duration};

use generate_observable::{generate_interval_observable, generate_u32_observable};
use register_emissions::register_emissions_subscriber;
use rxlite::{
    subscribe::{Subscriber, Teardown},
    Observable, ObservableExt, Subscribeable, Unsubscribeable,
};

#[test]
fn share_multicasts_one_execution() {
    let (observable, scheduler, stats) = generate_interval_observable(Duration::from_millis(10));
    let shared = observable.share();

    let (first, first_emissions) = register_emissions_subscriber();
    let (second, second_emissions) = register_emissions_subscriber();
    let first_sub = shared.subscribe(first);
    let second_sub = shared.subscribe(second);

    scheduler.advance_by(Duration::from_millis(30));
    assert_eq!(stats.subscribed.get(), 1);
    assert_eq!(first_emissions.nexts(), vec![0, 1, 2, 3]);
    assert_eq!(second_emissions.nexts(), vec![1, 2, 3]);

    first_sub.unsubscribe();
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(first_emissions.nexts(), vec![0, 1, 2, 3]);
    assert_eq!(second_emissions.nexts(), vec![1, 2, 3, 4]);
    assert_eq!(stats.torn_down.get(), 0);

    second_sub.unsubscribe();
    second_sub.unsubscribe();
    assert_eq!(stats.torn_down.get(), 1);
    assert_eq!(scheduler.pending(), 0);

    // Late subscriber restarts the source.
    let (third, third_emissions) = register_emissions_subscriber();
    let third_sub = shared.subscribe(third);
    assert_eq!(stats.subscribed.get(), 2);
    assert_eq!(third_emissions.nexts().len(), 1);
    third_sub.unsubscribe();
    assert_eq!(stats.torn_down.get(), 2);
}

#[test]
fn share_with_take_branches() {
    let (observable, scheduler, stats) = generate_interval_observable(Duration::from_millis(10));
    let shared = observable.share();

    let (evens, evens_emissions) = register_emissions_subscriber();
    let (odds, odds_emissions) = register_emissions_subscriber();
    shared.clone().filter(|v| v % 2 == 0).take(2).subscribe(evens);
    shared.filter(|v| v % 2 == 1).take(3).subscribe(odds);

    scheduler.advance_by(Duration::from_secs(1));

    assert_eq!(evens_emissions.nexts(), vec![0, 2]);
    assert_eq!(odds_emissions.nexts(), vec![1, 3, 5]);
    assert_eq!(evens_emissions.completes(), 1);
    assert_eq!(odds_emissions.completes(), 1);
    assert_eq!(stats.subscribed.get(), 1);
    assert_eq!(stats.torn_down.get(), 1, "source not released after both takes");
    assert_eq!(stats.last_emit.get(), Some(5));
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn synchronous_source_completes_every_shared_subscriber() {
    let (observable, stats) = generate_u32_observable(3);
    let shared = observable.share();

    let (first, first_emissions) = register_emissions_subscriber();
    let (second, second_emissions) = register_emissions_subscriber();
    shared.subscribe(first);
    shared.subscribe(second);

    // The source finished inside the first subscribe, the second one restarts it.
    assert_eq!(stats.subscribed.get(), 2);
    assert_eq!(first_emissions.nexts(), vec![0, 1, 2, 3]);
    assert_eq!(second_emissions.nexts(), vec![0, 1, 2, 3]);
    assert_eq!(first_emissions.completes(), 1);
    assert_eq!(second_emissions.completes(), 1);
}

#[test]
fn last_subscriber_leaving_during_emission_stops_source() {
    let (observable, stats) = generate_u32_observable(1_000_000);
    let (subscriber, emissions) = register_emissions_subscriber();

    observable.share().take(3).subscribe(subscriber);

    assert_eq!(emissions.nexts(), vec![0, 1, 2]);
    assert_eq!(emissions.completes(), 1);
    assert_eq!(stats.last_emit.get(), Some(2));
    assert_eq!(stats.torn_down.get(), 1);
}

#[test]
fn errors_are_shared() {
    let emitter: Rc<RefCell<Option<Subscriber<u32>>>> = Rc::new(RefCell::new(None));
    let emitter_c = Rc::clone(&emitter);
    let shared = Observable::new(move |o| {
        *emitter_c.borrow_mut() = Some(o);
        Teardown::Nil
    })
    .share();

    let (first, first_emissions) = register_emissions_subscriber();
    let (second, second_emissions) = register_emissions_subscriber();
    shared.subscribe(first);
    shared.subscribe(second);

    let source = emitter.borrow().clone();
    if let Some(source) = source {
        source.next(7);
        source.error(Rc::new(std::fmt::Error));
        source.next(8);
    }

    assert_eq!(first_emissions.nexts(), vec![7]);
    assert_eq!(second_emissions.nexts(), vec![7]);
    assert_eq!(first_emissions.errors().len(), 1);
    assert_eq!(second_emissions.errors().len(), 1);
}
