//! Ready made observables.

use std::{
    cell::{Cell, RefCell},
    error::Error,
    rc::Rc,
    time::Duration,
};

use crate::{
    errors::catch_transform,
    scheduler::Scheduler,
    subscribe::{ObservableError, Subscriber, Teardown},
    Observable,
};

/// Shortest period [`poll_every`] polls at. A zero period would reschedule
/// forever within a single instant.
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// Emits every item of `items` in order, then completes.
///
/// `items` is cloned for each subscription, so the observable can be subscribed
/// any number of times. Emission stops as soon as the subscriber is closed, which
/// lets `take` cut off long (or endless) iterators.
///
/// ```
/// use rxlite::sources::from_iter;
/// use rxlite::subscribe::Subscriber;
/// use rxlite::Subscribeable;
///
/// let mut observer = Subscriber::on_next(|v: i32| println!("{}", v));
/// observer.on_complete(|| println!("complete"));
///
/// from_iter([1, 2, 3]).subscribe(observer);
/// ```
pub fn from_iter<I>(items: I) -> Observable<I::Item>
where
    I: IntoIterator + Clone + 'static,
    I::Item: 'static,
{
    Observable::new(move |o| {
        for v in items.clone() {
            if o.is_closed() {
                break;
            }
            o.next(v);
        }
        o.complete();
        Teardown::Nil
    })
}

/// Completes immediately without emitting.
pub fn empty<T: 'static>() -> Observable<T> {
    Observable::new(|o| {
        o.complete();
        Teardown::Nil
    })
}

/// Errors immediately with `err`. Every subscriber receives the same error value.
pub fn throw_error<T: 'static>(err: impl Error + 'static) -> Observable<T> {
    let err: ObservableError = Rc::new(err);
    Observable::new(move |o| {
        o.error(Rc::clone(&err));
        Teardown::Nil
    })
}

/// Emits `f()` right away and then once every `period`, until unsubscribed.
///
/// Timing is delegated to `scheduler`. Unsubscribing clears the polling flag and
/// cancels the pending timer, so no value is produced after teardown.
///
/// A `period` shorter than [`MIN_POLL_PERIOD`] is raised to it. If `f` panics, the
/// panic is delivered as an [`RxError::TransformPanicked`] error and polling stops.
///
/// [`RxError::TransformPanicked`]: crate::RxError::TransformPanicked
pub fn poll_every<T, F>(scheduler: Rc<dyn Scheduler>, period: Duration, f: F) -> Observable<T>
where
    T: 'static,
    F: Fn() -> T + 'static,
{
    let f = Rc::new(f);
    let period = period.max(MIN_POLL_PERIOD);
    Observable::new(move |o| {
        let poll = Rc::new(Poll {
            scheduler: Rc::clone(&scheduler),
            period,
            f: Rc::clone(&f) as Rc<dyn Fn() -> T>,
            running: Cell::new(true),
            timer: RefCell::new(Teardown::Nil),
        });
        poll.tick(o);

        Teardown::from_fn(move || poll.stop())
    })
}

struct Poll<T> {
    scheduler: Rc<dyn Scheduler>,
    period: Duration,
    f: Rc<dyn Fn() -> T>,
    running: Cell<bool>,
    timer: RefCell<Teardown>,
}

impl<T: 'static> Poll<T> {
    fn tick(self: &Rc<Self>, o: Subscriber<T>) {
        if !self.running.get() || o.is_closed() {
            return;
        }
        match catch_transform("poll_every", || (self.f)()) {
            Ok(v) => o.next(v),
            Err(e) => {
                o.error(e);
                return;
            }
        }
        // The value may have ended the subscription.
        if !self.running.get() || o.is_closed() {
            return;
        }

        let poll = Rc::clone(self);
        let timer = self
            .scheduler
            .schedule(self.period, Box::new(move || poll.tick(o)));
        *self.timer.borrow_mut() = timer;
    }

    fn stop(&self) {
        self.running.set(false);
        let timer = self.timer.replace(Teardown::Nil);
        timer.run();
    }
}
