//! The `observable` module provides the building blocks for creating and manipulating
//! observables.

use std::{
    error::Error,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use tracing::{debug, trace};

use crate::errors::{catch_transform, panic_message, RxError};
use crate::subscription::subscribe::{Subscribeable, Subscriber, Subscription, Teardown};

pub mod multicast;
pub mod sources;

type ProducerResult = Result<Teardown, Box<dyn Error>>;
type Producer<T> = Rc<dyn Fn(Subscriber<T>) -> ProducerResult>;

/// The `Observable` struct represents a lazy, repeatable source of values that can
/// be observed and transformed.
///
/// An `Observable` holds a single producer function. Nothing runs when it is
/// created; every call to `subscribe` invokes the producer again with a fresh
/// `Subscriber`, so each subscription is an independent execution.
///
/// Cloning an `Observable` is cheap: clones share the producer.
///
/// # Example: basic synchronous `Observable`
///
/// ```
/// use rxlite::subscribe::{Subscriber, Teardown};
/// use rxlite::{Observable, Subscribeable};
///
/// // Create a custom observable that emits values from 1 to 3.
/// let observable = Observable::new(|subscriber| {
///     for i in 1..=3 {
///         // Stop early if the subscriber went away.
///         if subscriber.is_closed() {
///             break;
///         }
///         subscriber.next(i);
///     }
///     subscriber.complete();
///
///     // Nothing to clean up.
///     Teardown::Nil
/// });
///
/// // Only `next` is required, `error` and `complete` default to no-ops.
/// let mut observer = Subscriber::on_next(|v: i32| println!("Emitted {}", v));
/// observer.on_complete(|| println!("Completed"));
///
/// // Observables are cold, without this call nothing is emitted.
/// observable.subscribe(observer);
/// ```
///
/// # Example: `Observable` with teardown
///
/// The teardown returned by the producer runs exactly once, when the subscription
/// is unsubscribed or right after the subscriber completes or errors.
///
/// ```
/// use std::{cell::Cell, rc::Rc};
///
/// use rxlite::subscribe::{Subscriber, Teardown};
/// use rxlite::{Observable, Subscribeable, Unsubscribeable};
///
/// let running = Rc::new(Cell::new(false));
/// let running_c = Rc::clone(&running);
///
/// let observable = Observable::new(move |_subscriber: Subscriber<u32>| {
///     running_c.set(true);
///     let running = Rc::clone(&running_c);
///     Teardown::from_fn(move || running.set(false))
/// });
///
/// let subscription = observable.subscribe(Subscriber::on_next(|_| {}));
/// assert!(running.get());
///
/// subscription.unsubscribe();
/// subscription.unsubscribe(); // No-op.
/// assert!(!running.get());
/// ```
///
/// # Example: `Observable` with error handling
///
/// A producer created with [`Observable::try_new`] can fail with `?`. The error is
/// delivered to the subscriber's `error` handler instead of propagating to the
/// caller of `subscribe`.
///
/// ```
/// use rxlite::subscribe::{Subscriber, Teardown};
/// use rxlite::{Observable, Subscribeable};
///
/// let observable = Observable::try_new(|subscriber| {
///     let n: i32 = "forty two".parse()?;
///     subscriber.next(n);
///     subscriber.complete();
///     Ok(Teardown::Nil)
/// });
///
/// observable.subscribe(Subscriber::new(
///     |v| println!("parsed {}", v),
///     |e| eprintln!("failed: {}", e),
///     || println!("done"),
/// ));
/// ```
pub struct Observable<T> {
    producer: Producer<T>,
}

impl<T> Observable<T> {
    /// Creates a new `Observable` with the provided subscribe function.
    ///
    /// The subscribe function receives the `Subscriber` to emit into and returns
    /// the [`Teardown`] to run when the subscription ends.
    pub fn new(sf: impl Fn(Subscriber<T>) -> Teardown + 'static) -> Self {
        Observable {
            producer: Rc::new(move |s| Ok(sf(s))),
        }
    }

    /// Creates a new `Observable` whose subscribe function may fail.
    ///
    /// An `Err` returned by `sf` is delivered to the subscriber as a terminal
    /// `error` notification.
    pub fn try_new(sf: impl Fn(Subscriber<T>) -> ProducerResult + 'static) -> Self {
        Observable {
            producer: Rc::new(sf),
        }
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            producer: Rc::clone(&self.producer),
        }
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&self, s: Subscriber<Self::ObsType>) -> Subscription {
        let subscription = s.subscription();
        let sink = s.clone();
        trace!("subscribing to observable");

        match panic::catch_unwind(AssertUnwindSafe(|| (self.producer)(s))) {
            Ok(Ok(teardown)) => subscription.add(teardown),
            Ok(Err(e)) => {
                debug!(error = %e, "producer failed during subscribe");
                sink.error(Rc::from(e));
            }
            Err(payload) => {
                let err = RxError::ProducerPanicked {
                    message: panic_message(payload.as_ref()),
                };
                debug!(error = %err, label = err.as_label(), "producer panicked during subscribe");
                sink.error(Rc::new(err));
            }
        }
        subscription
    }
}

impl<T> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

// Builds the subscriber an operator hands upstream: `next` is operator specific,
// `error` and `complete` are forwarded to `o`. Closing `o` closes the returned
// subscriber, which tears the upstream down even while it is still emitting.
fn forward<T, U>(o: &Subscriber<U>, next_fn: impl FnMut(T) + 'static) -> Subscriber<T>
where
    T: 'static,
    U: 'static,
{
    let o_cloned_e = o.clone();
    let o_cloned_c = o.clone();

    let u = Subscriber::new(
        next_fn,
        move |observable_error| {
            o_cloned_e.error(observable_error);
        },
        move || {
            o_cloned_c.complete();
        },
    );
    o.add_teardown(u.subscription());
    u
}

/// The `ObservableExt` trait provides the operators that can be applied to
/// observables.
///
/// Operators return a new `Observable`, so they chain left to right:
///
/// ```
/// use rxlite::sources::from_iter;
/// use rxlite::subscribe::Subscriber;
/// use rxlite::{ObservableExt, Subscribeable};
///
/// from_iter(vec![1, 2, 3, 4])
///     .filter(|v| v % 2 == 0)
///     .map(|v| format!("even {}", v))
///     .subscribe(Subscriber::on_next(|v| println!("{}", v)));
/// ```
///
/// A user supplied function that panics is reported downstream as an
/// [`RxError::TransformPanicked`] error and the upstream subscription is torn down.
pub trait ObservableExt<T: 'static>: Subscribeable<ObsType = T> {
    /// Calls `f` with a reference to every value, then forwards the value,
    /// errors and completion unchanged.
    fn tap<F>(self, f: F) -> Observable<T>
    where
        Self: Sized + 'static,
        F: Fn(&T) + 'static,
    {
        let f = Rc::new(f);
        Observable::new(move |o| {
            let f = Rc::clone(&f);
            let o_next = o.clone();

            let u = forward(&o, move |v| match catch_transform("tap", || f(&v)) {
                Ok(()) => o_next.next(v),
                Err(e) => o_next.error(e),
            });
            self.subscribe(u);
            Teardown::Nil
        })
    }

    /// Transforms the items emitted by the observable using a transformation
    /// function.
    fn map<U, F>(self, f: F) -> Observable<U>
    where
        Self: Sized + 'static,
        F: Fn(T) -> U + 'static,
        U: 'static,
    {
        let f = Rc::new(f);
        Observable::new(move |o| {
            let f = Rc::clone(&f);
            let o_next = o.clone();

            let u = forward(&o, move |v| match catch_transform("map", || f(v)) {
                Ok(t) => o_next.next(t),
                Err(e) => o_next.error(e),
            });
            self.subscribe(u);
            Teardown::Nil
        })
    }

    /// Like [`map`](ObservableExt::map), but the function may fail. An `Err` is
    /// delivered downstream as an error and the upstream is unsubscribed.
    fn try_map<U, E, F>(self, f: F) -> Observable<U>
    where
        Self: Sized + 'static,
        F: Fn(T) -> Result<U, E> + 'static,
        E: Error + 'static,
        U: 'static,
    {
        let f = Rc::new(f);
        Observable::new(move |o| {
            let f = Rc::clone(&f);
            let o_next = o.clone();

            let u = forward(&o, move |v| match catch_transform("try_map", || f(v)) {
                Ok(Ok(t)) => o_next.next(t),
                Ok(Err(e)) => o_next.error(Rc::new(e)),
                Err(e) => o_next.error(e),
            });
            self.subscribe(u);
            Teardown::Nil
        })
    }

    /// Filters the items emitted by the observable based on a predicate function.
    ///
    /// Only items for which the predicate function returns `true` will be emitted
    /// by the resulting observable.
    fn filter<P>(self, predicate: P) -> Observable<T>
    where
        Self: Sized + 'static,
        P: Fn(&T) -> bool + 'static,
    {
        let predicate = Rc::new(predicate);
        Observable::new(move |o| {
            let predicate = Rc::clone(&predicate);
            let o_next = o.clone();

            let u = forward(&o, move |v| {
                match catch_transform("filter", || predicate(&v)) {
                    Ok(true) => o_next.next(v),
                    Ok(false) => (),
                    Err(e) => o_next.error(e),
                }
            });
            self.subscribe(u);
            Teardown::Nil
        })
    }

    /// Like [`filter`](ObservableExt::filter), but the predicate may fail.
    fn try_filter<P, E>(self, predicate: P) -> Observable<T>
    where
        Self: Sized + 'static,
        P: Fn(&T) -> Result<bool, E> + 'static,
        E: Error + 'static,
    {
        let predicate = Rc::new(predicate);
        Observable::new(move |o| {
            let predicate = Rc::clone(&predicate);
            let o_next = o.clone();

            let u = forward(&o, move |v| {
                match catch_transform("try_filter", || predicate(&v)) {
                    Ok(Ok(true)) => o_next.next(v),
                    Ok(Ok(false)) => (),
                    Ok(Err(e)) => o_next.error(Rc::new(e)),
                    Err(e) => o_next.error(e),
                }
            });
            self.subscribe(u);
            Teardown::Nil
        })
    }

    /// Emits at most the first `n` items emitted by the observable, then
    /// completes and unsubscribes from the observable.
    ///
    /// The upstream is unsubscribed right after the `n`-th value is delivered, so a
    /// producer checking [`Subscriber::is_closed`] stops emitting immediately.
    /// If the source completes or errors first, that notification is forwarded.
    /// `take(0)` completes without subscribing to the source.
    fn take(self, n: usize) -> Observable<T>
    where
        Self: Sized + 'static,
    {
        Observable::new(move |o| {
            if n == 0 {
                o.complete();
                return Teardown::Nil;
            }
            let o_next = o.clone();
            let mut taken = 0;

            let u = forward(&o, move |v| {
                taken += 1;
                o_next.next(v);
                if taken == n {
                    trace!(n, "take limit reached");
                    // Completing `o` closes the upstream subscriber as well.
                    o_next.complete();
                }
            });
            self.subscribe(u);
            Teardown::Nil
        })
    }

    /// Applies `f` to this observable. Handy for reusing a chain of operators.
    ///
    /// ```
    /// use rxlite::sources::from_iter;
    /// use rxlite::{Observable, ObservableExt};
    ///
    /// fn evens(source: Observable<i32>) -> Observable<i32> {
    ///     source.filter(|v| v % 2 == 0)
    /// }
    ///
    /// let doubled_evens = from_iter(1..=10).pipe(evens).map(|v| v * 2);
    /// ```
    fn pipe<U, F>(self, f: F) -> Observable<U>
    where
        Self: Sized,
        F: FnOnce(Self) -> Observable<U>,
    {
        f(self)
    }

    /// Shares a single upstream subscription among all subscribers of the
    /// returned observable.
    ///
    /// See [`multicast::share`] for the exact reference counting rules.
    fn share(self) -> Observable<T>
    where
        Self: Sized + 'static,
        T: Clone,
    {
        multicast::share(self)
    }
}

impl<O, T: 'static> ObservableExt<T> for O where O: Subscribeable<ObsType = T> {}
