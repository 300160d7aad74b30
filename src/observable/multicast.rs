//! Sharing one upstream subscription among several subscribers.
//!
//! The [`share`] operator turns a cold observable, where every subscriber gets its
//! own execution of the producer, into a reference counted multicast one:
//!
//! - the source is subscribed when the first subscriber arrives;
//! - every upstream notification is fanned out to all current subscribers;
//! - the source is unsubscribed when the last subscriber leaves;
//! - after the source completes or errors the shared state resets, so the next
//!   subscriber starts a fresh execution of the source.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use tracing::debug;

use crate::{
    subscribe::{ObservableError, Subscribeable, Subscriber, Subscription, Teardown},
    Observable, Unsubscribeable,
};

struct ShareState<T> {
    observers: RefCell<Vec<(u64, Subscriber<T>)>>,
    upstream: RefCell<Option<Subscription>>,
    next_key: Cell<u64>,
}

impl<T: Clone + 'static> ShareState<T> {
    fn new() -> Self {
        ShareState {
            observers: RefCell::new(Vec::with_capacity(4)),
            upstream: RefCell::new(None),
            next_key: Cell::new(0),
        }
    }

    fn is_connected(&self) -> bool {
        self.upstream.borrow().is_some()
    }

    fn register(&self, o: Subscriber<T>) -> u64 {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.observers.borrow_mut().push((key, o));
        key
    }

    fn remove(&self, key: u64) {
        let now_empty = {
            let mut observers = self.observers.borrow_mut();
            observers.retain(|(k, _)| *k != key);
            observers.is_empty()
        };
        if !now_empty {
            return;
        }
        let upstream = self.upstream.borrow_mut().take();
        if let Some(upstream) = upstream {
            debug!("last shared subscriber left, unsubscribing source");
            upstream.unsubscribe();
        }
    }

    // Observers registered at the time of the call. Fanning out over a snapshot
    // lets handlers subscribe or unsubscribe while we iterate.
    fn snapshot(&self) -> Vec<Subscriber<T>> {
        self.observers
            .borrow()
            .iter()
            .map(|(_, o)| o.clone())
            .collect()
    }

    fn emit(&self, v: T) {
        for o in self.snapshot() {
            // Unsubscribed observers are closed and ignore the value.
            o.next(v.clone());
        }
    }

    // Drops the connection and hands back the observers that should get the
    // terminal notification.
    fn reset(&self) -> Vec<Subscriber<T>> {
        self.upstream.borrow_mut().take();
        let observers = std::mem::take(&mut *self.observers.borrow_mut());
        observers.into_iter().map(|(_, o)| o).collect()
    }

    fn error(&self, observable_error: ObservableError) {
        for o in self.reset() {
            o.error(Rc::clone(&observable_error));
        }
    }

    fn complete(&self) {
        for o in self.reset() {
            o.complete();
        }
    }
}

fn connect<S, T>(state: &Rc<ShareState<T>>, source: &S)
where
    S: Subscribeable<ObsType = T>,
    T: Clone + 'static,
{
    let s_next = Rc::clone(state);
    let s_error = Rc::clone(state);
    let s_complete = Rc::clone(state);

    let upstream = Subscriber::new(
        move |v| s_next.emit(v),
        move |observable_error| s_error.error(observable_error),
        move || s_complete.complete(),
    );

    // Store the handle before subscribing so that a synchronous source can be
    // cut off if every subscriber leaves while it is still emitting.
    *state.upstream.borrow_mut() = Some(upstream.subscription());
    debug!("first shared subscriber arrived, subscribing source");
    source.subscribe(upstream);
}

/// Shares a single subscription to `source` among all subscribers of the returned
/// observable.
///
/// Values emitted before a subscriber arrives are not replayed to it.
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::subscribe::{Subscriber, Teardown};
/// use rxlite::{Observable, ObservableExt, Subscribeable, Unsubscribeable};
///
/// let subscriptions = Rc::new(RefCell::new(0));
/// let subscriptions_c = Rc::clone(&subscriptions);
///
/// let source = Observable::new(move |_: Subscriber<i32>| {
///     *subscriptions_c.borrow_mut() += 1;
///     Teardown::Nil
/// })
/// .share();
///
/// let first = source.subscribe(Subscriber::on_next(|_| {}));
/// let second = source.subscribe(Subscriber::on_next(|_| {}));
/// assert_eq!(*subscriptions.borrow(), 1);
///
/// first.unsubscribe();
/// second.unsubscribe();
/// ```
pub fn share<S, T>(source: S) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + 'static,
    T: Clone + 'static,
{
    let state = Rc::new(ShareState::new());

    Observable::new(move |o: Subscriber<T>| {
        let key = state.register(o.clone());

        // Attach the removal before connecting: a synchronous source may end this
        // subscription (say, through `take`) while it is still emitting.
        let state_c = Rc::clone(&state);
        o.add_teardown(Teardown::from_fn(move || state_c.remove(key)));

        if !o.is_closed() && !state.is_connected() {
            connect(&state, &source);
        }
        Teardown::Nil
    })
}
