use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    error::Error,
    fmt,
    rc::Rc,
};

use tracing::trace;

use crate::observer::Observer;

/// Error value carried by the `error` channel of every observable.
///
/// Errors are shared rather than cloned so the same failure can be fanned out to
/// several observers by `share()`.
pub type ObservableError = Rc<dyn Error>;

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type ObsType;

    /// Subscribes to the observable stream and specifies how to handle emitted values.
    ///
    /// The producer runs synchronously inside this call. Whatever it emits before
    /// returning is delivered before `subscribe` returns.
    ///
    /// The returned `Subscription` is the only way to cancel this particular
    /// execution. Dropping it does **not** unsubscribe.
    fn subscribe(&self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, allowing the clean release of resources
/// associated with a subscription.
pub trait Unsubscribeable {
    /// Closes the subscription and runs its teardown logic.
    ///
    /// Calling this more than once, or from inside one of the subscriber's own
    /// handlers, is allowed. Teardown logic runs only on the first call.
    fn unsubscribe(&self);
}

type NextFn<T> = Box<dyn FnMut(T)>;
type CompleteFn = Box<dyn FnMut()>;
type ErrorFn = Box<dyn FnMut(ObservableError)>;

/// Cleanup logic attached to a subscription.
///
/// A producer returns one of these from its subscribe function. It runs exactly
/// once, either when the subscription is unsubscribed or right after the
/// subscriber receives `error` or `complete`.
#[derive(Default)]
pub enum Teardown {
    /// No cleanup needed.
    #[default]
    Nil,

    /// If one subscription depends on another. Wrapped subscription's unsubscribe
    /// will be called upon teardown.
    Wrapped(Subscription),

    /// Teardown defined by a function.
    Logic(Box<dyn FnOnce()>),
}

impl Teardown {
    /// Wraps a closure as teardown logic.
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Teardown::Logic(Box::new(f))
    }

    pub(crate) fn run(self) {
        match self {
            Teardown::Nil => (),
            Teardown::Logic(fnc) => fnc(),
            Teardown::Wrapped(subscription) => subscription.unsubscribe(),
        }
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Teardown::Wrapped(subscription)
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Teardown::Nil => f.write_str("Teardown::Nil"),
            Teardown::Wrapped(s) => f.debug_tuple("Teardown::Wrapped").field(s).finish(),
            Teardown::Logic(_) => f.write_str("Teardown::Logic(..)"),
        }
    }
}

// Closed flag plus the teardowns collected for one execution of a producer.
// Shared by the `Subscriber` handed to the producer and the `Subscription`
// handed to the caller.
struct SubscriptionState {
    closed: Cell<bool>,
    teardowns: RefCell<Vec<Teardown>>,
}

impl SubscriptionState {
    fn new() -> Rc<Self> {
        Rc::new(SubscriptionState {
            closed: Cell::new(false),
            teardowns: RefCell::new(Vec::new()),
        })
    }

    fn add(&self, teardown: Teardown) {
        if let Teardown::Nil = teardown {
            return;
        }
        if self.closed.get() {
            teardown.run();
            return;
        }
        self.teardowns.borrow_mut().push(teardown);
    }

    fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        // Release the borrow before running anything: a teardown may attach
        // another teardown to this (now closed) state.
        let teardowns = std::mem::take(&mut *self.teardowns.borrow_mut());
        trace!(count = teardowns.len(), "running teardowns");
        for teardown in teardowns {
            teardown.run();
        }
    }
}

/// Represents one execution of an observable, allowing control over it.
///
/// A `Subscription` is returned by [`Subscribeable::subscribe`]. It owns the
/// teardown logic returned by the producer and a closed flag. Use
/// [`Unsubscribeable::unsubscribe`] to cancel it.
pub struct Subscription {
    state: Rc<SubscriptionState>,
}

impl Subscription {
    /// Returns `true` once the subscription has been unsubscribed or its
    /// subscriber has received a terminal notification.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.closed.get()
    }

    /// Attaches additional teardown logic. If the subscription is already closed
    /// the teardown runs immediately.
    pub fn add(&self, teardown: impl Into<Teardown>) {
        self.state.add(teardown.into());
    }

    pub(crate) fn handle(&self) -> Subscription {
        Subscription {
            state: Rc::clone(&self.state),
        }
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(&self) {
        self.state.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

enum Signal<T> {
    Next(T),
    Error(ObservableError),
    Complete,
}

struct Handlers<T> {
    next_fn: NextFn<T>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
}

struct SubscriberInner<T> {
    handlers: RefCell<Handlers<T>>,
    // Signals emitted re-entrantly while a handler is running.
    pending: RefCell<VecDeque<Signal<T>>>,
    stopped: Cell<bool>,
    state: Rc<SubscriptionState>,
}

/// A type that acts as an observer, allowing users to handle emitted values, errors,
/// and completion when subscribing to an `Observable`.
///
/// Users create a `Subscriber` from bare callbacks; missing `error` and `complete`
/// handlers default to no-ops. Producers receive the `Subscriber` and push values
/// into it with [`next`](Subscriber::next), [`error`](Subscriber::error) and
/// [`complete`](Subscriber::complete).
///
/// A `Subscriber` guards its handlers:
///
/// - after `error` or `complete` nothing else is delivered and its subscription
///   closes, running the producer's teardown;
/// - after its subscription is unsubscribed nothing else is delivered;
/// - a signal emitted into it while one of its own handlers is still running is
///   queued and delivered, in order, once that handler returns.
///
/// Cloning a `Subscriber` clones the handle; both clones feed the same handlers and
/// belong to the same subscription.
pub struct Subscriber<NextFnType> {
    inner: Rc<SubscriberInner<NextFnType>>,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` instance with custom handling functions for emitted
    /// values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static,
        error_fn: impl FnMut(ObservableError) + 'static,
        complete_fn: impl FnMut() + 'static,
    ) -> Self {
        Self::from_handlers(Handlers {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
        })
    }

    /// Create a new Subscriber with the provided `next` function.
    ///
    /// `error` and `complete` are no-ops until set with [`on_error`] and
    /// [`on_complete`].
    ///
    /// [`on_error`]: Subscriber::on_error
    /// [`on_complete`]: Subscriber::on_complete
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static) -> Self {
        Self::from_handlers(Handlers {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
        })
    }

    /// Wraps a full [`Observer`] implementation.
    pub fn from_observer<O>(observer: O) -> Self
    where
        O: Observer<NextFnType = NextFnType> + 'static,
        NextFnType: 'static,
    {
        let o_shared = Rc::new(RefCell::new(observer));
        let o_cloned_e = Rc::clone(&o_shared);
        let o_cloned_c = Rc::clone(&o_shared);

        Subscriber::new(
            move |v| o_shared.borrow_mut().next(v),
            move |e| o_cloned_e.borrow_mut().error(e),
            move || o_cloned_c.borrow_mut().complete(),
        )
    }

    fn from_handlers(handlers: Handlers<NextFnType>) -> Self {
        Subscriber {
            inner: Rc::new(SubscriberInner {
                handlers: RefCell::new(handlers),
                pending: RefCell::new(VecDeque::new()),
                stopped: Cell::new(false),
                state: SubscriptionState::new(),
            }),
        }
    }

    /// Set the completion function for the Subscriber.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static) {
        self.inner.handlers.borrow_mut().complete_fn = Some(Box::new(complete_fn));
    }

    /// Set the error-handling function for the Subscriber.
    pub fn on_error(&mut self, error_fn: impl FnMut(ObservableError) + 'static) {
        self.inner.handlers.borrow_mut().error_fn = Some(Box::new(error_fn));
    }

    /// Delivers a value, unless the subscriber is closed.
    pub fn next(&self, v: NextFnType) {
        if self.is_closed() {
            return;
        }
        self.dispatch(Signal::Next(v));
    }

    /// Delivers a terminal error, unless the subscriber is closed.
    pub fn error(&self, observable_error: ObservableError) {
        if self.is_closed() {
            return;
        }
        self.inner.stopped.set(true);
        self.dispatch(Signal::Error(observable_error));
    }

    /// Delivers terminal completion, unless the subscriber is closed.
    pub fn complete(&self) {
        if self.is_closed() {
            return;
        }
        self.inner.stopped.set(true);
        self.dispatch(Signal::Complete);
    }

    /// Returns `true` after a terminal notification or after the subscription was
    /// unsubscribed.
    ///
    /// Long running producers should check this to stop emitting:
    ///
    /// ```text
    /// Observable::new(|subscriber| {
    ///     for v in values {
    ///         if subscriber.is_closed() { break; }
    ///         subscriber.next(v);
    ///     }
    ///     // ...
    /// });
    /// ```
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.stopped.get() || self.inner.state.closed.get()
    }

    /// Attaches teardown logic to this subscriber's subscription. Runs immediately
    /// if the subscription is already closed.
    pub fn add_teardown(&self, teardown: impl Into<Teardown>) {
        self.inner.state.add(teardown.into());
    }

    /// Handle to the subscription this subscriber belongs to.
    pub(crate) fn subscription(&self) -> Subscription {
        Subscription {
            state: Rc::clone(&self.inner.state),
        }
    }

    fn dispatch(&self, signal: Signal<NextFnType>) {
        let Ok(mut handlers) = self.inner.handlers.try_borrow_mut() else {
            // One of our handlers is running further up the stack. It drains the
            // queue before returning.
            self.inner.pending.borrow_mut().push_back(signal);
            return;
        };

        let mut terminated = false;
        let mut current = Some(signal);
        while let Some(signal) = current.take() {
            // Signals queued behind a terminal one, or left over from a handler
            // that panicked, are dropped.
            let unsubscribed = terminated || self.inner.state.closed.get();
            match signal {
                Signal::Next(v) => {
                    if !unsubscribed {
                        (handlers.next_fn)(v);
                    }
                }
                Signal::Error(e) => {
                    terminated = true;
                    if let (false, Some(efn)) = (unsubscribed, &mut handlers.error_fn) {
                        (efn)(e);
                    }
                }
                Signal::Complete => {
                    terminated = true;
                    if let (false, Some(cfn)) = (unsubscribed, &mut handlers.complete_fn) {
                        (cfn)();
                    }
                }
            }
            current = self.inner.pending.borrow_mut().pop_front();
        }
        drop(handlers);

        if terminated {
            self.inner.state.close();
        }
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Subscriber {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("closed", &self.is_closed())
            .finish()
    }
}
