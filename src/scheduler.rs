//! The "run this after a delay" capability time based observables depend on.
//!
//! The observable core never sleeps or spawns on its own. Sources like
//! [`poll_every`](crate::sources::poll_every) take a [`Scheduler`] instead, so the
//! same pipeline runs on a `Tokio` event loop in production and on a virtual clock
//! in tests.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
    time::Duration,
};

use tracing::trace;

use crate::subscribe::Teardown;

/// A task handed to a [`Scheduler`].
pub type Task = Box<dyn FnOnce()>;

/// Runs tasks after a delay on the current thread.
pub trait Scheduler {
    /// Runs `task` once `delay` has elapsed.
    ///
    /// The returned teardown cancels the task if it has not run yet; running it
    /// afterwards does nothing.
    fn schedule(&self, delay: Duration, task: Task) -> Teardown;
}

/// Scheduler backed by `Tokio` timers.
///
/// Tasks are spawned with [`tokio::task::spawn_local`], so `schedule` must be
/// called from inside a [`tokio::task::LocalSet`]:
///
/// ```no_run
/// use std::{rc::Rc, time::Duration};
///
/// use rxlite::scheduler::{Scheduler, TokioScheduler};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let local = tokio::task::LocalSet::new();
///     local
///         .run_until(async {
///             let scheduler: Rc<dyn Scheduler> = Rc::new(TokioScheduler::new());
///             scheduler.schedule(Duration::from_millis(10), Box::new(|| println!("tick")));
///             tokio::time::sleep(Duration::from_millis(20)).await;
///         })
///         .await;
/// }
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    #[must_use]
    pub fn new() -> Self {
        TokioScheduler
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> Teardown {
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        Teardown::from_fn(move || handle.abort())
    }
}

type TaskKey = (Duration, u64);

#[derive(Default)]
struct VirtualClock {
    now: Cell<Duration>,
    seq: Cell<u64>,
    queue: RefCell<BTreeMap<TaskKey, Task>>,
}

/// Deterministic scheduler driven by a virtual clock.
///
/// Nothing runs until [`advance_by`](VirtualScheduler::advance_by) moves the clock.
/// Tasks due at the same instant run in the order they were scheduled.
///
/// ```
/// use std::{cell::Cell, rc::Rc, time::Duration};
///
/// use rxlite::scheduler::{Scheduler, VirtualScheduler};
///
/// let scheduler = VirtualScheduler::new();
/// let fired = Rc::new(Cell::new(false));
/// let fired_c = Rc::clone(&fired);
///
/// scheduler.schedule(Duration::from_secs(1), Box::new(move || fired_c.set(true)));
///
/// scheduler.advance_by(Duration::from_millis(999));
/// assert!(!fired.get());
/// scheduler.advance_by(Duration::from_millis(1));
/// assert!(fired.get());
/// ```
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    clock: Rc<VirtualClock>,
}

impl VirtualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now.get()
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.clock.queue.borrow().len()
    }

    /// Moves the clock forward by `by`, running every task that falls due on the
    /// way, including tasks scheduled by those tasks.
    pub fn advance_by(&self, by: Duration) {
        let target = self.now() + by;
        loop {
            let due = {
                let mut queue = self.clock.queue.borrow_mut();
                let next_at = queue.first_key_value().map(|(&(at, _), _)| at);
                match next_at {
                    Some(at) if at <= target => queue.pop_first(),
                    _ => None,
                }
            };
            let Some(((at, _), task)) = due else {
                break;
            };
            self.clock.now.set(at);
            trace!(at = ?at, "running virtual task");
            task();
        }
        self.clock.now.set(target);
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> Teardown {
        let seq = self.clock.seq.get();
        self.clock.seq.set(seq + 1);

        let key = (self.now() + delay, seq);
        self.clock.queue.borrow_mut().insert(key, task);

        let clock: Weak<VirtualClock> = Rc::downgrade(&self.clock);
        Teardown::from_fn(move || {
            if let Some(clock) = clock.upgrade() {
                let cancelled = clock.queue.borrow_mut().remove(&key);
                drop(cancelled);
            }
        })
    }
}
