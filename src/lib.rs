//! `rxlite` is a minimal, single-threaded implementation of reactive extensions.
//!
//! It provides the push based core of the pattern and a handful of operators:
//!
//! - [`Observable`]: a lazy, repeatable producer of values. The producer runs once
//!   per subscription and hands back the [`Teardown`](subscribe::Teardown) to run
//!   when that subscription ends.
//! - [`Subscriber`](subscribe::Subscriber): the observer handed to the producer,
//!   built from `next`/`error`/`complete` callbacks or from an [`Observer`].
//! - [`Subscription`](subscribe::Subscription): the handle that cancels one
//!   execution.
//! - [`ObservableExt`]: `tap`, `filter`, `map`, `take`, `share` and friends.
//!
//! Everything runs on the current thread. Values are delivered synchronously, in
//! the order the producer emits them, inside whatever call triggered the emission.
//! Time based sources take a [`Scheduler`](scheduler::Scheduler) rather than
//! spawning on their own.
//!
//! # Example
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxlite::sources::from_iter;
//! use rxlite::subscribe::Subscriber;
//! use rxlite::{ObservableExt, Subscribeable};
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let seen_c = Rc::clone(&seen);
//!
//! let mut observer = Subscriber::on_next(move |v| seen_c.borrow_mut().push(v));
//! observer.on_complete(|| println!("complete"));
//!
//! from_iter(vec!["a", "b", "c"]).take(2).subscribe(observer);
//!
//! assert_eq!(*seen.borrow(), vec!["a", "b"]);
//! ```

mod errors;
pub mod message_client;
mod observable;
pub mod observer;
pub mod scheduler;
pub mod sink;
mod subscription;

pub use errors::*;
pub use observable::{multicast, sources, Observable, ObservableExt};
pub use observer::Observer;
pub use subscription::subscribe;
pub use subscription::subscribe::{Subscribeable, Unsubscribeable};
