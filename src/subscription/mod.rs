//! Provides structures and traits related to subscription management.
//!
//! This module includes `Subscriber` for handling observed values, errors and
//! completions, `Subscription` for cancelling one execution of an observable, and
//! `Teardown` for the cleanup logic a producer hands back when it is subscribed.
pub mod subscribe;
