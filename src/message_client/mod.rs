//! A mocked message client and the message processing pipeline built on top of it.
//!
//! [`MockMessageClient`] pushes a randomly picked raw message into a callback on
//! every tick of a [`Scheduler`](crate::scheduler::Scheduler), until stopped.
//! [`client_observable`] wraps it in an `Observable` whose teardown stops the
//! client, and [`MessagePipeline`] turns the raw strings into typed [`Message`]s:
//!
//! ```text
//! client -> filter(valid json) -> map(parse) -> filter(is message) -> share
//!                                                                      |-> filter(string data) -> take(2)
//!                                                                      |-> filter(number data) -> take(3)
//! ```
//!
//! Once both branches have taken their messages the shared subscription loses its
//! last subscriber and the client is stopped.

mod client;
mod config;
mod message;
mod pipeline;

pub use client::*;
pub use config::*;
pub use message::*;
pub use pipeline::*;
