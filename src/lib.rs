//! # rxsignal: thread-safe broadcast signals
//!
//! The concurrency core of a reactive-stream library: a [`Signal`] into which
//! any number of producer threads push [`Event`]s and to which any number of
//! observers subscribe.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxsignal::prelude::*;
//!
//! let (signal, input) = Signal::<i32, String>::pipe();
//! let sum = Arc::new(Mutex::new(0));
//!
//! let subscription = signal.observe_values({
//!   let sum = sum.clone();
//!   move |v| *sum.lock().unwrap() += v
//! });
//!
//! input.send_value(1);
//! input.send_value(2);
//! subscription.unwrap().dispose();
//! input.send_value(3);
//!
//! assert_eq!(*sum.lock().unwrap(), 3);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Signal`] | Broadcasts events to its observers, serialized and in order |
//! | [`Event`] | `Value`, then at most one of `Failed`, `Completed`, `Interrupted` |
//! | [`Observer`] | A thread-safe event callback |
//! | [`Disposable`] | A resource with one idempotent release |
//! | [`Lifetime`] | "Has the owner gone away", backed by a composite disposable |
//!
//! ## Guarantees
//!
//! - Every observer sees events in send order, and no two events are ever
//!   delivered concurrently by one signal.
//! - At most one terminal event is delivered, exactly once, even when several
//!   threads race to terminate or an observer terminates the signal from
//!   inside its own callback.
//! - A signal's resources are disposed exactly once, right after the terminal
//!   event.
//!
//! [`Signal`]: signal::Signal
//! [`Event`]: event::Event
//! [`Observer`]: observer::Observer
//! [`Disposable`]: disposable::Disposable
//! [`Lifetime`]: lifetime::Lifetime

pub mod bag;
pub mod cell;
pub mod disposable;
pub mod event;
pub mod lifetime;
pub mod observer;
pub mod prelude;
pub mod signal;
pub mod state;

// Re-export the prelude module
pub use prelude::*;
