//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Primitives
pub use crate::bag::{Bag, RemovalToken};
pub use crate::cell::AtomicCell;
// Disposables
pub use crate::disposable::*;
// Event grammar
pub use crate::event::Event;
// Lifetimes
pub use crate::lifetime::{Ended, Lifetime, LifetimeToken};
// Observer
pub use crate::observer::Observer;
// Signal
pub use crate::signal::{Signal, SignalCore, TerminationState};
pub use crate::state::{AtomicState, AtomicStateMachine};
