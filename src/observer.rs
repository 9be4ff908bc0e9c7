//! Observer: the consumer side of a signal.
//!
//! An observer is a plain callback over [`Event`]. Its identity inside a
//! signal is the removal token it was registered under, nothing else; the
//! same observer may be attached to several signals.

use std::{
  fmt::{Debug, Formatter},
  sync::Arc,
};

use crate::event::Event;

/// A cloneable, thread-safe event callback.
///
/// The input end of [`Signal::pipe`](crate::signal::Signal::pipe) is an
/// `Observer` too: sending into it forwards to the signal.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxsignal::prelude::*;
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let observer: Observer<i32, ()> = Observer::values({
///   let seen = seen.clone();
///   move |v: i32| seen.lock().unwrap().push(v)
/// });
///
/// observer.send_value(1);
/// observer.send_completed();
/// assert_eq!(*seen.lock().unwrap(), vec![1]);
/// ```
pub struct Observer<V, E> {
  action: Arc<dyn Fn(Event<V, E>) + Send + Sync>,
}

impl<V, E> Observer<V, E> {
  pub fn new(action: impl Fn(Event<V, E>) + Send + Sync + 'static) -> Self {
    Self { action: Arc::new(action) }
  }

  /// An observer that only reacts to values.
  pub fn values(action: impl Fn(V) + Send + Sync + 'static) -> Self
  where
    V: 'static,
    E: 'static,
  {
    Self::new(move |event| {
      if let Event::Value(v) = event {
        action(v)
      }
    })
  }

  #[inline]
  pub fn send(&self, event: Event<V, E>) { (self.action)(event) }

  #[inline]
  pub fn send_value(&self, value: V) { self.send(Event::Value(value)) }

  #[inline]
  pub fn send_failed(&self, error: E) { self.send(Event::Failed(error)) }

  #[inline]
  pub fn send_completed(&self) { self.send(Event::Completed) }

  #[inline]
  pub fn send_interrupted(&self) { self.send(Event::Interrupted) }
}

impl<V, E> Clone for Observer<V, E> {
  fn clone(&self) -> Self { Self { action: self.action.clone() } }
}

impl<V, E> Debug for Observer<V, E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Observer")
      .field("action", &Arc::as_ptr(&self.action))
      .finish()
  }
}
