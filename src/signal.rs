//! Signal: a thread-safe, push-based broadcaster.
//!
//! Any number of producer threads send [`Event`]s into a signal and every
//! attached observer sees them in the same order, never concurrently. A signal
//! ends with at most one terminal event; after that its observers are
//! detached and the resources tied to its [`Lifetime`] are disposed.

use std::{
  fmt::{Debug, Formatter},
  sync::Arc,
};

use crate::{
  disposable::{AnyDisposable, Disposable},
  event::Event,
  lifetime::Lifetime,
  observer::Observer,
};

mod signal_core;

pub use signal_core::{SignalCore, TerminationState};

/// A handle to a broadcast signal.
///
/// Clones share the same underlying [`SignalCore`].
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxsignal::prelude::*;
///
/// let (signal, input) = Signal::<i32, String>::pipe();
/// let seen = Arc::new(Mutex::new(vec![]));
///
/// signal.observe_fn({
///   let seen = seen.clone();
///   move |event| seen.lock().unwrap().push(event)
/// });
///
/// input.send_value(1);
/// input.send_value(2);
/// input.send_completed();
/// input.send_value(3);
///
/// assert_eq!(
///   *seen.lock().unwrap(),
///   vec![Event::Value(1), Event::Value(2), Event::Completed]
/// );
/// assert!(signal.is_terminated());
/// ```
pub struct Signal<V, E> {
  core: Arc<SignalCore<V, E>>,
}

impl<V, E> Signal<V, E>
where
  V: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  /// Create a signal and the observer that feeds it.
  pub fn pipe() -> (Self, Observer<V, E>) {
    let core = Arc::new(SignalCore::new());
    let input = Observer::new({
      let core = core.clone();
      move |event| core.send(event)
    });
    (Self { core }, input)
  }

  /// Create a signal driven by `generator`.
  ///
  /// The generator receives the input observer and the signal's lifetime.
  /// Disposables added to that lifetime are released when the signal
  /// terminates.
  ///
  /// ```rust
  /// use std::sync::{
  ///   atomic::{AtomicBool, Ordering},
  ///   Arc,
  /// };
  ///
  /// use rxsignal::prelude::*;
  ///
  /// let cleaned_up = Arc::new(AtomicBool::new(false));
  /// let mut input = None;
  /// let signal = Signal::<(), ()>::new(|observer, lifetime| {
  ///   let cleaned_up = cleaned_up.clone();
  ///   lifetime.observe_ended(move || cleaned_up.store(true, Ordering::SeqCst));
  ///   input = Some(observer);
  /// });
  ///
  /// input.unwrap().send_interrupted();
  /// assert!(signal.is_terminated());
  /// assert!(cleaned_up.load(Ordering::SeqCst));
  /// ```
  pub fn new(generator: impl FnOnce(Observer<V, E>, &Lifetime)) -> Self {
    let (signal, input) = Self::pipe();
    generator(input, &signal.lifetime());
    signal
  }

  /// A signal that never sends any event.
  pub fn never() -> Self { Self { core: Arc::new(SignalCore::new()) } }

  /// A signal that is already interrupted.
  pub fn empty() -> Self {
    let (signal, input) = Self::pipe();
    input.send_interrupted();
    signal
  }

  /// Attach `observer`.
  ///
  /// The returned disposable detaches it; disposing it from inside the
  /// observer's own callback is fine. Returns `None` if the signal has
  /// already terminated, in which case `observer` has been sent
  /// [`Event::Interrupted`].
  pub fn observe(&self, observer: Observer<V, E>) -> Option<AnyDisposable> {
    let token = self.core.observe(observer)?;
    let core = Arc::downgrade(&self.core);
    Some(AnyDisposable::new(move || {
      if let Some(core) = core.upgrade() {
        core.remove_observer(token);
      }
    }))
  }

  /// Attach `observer` until `lifetime` ends.
  ///
  /// Returns `None` if either the signal has terminated or the lifetime has
  /// already ended; in the latter case the observer was attached and detached
  /// again without seeing any event.
  pub fn observe_during(&self, lifetime: &Lifetime, observer: Observer<V, E>) -> Option<AnyDisposable> {
    let subscription = Arc::new(self.observe(observer)?);
    let detach = lifetime.add(subscription.clone())?;
    Some(AnyDisposable::new(move || {
      subscription.dispose();
      detach.dispose();
    }))
  }

  pub fn observe_fn(&self, action: impl Fn(Event<V, E>) + Send + Sync + 'static) -> Option<AnyDisposable> {
    self.observe(Observer::new(action))
  }

  pub fn observe_values(&self, action: impl Fn(V) + Send + Sync + 'static) -> Option<AnyDisposable> {
    self.observe(Observer::values(action))
  }

  pub fn observe_failed(&self, action: impl Fn(E) + Send + Sync + 'static) -> Option<AnyDisposable> {
    self.observe_fn(move |event| {
      if let Event::Failed(e) = event {
        action(e)
      }
    })
  }

  pub fn observe_completed(&self, action: impl Fn() + Send + Sync + 'static) -> Option<AnyDisposable> {
    self.observe_fn(move |event| {
      if event.is_completed() {
        action()
      }
    })
  }

  pub fn observe_interrupted(&self, action: impl Fn() + Send + Sync + 'static) -> Option<AnyDisposable> {
    self.observe_fn(move |event| {
      if let Event::Interrupted = event {
        action()
      }
    })
  }

  /// Observe values as `Ok` and the failure as `Err`.
  pub fn observe_result(
    &self, action: impl Fn(Result<V, E>) + Send + Sync + 'static,
  ) -> Option<AnyDisposable> {
    self.observe_fn(move |event| {
      if let Some(result) = event.into_result() {
        action(result)
      }
    })
  }
}

impl<V, E> Signal<V, E> {
  /// The lifetime of this signal; it ends right after the terminal event.
  pub fn lifetime(&self) -> Lifetime { self.core.lifetime() }

  pub fn is_terminated(&self) -> bool { self.core.is_terminated() }

  pub fn observer_count(&self) -> usize { self.core.observer_count() }

  pub fn core(&self) -> &SignalCore<V, E> { &self.core }
}

impl<V, E> Clone for Signal<V, E> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<V, E> Debug for Signal<V, E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Signal").field("core", &self.core).finish()
  }
}
