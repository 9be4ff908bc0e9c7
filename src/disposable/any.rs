use std::fmt::{Debug, Formatter};

use super::{DisposeState, Disposable};
use crate::{cell::AtomicCell, state::AtomicStateMachine};

type Action = Box<dyn FnOnce() + Send>;

/// A disposable that runs a closure the first time it is disposed.
///
/// Dropping an `AnyDisposable` does not run the action; wrap it in a
/// [`ScopedDisposable`](super::ScopedDisposable) for that.
///
/// ```rust
/// use std::sync::{
///   atomic::{AtomicUsize, Ordering},
///   Arc,
/// };
///
/// use rxsignal::prelude::*;
///
/// let count = Arc::new(AtomicUsize::new(0));
/// let disposable = AnyDisposable::new({
///   let count = count.clone();
///   move || {
///     count.fetch_add(1, Ordering::SeqCst);
///   }
/// });
///
/// disposable.dispose();
/// disposable.dispose();
/// assert!(disposable.is_disposed());
/// assert_eq!(count.load(Ordering::SeqCst), 1);
/// ```
pub struct AnyDisposable {
  state: AtomicStateMachine<DisposeState>,
  action: AtomicCell<Option<Action>>,
}

impl AnyDisposable {
  pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
    Self {
      state: AtomicStateMachine::new(DisposeState::Active),
      action: AtomicCell::new(Some(Box::new(action))),
    }
  }

  /// A disposable with nothing to release; it only tracks the flag.
  pub fn empty() -> Self {
    Self { state: AtomicStateMachine::new(DisposeState::Active), action: AtomicCell::new(None) }
  }
}

impl Default for AnyDisposable {
  fn default() -> Self { Self::empty() }
}

impl Disposable for AnyDisposable {
  fn dispose(&self) {
    if self
      .state
      .try_transition(DisposeState::Active, DisposeState::Disposed)
    {
      // The action runs outside the cell lock so it may touch this disposable.
      if let Some(action) = self.action.swap(None) {
        action();
      }
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.state.is(DisposeState::Disposed) }
}

impl Debug for AnyDisposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnyDisposable")
      .field("is_disposed", &self.is_disposed())
      .finish()
  }
}
