use std::fmt::{Debug, Formatter};

use super::{DisposeState, Disposable};
use crate::{cell::AtomicCell, state::AtomicStateMachine};

/// Holds at most one inner disposable at a time.
///
/// Replacing the inner disposable disposes the previous one. After the serial
/// disposable itself is disposed, any inner disposable set on it is disposed
/// right away.
pub struct SerialDisposable {
  state: AtomicStateMachine<DisposeState>,
  inner: AtomicCell<Option<Box<dyn Disposable>>>,
}

impl SerialDisposable {
  pub fn new() -> Self {
    Self { state: AtomicStateMachine::new(DisposeState::Active), inner: AtomicCell::new(None) }
  }

  /// Install `disposable`, disposing whatever was there before.
  pub fn set(&self, disposable: impl Disposable + 'static) {
    let previous = self.inner.swap(Some(Box::new(disposable)));
    if let Some(previous) = previous {
      previous.dispose();
    }
    if self.is_disposed() {
      // Lost the race with `dispose`: whoever swaps the value out releases it.
      if let Some(current) = self.inner.swap(None) {
        current.dispose();
      }
    }
  }

  /// Dispose and remove the current inner disposable, if any.
  pub fn clear(&self) {
    if let Some(current) = self.inner.swap(None) {
      current.dispose();
    }
  }
}

impl Default for SerialDisposable {
  fn default() -> Self { Self::new() }
}

impl Disposable for SerialDisposable {
  fn dispose(&self) {
    if self
      .state
      .try_transition(DisposeState::Active, DisposeState::Disposed)
    {
      self.clear();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.state.is(DisposeState::Disposed) }
}

impl Debug for SerialDisposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SerialDisposable")
      .field("is_disposed", &self.is_disposed())
      .finish()
  }
}
