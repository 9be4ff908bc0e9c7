//! Resource-lifecycle primitives.
//!
//! A [`Disposable`] is one cancellable effect. Every implementation in this
//! module releases its resource at most once, no matter how many threads call
//! [`dispose`](Disposable::dispose) or how often.

use std::sync::Arc;

use crate::state::AtomicState;

mod any;
mod composite;
mod scoped;
mod serial;

pub use any::AnyDisposable;
pub use composite::CompositeDisposable;
pub use scoped::ScopedDisposable;
pub use serial::SerialDisposable;

/// A resource with one idempotent release operation.
pub trait Disposable: Send + Sync {
  /// Release the resource. Calls after the first are no-ops.
  fn dispose(&self);

  fn is_disposed(&self) -> bool;
}

impl<D: Disposable + ?Sized> Disposable for Box<D> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

impl<D: Disposable + ?Sized> Disposable for Arc<D> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

/// Two-state lifecycle shared by the single-resource disposables.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum DisposeState {
  Active,
  Disposed,
}

impl AtomicState for DisposeState {
  fn into_raw(self) -> u8 { self as u8 }

  fn from_raw(raw: u8) -> Self {
    match raw {
      0 => DisposeState::Active,
      _ => DisposeState::Disposed,
    }
  }
}
