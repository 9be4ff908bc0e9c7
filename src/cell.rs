//! Mutex-protected value container.
//!
//! `AtomicCell` is the only way shared mutable state is touched inside this
//! crate: the observer registry, the composite disposable sets and the stashed
//! terminal event all live behind one.

use std::fmt::{Debug, Formatter};

use parking_lot::Mutex;

/// A single value guarded by a mutex.
///
/// Every accessor runs under the same lock, so `modify`, `with_value` and
/// `swap` are mutually exclusive across threads. The lock is never held
/// outside of the accessor call, which means a closure must not call back
/// into the same cell.
///
/// A panic raised inside a closure unwinds after the guard is dropped: the
/// cell stays usable and keeps whatever state the closure left behind.
///
/// # Example
///
/// ```rust
/// use rxsignal::cell::AtomicCell;
///
/// let cell = AtomicCell::new(1);
/// let doubled = cell.modify(|v| {
///   *v *= 2;
///   *v
/// });
/// assert_eq!(doubled, 2);
/// assert_eq!(cell.swap(10), 2);
/// assert_eq!(cell.with_value(|v| *v), 10);
/// ```
#[derive(Default)]
pub struct AtomicCell<T> {
  value: Mutex<T>,
}

impl<T> AtomicCell<T> {
  pub fn new(value: T) -> Self { Self { value: Mutex::new(value) } }

  /// Apply `f` to the protected value and return its result.
  #[inline]
  pub fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> R { f(&mut self.value.lock()) }

  /// Read the protected value under the lock.
  #[inline]
  pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R { f(&self.value.lock()) }

  /// Replace the protected value, returning the previous one.
  #[inline]
  pub fn swap(&self, value: T) -> T { std::mem::replace(&mut *self.value.lock(), value) }

  pub fn into_inner(self) -> T { self.value.into_inner() }
}

impl<T: Copy> AtomicCell<T> {
  #[inline]
  pub fn get(&self) -> T { *self.value.lock() }
}

impl<T> From<T> for AtomicCell<T> {
  fn from(value: T) -> Self { Self::new(value) }
}

impl<T: Debug> Debug for AtomicCell<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.value.try_lock() {
      Some(guard) => f.debug_struct("AtomicCell").field("value", &*guard).finish(),
      None => f.debug_struct("AtomicCell").field("value", &"<locked>").finish(),
    }
  }
}
