use std::{
  fmt::{Debug, Formatter},
  panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
  sync::Arc,
};

use super::{AnyDisposable, Disposable};
use crate::{bag::Bag, cell::AtomicCell};

type Members = Option<Bag<Box<dyn Disposable>>>;

/// A set of disposables released together, exactly once.
///
/// Clones share the same set. Once the composite is disposed, anything added
/// to it is disposed immediately instead of being stored.
///
/// # Design
///
/// The members live in a [`Bag`] behind an [`AtomicCell`]; `None` marks the
/// disposed state. Disposal swaps the bag out in one step, so exactly one
/// caller ever sees the members, and they are released outside the lock.
/// A member that panics while disposing does not stop the rest; the first
/// panic is re-raised once every member has been disposed.
///
/// ```rust
/// use std::sync::{
///   atomic::{AtomicUsize, Ordering},
///   Arc,
/// };
///
/// use rxsignal::prelude::*;
///
/// let released = Arc::new(AtomicUsize::new(0));
/// let composite = CompositeDisposable::new();
/// for _ in 0..3 {
///   let released = released.clone();
///   composite.add_action(move || {
///     released.fetch_add(1, Ordering::SeqCst);
///   });
/// }
///
/// composite.dispose();
/// composite.dispose();
/// assert_eq!(released.load(Ordering::SeqCst), 3);
///
/// // Late additions are released on the spot.
/// let late = composite.add_action({
///   let released = released.clone();
///   move || {
///     released.fetch_add(1, Ordering::SeqCst);
///   }
/// });
/// assert!(late.is_none());
/// assert_eq!(released.load(Ordering::SeqCst), 4);
/// ```
#[derive(Clone)]
pub struct CompositeDisposable(Arc<AtomicCell<Members>>);

impl CompositeDisposable {
  pub fn new() -> Self { Self(Arc::new(AtomicCell::new(Some(Bag::new())))) }

  /// Store `disposable` until the composite is disposed.
  ///
  /// Returns a handle that detaches it again without disposing it, or `None`
  /// if the composite was already disposed, in which case `disposable` has
  /// been disposed already.
  pub fn add(&self, disposable: impl Disposable + 'static) -> Option<AnyDisposable> {
    let boxed: Box<dyn Disposable> = Box::new(disposable);
    let added = self.0.modify(|members| match members {
      Some(bag) => Ok(bag.insert(boxed)),
      None => Err(boxed),
    });

    match added {
      Ok(token) => {
        let members = Arc::downgrade(&self.0);
        Some(AnyDisposable::new(move || {
          if let Some(members) = members.upgrade() {
            let detached = members.modify(|m| m.as_mut().and_then(|bag| bag.remove(token)));
            drop(detached);
          }
        }))
      }
      Err(rejected) => {
        rejected.dispose();
        None
      }
    }
  }

  /// Shorthand for adding an [`AnyDisposable`] built from `action`.
  pub fn add_action(&self, action: impl FnOnce() + Send + 'static) -> Option<AnyDisposable> {
    self.add(AnyDisposable::new(action))
  }

  /// Number of members still held.
  pub fn len(&self) -> usize { self.0.with_value(|m| m.as_ref().map_or(0, Bag::len)) }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Default for CompositeDisposable {
  fn default() -> Self { Self::new() }
}

impl Disposable for CompositeDisposable {
  fn dispose(&self) {
    let Some(members) = self.0.swap(None) else { return };
    let mut first_panic = None;
    for member in members {
      if let Err(panic) = catch_unwind(AssertUnwindSafe(|| member.dispose())) {
        first_panic.get_or_insert(panic);
      }
    }
    if let Some(panic) = first_panic {
      resume_unwind(panic);
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.with_value(Option::is_none) }
}

impl Debug for CompositeDisposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CompositeDisposable")
      .field("is_disposed", &self.is_disposed())
      .field("len", &self.len())
      .finish()
  }
}
