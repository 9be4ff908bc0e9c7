//! Lifetimes: an observable "has the owner gone away" condition.
//!
//! A [`Lifetime`] is a read-only view over a [`CompositeDisposable`]. It ends
//! when that composite is disposed, which happens when the paired
//! [`LifetimeToken`] is released or dropped, or when the composite is disposed
//! directly (a signal's lifetime ends when the signal terminates).

use std::{
  fmt::{Debug, Formatter},
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::channel::oneshot;
use once_cell::sync::Lazy;
use pin_project_lite::pin_project;

use crate::disposable::{AnyDisposable, CompositeDisposable, Disposable};

static ENDED: Lazy<Lifetime> = Lazy::new(|| {
  let (lifetime, token) = Lifetime::make();
  token.release();
  lifetime
});

/// A read-only view of when some owner goes away.
#[derive(Clone)]
pub struct Lifetime {
  disposables: CompositeDisposable,
}

/// The owning end of a [`Lifetime`] made with [`Lifetime::make`].
///
/// Dropping the token ends the lifetime; [`release`](Self::release) does the
/// same explicitly.
#[must_use = "dropping the token ends its lifetime immediately"]
pub struct LifetimeToken {
  disposables: CompositeDisposable,
}

impl Lifetime {
  /// Create a lifetime together with the token that owns it.
  pub fn make() -> (Lifetime, LifetimeToken) {
    let disposables = CompositeDisposable::new();
    (Lifetime { disposables: disposables.clone() }, LifetimeToken { disposables })
  }

  /// A lifetime that has already ended.
  pub fn empty() -> Lifetime { ENDED.clone() }

  pub fn has_ended(&self) -> bool { self.disposables.is_disposed() }

  /// Run `action` once the lifetime ends.
  ///
  /// If it has already ended, `action` runs immediately and `None` is
  /// returned. Otherwise the returned handle cancels the registration.
  pub fn observe_ended(&self, action: impl FnOnce() + Send + 'static) -> Option<AnyDisposable> {
    self.disposables.add_action(action)
  }

  /// Dispose `disposable` when the lifetime ends, or immediately if it has
  /// already ended.
  pub fn add(&self, disposable: impl Disposable + 'static) -> Option<AnyDisposable> {
    self.disposables.add(disposable)
  }

  /// A future that resolves once the lifetime ends.
  ///
  /// ```rust
  /// use rxsignal::prelude::*;
  ///
  /// let (lifetime, token) = Lifetime::make();
  /// let ended = lifetime.ended();
  /// drop(token);
  /// futures::executor::block_on(ended);
  /// assert!(lifetime.has_ended());
  /// ```
  pub fn ended(&self) -> Ended {
    let (tx, rx) = oneshot::channel();
    let _registration = self.observe_ended(move || {
      let _ = tx.send(());
    });
    Ended { rx }
  }
}

impl From<CompositeDisposable> for Lifetime {
  fn from(disposables: CompositeDisposable) -> Self { Lifetime { disposables } }
}

impl Debug for Lifetime {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Lifetime")
      .field("has_ended", &self.has_ended())
      .finish()
  }
}

impl LifetimeToken {
  /// End the lifetime now.
  pub fn release(self) { self.disposables.dispose() }
}

impl Drop for LifetimeToken {
  fn drop(&mut self) { self.disposables.dispose() }
}

impl Debug for LifetimeToken {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str("LifetimeToken") }
}

pin_project! {
  /// Future returned by [`Lifetime::ended`].
  ///
  /// It also resolves if the backing composite is dropped without ever being
  /// disposed, since nothing can end the lifetime after that.
  #[must_use = "futures do nothing unless polled"]
  pub struct Ended {
    #[pin]
    rx: oneshot::Receiver<()>,
  }
}

impl Future for Ended {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    self.project().rx.poll(cx).map(|_| ())
  }
}
