use super::Disposable;

/// An RAII wrapper that disposes the inner disposable when dropped.
///
/// Implements the [must_use](
/// https://doc.rust-lang.org/reference/attributes/diagnostics.html
/// #the-must_use-attribute)
/// attribute
///
/// **Attention:** If you don't bind the value to a variable, it is dropped and
/// disposed immediately, which is probably not what you want!
#[derive(Debug)]
#[must_use]
pub struct ScopedDisposable<D: Disposable>(D);

impl<D: Disposable> ScopedDisposable<D> {
  pub fn new(disposable: D) -> Self { Self(disposable) }

  pub fn inner(&self) -> &D { &self.0 }
}

impl<D: Disposable> Disposable for ScopedDisposable<D> {
  #[inline]
  fn dispose(&self) { self.0.dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.is_disposed() }
}

impl<D: Disposable> Drop for ScopedDisposable<D> {
  #[inline]
  fn drop(&mut self) { self.0.dispose() }
}
