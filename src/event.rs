//! The event grammar carried by a signal.
//!
//! A signal delivers `Value*` followed by at most one terminal event
//! (`Failed`, `Completed` or `Interrupted`). Errors are plain data: the core
//! never inspects the `E` it carries.

/// One notification from a signal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event<V, E> {
  /// A value produced by the signal.
  Value(V),
  /// The signal failed with an error. Terminal.
  Failed(E),
  /// The signal finished successfully. Terminal.
  Completed,
  /// The signal was cancelled before it could finish. Terminal.
  Interrupted,
}

impl<V, E> Event<V, E> {
  /// Whether this event ends the stream.
  #[inline]
  pub fn is_terminating(&self) -> bool { !matches!(self, Event::Value(_)) }

  #[inline]
  pub fn is_completed(&self) -> bool { matches!(self, Event::Completed) }

  pub fn value(&self) -> Option<&V> {
    match self {
      Event::Value(v) => Some(v),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&E> {
    match self {
      Event::Failed(e) => Some(e),
      _ => None,
    }
  }

  /// Transform the value of a `Value` event, leaving other kinds untouched.
  pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Event<U, E> {
    match self {
      Event::Value(v) => Event::Value(f(v)),
      Event::Failed(e) => Event::Failed(e),
      Event::Completed => Event::Completed,
      Event::Interrupted => Event::Interrupted,
    }
  }

  /// Transform the error of a `Failed` event, leaving other kinds untouched.
  pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> Event<V, F> {
    match self {
      Event::Value(v) => Event::Value(v),
      Event::Failed(e) => Event::Failed(f(e)),
      Event::Completed => Event::Completed,
      Event::Interrupted => Event::Interrupted,
    }
  }

  /// `Value` becomes `Ok`, `Failed` becomes `Err`; completion and
  /// interruption carry no result.
  pub fn into_result(self) -> Option<Result<V, E>> {
    match self {
      Event::Value(v) => Some(Ok(v)),
      Event::Failed(e) => Some(Err(e)),
      Event::Completed | Event::Interrupted => None,
    }
  }
}
