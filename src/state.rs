//! Compare-and-swap state machine over a small closed set of states.

use std::{
  fmt::{Debug, Formatter},
  marker::PhantomData,
  sync::atomic::{AtomicU8, Ordering},
};

/// A state that can be stored in an [`AtomicStateMachine`].
///
/// Implementors map each variant to a distinct `u8` and back. `from_raw` is
/// only ever called with values produced by `into_raw`.
pub trait AtomicState: Copy + Eq {
  fn into_raw(self) -> u8;
  fn from_raw(raw: u8) -> Self;
}

/// An atomic state guarded by compare-and-swap transitions.
///
/// A failed [`try_transition`](Self::try_transition) never blocks or retries:
/// it only means another caller moved the state first.
///
/// ```rust
/// use rxsignal::state::{AtomicState, AtomicStateMachine};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Debug)]
/// enum Door {
///   Open,
///   Closed,
/// }
///
/// impl AtomicState for Door {
///   fn into_raw(self) -> u8 { self as u8 }
///   fn from_raw(raw: u8) -> Self { if raw == 0 { Door::Open } else { Door::Closed } }
/// }
///
/// let door = AtomicStateMachine::new(Door::Open);
/// assert!(door.try_transition(Door::Open, Door::Closed));
/// assert!(!door.try_transition(Door::Open, Door::Closed));
/// assert!(door.is(Door::Closed));
/// ```
pub struct AtomicStateMachine<S> {
  raw: AtomicU8,
  _state: PhantomData<fn() -> S>,
}

impl<S: AtomicState> AtomicStateMachine<S> {
  pub fn new(initial: S) -> Self { Self { raw: AtomicU8::new(initial.into_raw()), _state: PhantomData } }

  /// Move from `from` to `to` if the current state is `from`.
  ///
  /// Returns `true` when this call performed the transition.
  #[inline]
  pub fn try_transition(&self, from: S, to: S) -> bool {
    self
      .raw
      .compare_exchange(from.into_raw(), to.into_raw(), Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  /// Point-in-time check of the current state.
  #[inline]
  pub fn is(&self, expected: S) -> bool { self.raw.load(Ordering::Acquire) == expected.into_raw() }

  #[inline]
  pub fn current(&self) -> S { S::from_raw(self.raw.load(Ordering::Acquire)) }
}

impl<S: AtomicState + Debug> Debug for AtomicStateMachine<S> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("AtomicStateMachine").field(&self.current()).finish()
  }
}
