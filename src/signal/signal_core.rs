use std::{
  fmt::{Debug, Formatter},
  panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
  thread::{self, ThreadId},
};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::{
  bag::{Bag, RemovalToken},
  cell::AtomicCell,
  disposable::{CompositeDisposable, Disposable},
  event::Event,
  lifetime::Lifetime,
  observer::Observer,
  state::{AtomicState, AtomicStateMachine},
};

/// Which thread owns delivery of the terminal event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TerminationState {
  /// No terminal event has been sent.
  Idle,
  /// A terminal event was claimed and is being, or has been, delivered.
  Terminated,
  /// A terminal event is stashed, waiting for whichever thread holds the send
  /// lock (or next releases it) to deliver it.
  Blocked,
}

impl AtomicState for TerminationState {
  fn into_raw(self) -> u8 { self as u8 }

  fn from_raw(raw: u8) -> Self {
    match raw {
      0 => TerminationState::Idle,
      1 => TerminationState::Terminated,
      2 => TerminationState::Blocked,
      _ => unreachable!("invalid termination state {raw}"),
    }
  }
}

/// The broadcaster behind every [`Signal`](super::Signal).
///
/// `SignalCore` owns the observer registry and the composite disposable that
/// backs the signal's [`Lifetime`], and serializes every `send`.
///
/// # Send protocol
///
/// - **Values** are broadcast under the send lock to a snapshot of the
///   registry. After the lock is released the sender tries to commit a pending
///   terminal event.
/// - **Terminal events** first claim `Idle -> Terminated`; losers are dropped
///   silently. The winner delivers directly if it can take the send lock
///   without blocking. Otherwise another thread (possibly its own caller
///   further up the stack) is broadcasting: the event is stashed, the state
///   moves to `Blocked`, and delivery is left to whoever releases the lock.
/// - **Commit** runs after every lock release: if the state is `Blocked` and
///   the lock is free, the committing thread takes over the stashed event.
///
/// A failed `try_lock` always means some holder exists that will commit
/// after it releases, so nothing spins and no terminal event is lost.
///
/// An observer panic is caught at the broadcast boundary and re-raised only
/// after the lock is released and commit (or disposal, for a terminal pass)
/// has run, so a panicking observer cannot strand a stashed terminal event.
///
/// # Re-Entrancy Policy
///
/// - **Terminal sends** from inside a callback of the same signal are
///   supported; they are delivered once the current broadcast finishes.
/// - **Value sends** from inside a callback that is broadcasting on the same
///   thread **panic**: they could only block forever on the send lock.
/// - **Subscription mutations** (`observe` / `remove_observer`) are allowed
///   inside callbacks and take effect from the next broadcast on.
pub struct SignalCore<V, E> {
  observers: AtomicCell<Option<Bag<Observer<V, E>>>>,
  disposables: CompositeDisposable,
  state: AtomicStateMachine<TerminationState>,
  send_lock: Mutex<()>,
  sending_thread: AtomicCell<Option<ThreadId>>,
  pending_terminal: AtomicCell<Option<Event<V, E>>>,
}

impl<V, E> SignalCore<V, E> {
  pub fn new() -> Self {
    Self {
      observers: AtomicCell::new(Some(Bag::new())),
      disposables: CompositeDisposable::new(),
      state: AtomicStateMachine::new(TerminationState::Idle),
      send_lock: Mutex::new(()),
      sending_thread: AtomicCell::new(None),
      pending_terminal: AtomicCell::new(None),
    }
  }

  /// Register `observer`.
  ///
  /// Returns `None` once the terminal event has been delivered; the late
  /// observer is sent `Interrupted` synchronously instead.
  pub fn observe(&self, observer: Observer<V, E>) -> Option<RemovalToken> {
    let inserted = self.observers.modify(|slot| match slot {
      Some(bag) => Ok(bag.insert(observer)),
      None => Err(observer),
    });

    match inserted {
      Ok(token) => Some(token),
      Err(late) => {
        trace!("observer attached after termination, replaying interrupted");
        late.send_interrupted();
        None
      }
    }
  }

  /// Detach the observer registered under `token`. Idempotent.
  pub fn remove_observer(&self, token: RemovalToken) {
    let removed = self
      .observers
      .modify(|slot| slot.as_mut().and_then(|bag| bag.remove(token)));
    drop(removed);
  }

  pub fn observer_count(&self) -> usize {
    self
      .observers
      .with_value(|slot| slot.as_ref().map_or(0, Bag::len))
  }

  /// Whether the terminal event has been delivered.
  pub fn is_terminated(&self) -> bool { self.observers.with_value(Option::is_none) }

  pub fn termination_state(&self) -> TerminationState { self.state.current() }

  /// The lifetime of this signal; it ends right after terminal delivery.
  pub fn lifetime(&self) -> Lifetime { Lifetime::from(self.disposables.clone()) }
}

impl<V: Clone, E: Clone> SignalCore<V, E> {
  /// Deliver `event` to every registered observer.
  pub fn send(&self, event: Event<V, E>) {
    if event.is_terminating() {
      self.send_terminal(event)
    } else {
      self.send_value(event)
    }
  }

  fn send_value(&self, event: Event<V, E>) {
    if !self.state.is(TerminationState::Idle) {
      trace!("value sent after a terminal event was claimed, dropping it");
      return;
    }
    if self.sending_thread.get() == Some(thread::current().id()) {
      panic!(
        "re-entrant value send on a signal that is broadcasting on this thread; only terminal \
         events may be sent from inside the signal's own callbacks"
      );
    }

    let outcome = {
      let _sending = SendGuard::enter(self.send_lock.lock(), &self.sending_thread);
      let observers = self
        .observers
        .with_value(|slot| slot.as_ref().map(Bag::snapshot));
      catch_unwind(AssertUnwindSafe(|| {
        if let Some(observers) = observers {
          broadcast(observers, event);
        }
      }))
    };
    self.try_commit_termination();
    if let Err(panic) = outcome {
      resume_unwind(panic);
    }
  }

  fn send_terminal(&self, event: Event<V, E>) {
    if !self
      .state
      .try_transition(TerminationState::Idle, TerminationState::Terminated)
    {
      trace!("terminal event already claimed, ignoring");
      return;
    }

    match self.send_lock.try_lock() {
      Some(guard) => self.deliver_terminal(guard, event),
      None => {
        trace!("send lock is busy, handing terminal event to the lock holder");
        self.pending_terminal.swap(Some(event));
        let blocked = self
          .state
          .try_transition(TerminationState::Terminated, TerminationState::Blocked);
        debug_assert!(blocked, "only the claiming thread moves out of Terminated");
        self.try_commit_termination();
      }
    }
  }

  fn try_commit_termination(&self) {
    if !self.state.is(TerminationState::Blocked) {
      return;
    }
    let Some(guard) = self.send_lock.try_lock() else {
      // The holder commits after it releases.
      return;
    };
    if self
      .state
      .try_transition(TerminationState::Blocked, TerminationState::Terminated)
    {
      if let Some(event) = self.pending_terminal.swap(None) {
        self.deliver_terminal(guard, event);
      }
    }
  }

  fn deliver_terminal(&self, guard: MutexGuard<'_, ()>, event: Event<V, E>) {
    let outcome = {
      let _sending = SendGuard::enter(guard, &self.sending_thread);
      let observers = self.observers.swap(None);
      catch_unwind(AssertUnwindSafe(|| {
        if let Some(observers) = observers {
          broadcast(observers, event);
        }
      }))
    };
    debug!("signal terminated, disposing its resources");
    self.disposables.dispose();
    if let Err(panic) = outcome {
      resume_unwind(panic);
    }
  }
}

impl<V, E> Default for SignalCore<V, E> {
  fn default() -> Self { Self::new() }
}

impl<V, E> Debug for SignalCore<V, E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SignalCore")
      .field("state", &self.state)
      .field("observers", &self.observer_count())
      .finish()
  }
}

/// Holds the send lock and records the broadcasting thread until dropped,
/// including when an observer panics.
struct SendGuard<'a> {
  _lock: MutexGuard<'a, ()>,
  sending_thread: &'a AtomicCell<Option<ThreadId>>,
}

impl<'a> SendGuard<'a> {
  fn enter(lock: MutexGuard<'a, ()>, sending_thread: &'a AtomicCell<Option<ThreadId>>) -> Self {
    sending_thread.swap(Some(thread::current().id()));
    Self { _lock: lock, sending_thread }
  }
}

impl Drop for SendGuard<'_> {
  fn drop(&mut self) { self.sending_thread.swap(None); }
}

/// Send `event` to each observer, cloning for all but the last one.
fn broadcast<V: Clone, E: Clone>(
  observers: impl IntoIterator<Item = Observer<V, E>>, event: Event<V, E>,
) {
  let mut iter = observers.into_iter().peekable();
  while let Some(observer) = iter.next() {
    if iter.peek().is_some() {
      observer.send(event.clone());
    } else {
      observer.send(event);
      break;
    }
  }
}
