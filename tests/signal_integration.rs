//! Integration tests for rxsignal
//!
//! Exercises the event grammar, subscription management and the termination
//! protocol under concurrent and re-entrant access.

mod common;

use std::{
  panic::{catch_unwind, AssertUnwindSafe},
  sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Barrier, Mutex,
  },
  thread::{self, ThreadId},
};

use common::{events, init_tracing, recorder};
use rxsignal::prelude::*;

#[test]
fn test_three_observers_see_the_same_trace() {
  init_tracing();
  let (signal, input) = Signal::<i32, ()>::pipe();
  let (a, trace_a) = recorder();
  let (b, trace_b) = recorder();
  let (c, trace_c) = recorder();
  signal.observe(a);
  let sub_b = signal.observe(b).unwrap();
  signal.observe(c);

  input.send_value(1);
  sub_b.dispose();
  input.send_value(2);
  input.send_completed();

  let full = vec![Event::Value(1), Event::Value(2), Event::Completed];
  assert_eq!(events(&trace_a), full);
  assert_eq!(events(&trace_b), vec![Event::Value(1)]);
  assert_eq!(events(&trace_c), full);
}

#[test]
fn test_nothing_after_terminal_event() {
  let sequences: Vec<Vec<Event<i32, &'static str>>> = vec![
    vec![Event::Value(1), Event::Failed("x"), Event::Value(2), Event::Completed],
    vec![Event::Completed, Event::Completed, Event::Interrupted],
    vec![Event::Interrupted, Event::Value(1)],
    vec![Event::Value(1), Event::Value(2)],
    vec![],
  ];

  for sequence in sequences {
    let (signal, input) = Signal::pipe();
    let (observer, trace) = recorder();
    signal.observe(observer);

    for event in sequence.clone() {
      input.send(event);
    }

    let cut = sequence
      .iter()
      .position(Event::is_terminating)
      .map_or(sequence.len(), |i| i + 1);
    assert_eq!(events(&trace), sequence[..cut].to_vec());
  }
}

#[test]
fn test_unsubscribe_from_own_callback() {
  let (signal, input) = Signal::<i32, ()>::pipe();
  let slot: Arc<Mutex<Option<AnyDisposable>>> = Arc::default();
  let seen = Arc::new(Mutex::new(vec![]));

  let sub = signal.observe_values({
    let slot = slot.clone();
    let seen = seen.clone();
    move |v| {
      seen.lock().unwrap().push(v);
      if let Some(sub) = slot.lock().unwrap().as_ref() {
        sub.dispose();
      }
    }
  });
  *slot.lock().unwrap() = sub;

  input.send_value(1);
  input.send_value(2);

  assert_eq!(*seen.lock().unwrap(), vec![1]);
  assert_eq!(signal.observer_count(), 0);
}

#[test]
fn test_removing_a_later_observer_mid_broadcast() {
  // Removal during a pass does not disturb it; it takes effect on the next one.
  let (signal, input) = Signal::<i32, ()>::pipe();
  let victim_slot: Arc<Mutex<Option<AnyDisposable>>> = Arc::default();

  signal.observe_values({
    let victim_slot = victim_slot.clone();
    move |_| {
      if let Some(victim) = victim_slot.lock().unwrap().take() {
        victim.dispose();
      }
    }
  });
  let (victim, victim_trace) = recorder();
  *victim_slot.lock().unwrap() = signal.observe(victim);
  let (tail, tail_trace) = recorder();
  signal.observe(tail);

  input.send_value(1);
  input.send_value(2);

  assert_eq!(events(&victim_trace), vec![Event::Value(1)]);
  assert_eq!(events(&tail_trace), vec![Event::Value(1), Event::Value(2)]);
}

#[test]
fn test_observe_from_inside_callback() {
  let (signal, input) = Signal::<i32, ()>::pipe();
  let late_trace: Arc<Mutex<Option<common::Trace<i32, ()>>>> = Arc::default();

  signal.observe_values({
    let signal = signal.clone();
    let late_trace = late_trace.clone();
    move |v| {
      if v == 1 {
        let (observer, trace) = recorder();
        signal.observe(observer);
        *late_trace.lock().unwrap() = Some(trace);
      }
    }
  });

  input.send_value(1);
  input.send_value(2);
  input.send_completed();

  let trace = late_trace.lock().unwrap().clone().unwrap();
  assert_eq!(events(&trace), vec![Event::Value(2), Event::Completed]);
}

#[test]
fn test_reentrant_interrupt_does_not_deadlock() {
  init_tracing();
  let (signal, input) = Signal::<i32, ()>::pipe();
  let (observer, trace) = recorder();

  signal.observe_values({
    let input = input.clone();
    move |v| {
      if v == 2 {
        input.send_interrupted();
        input.send_completed();
      }
    }
  });
  signal.observe(observer);

  let disposed = Arc::new(AtomicUsize::new(0));
  signal.lifetime().observe_ended({
    let disposed = disposed.clone();
    move || {
      disposed.fetch_add(1, Ordering::SeqCst);
    }
  });

  input.send_value(1);
  input.send_value(2);
  input.send_value(3);

  assert_eq!(events(&trace), vec![Event::Value(1), Event::Value(2), Event::Interrupted]);
  assert_eq!(disposed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_terminal_from_terminal_callback_is_ignored() {
  let (signal, input) = Signal::<i32, ()>::pipe();
  let (observer, trace) = recorder();
  signal.observe_completed({
    let input = input.clone();
    move || input.send_failed(())
  });
  signal.observe(observer);

  input.send_completed();
  assert_eq!(events(&trace), vec![Event::Completed]);
}

#[test]
fn test_late_subscription_replays_interrupted() {
  let (signal, input) = Signal::<i32, &'static str>::pipe();
  input.send_failed("gone");

  let (observer, trace) = recorder();
  assert!(signal.observe(observer).is_none());
  assert_eq!(events(&trace), vec![Event::Interrupted]);
}

#[test]
fn test_concurrent_terminal_race() {
  for _ in 0..50 {
    let (signal, input) = Signal::<usize, usize>::pipe();
    let (first, first_trace) = recorder();
    let (second, second_trace) = recorder();
    signal.observe(first);
    signal.observe(second);

    let disposals = Arc::new(AtomicUsize::new(0));
    signal.lifetime().observe_ended({
      let disposals = disposals.clone();
      move || {
        disposals.fetch_add(1, Ordering::SeqCst);
      }
    });

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
      .map(|i| {
        let input = input.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
          barrier.wait();
          match i % 3 {
            0 => input.send_completed(),
            1 => input.send_failed(i),
            _ => input.send_interrupted(),
          }
        })
      })
      .collect();
    for h in handles {
      h.join().unwrap();
    }

    let first_events = events(&first_trace);
    assert_eq!(first_events.len(), 1);
    assert!(first_events[0].is_terminating());
    assert_eq!(first_events, events(&second_trace));
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
  }
}

#[test]
fn test_concurrent_senders_are_serialized_and_ordered() {
  const THREADS: usize = 4;
  const PER_THREAD: usize = 250;

  let (signal, input) = Signal::<(usize, usize), ()>::pipe();
  let in_callback = Arc::new(AtomicBool::new(false));
  let overlaps = Arc::new(AtomicUsize::new(0));

  signal.observe_fn({
    let in_callback = in_callback.clone();
    let overlaps = overlaps.clone();
    move |_| {
      if in_callback.swap(true, Ordering::SeqCst) {
        overlaps.fetch_add(1, Ordering::SeqCst);
      }
      thread::yield_now();
      in_callback.store(false, Ordering::SeqCst);
    }
  });
  let (first, first_trace) = recorder();
  let (second, second_trace) = recorder();
  signal.observe(first);
  signal.observe(second);

  let barrier = Arc::new(Barrier::new(THREADS));
  let handles: Vec<_> = (0..THREADS)
    .map(|t| {
      let input = input.clone();
      let barrier = barrier.clone();
      thread::spawn(move || {
        barrier.wait();
        for i in 0..PER_THREAD {
          input.send_value((t, i));
        }
      })
    })
    .collect();
  for h in handles {
    h.join().unwrap();
  }
  input.send_completed();

  assert_eq!(overlaps.load(Ordering::SeqCst), 0);

  let first_events = events(&first_trace);
  assert_eq!(first_events, events(&second_trace));
  assert_eq!(first_events.len(), THREADS * PER_THREAD + 1);
  assert_eq!(first_events.last(), Some(&Event::Completed));

  // Each sender's values arrive in the order it sent them.
  let mut next = [0usize; THREADS];
  for event in &first_events[..THREADS * PER_THREAD] {
    let (t, i) = *event.value().unwrap();
    assert_eq!(next[t], i);
    next[t] += 1;
  }
}

#[test]
fn test_terminal_while_values_in_flight() {
  for _ in 0..50 {
    let (signal, input) = Signal::<usize, ()>::pipe();
    let (observer, trace) = recorder();
    signal.observe(observer);

    let barrier = Arc::new(Barrier::new(2));
    let producer = {
      let input = input.clone();
      let barrier = barrier.clone();
      thread::spawn(move || {
        barrier.wait();
        for i in 0..100 {
          input.send_value(i);
        }
      })
    };
    barrier.wait();
    input.send_completed();
    producer.join().unwrap();

    let received = events(&trace);
    let terminal_at = received.iter().position(Event::is_terminating).unwrap();
    assert_eq!(terminal_at, received.len() - 1);
    assert!(received[..terminal_at]
      .iter()
      .enumerate()
      .all(|(i, e)| e == &Event::Value(i)));
  }
}

#[test]
fn test_lock_holder_delivers_terminal_stashed_by_another_thread() {
  init_tracing();
  let (signal, input) = Signal::<i32, ()>::pipe();
  let entered = Arc::new(Barrier::new(2));
  let release = Arc::new(Barrier::new(2));
  let delivered_on: Arc<Mutex<Vec<ThreadId>>> = Arc::default();

  // Parks the sending thread inside its broadcast, holding the send lock.
  signal.observe_values({
    let entered = entered.clone();
    let release = release.clone();
    move |_| {
      entered.wait();
      release.wait();
    }
  });
  let (observer, trace) = recorder();
  signal.observe(observer);
  signal.observe_completed({
    let delivered_on = delivered_on.clone();
    move || delivered_on.lock().unwrap().push(thread::current().id())
  });

  let disposals = Arc::new(AtomicUsize::new(0));
  signal.lifetime().observe_ended({
    let disposals = disposals.clone();
    move || {
      disposals.fetch_add(1, Ordering::SeqCst);
    }
  });

  let holder = thread::spawn({
    let input = input.clone();
    move || {
      input.send_value(1);
      thread::current().id()
    }
  });

  entered.wait();
  input.send_completed();
  assert_eq!(signal.core().termination_state(), TerminationState::Blocked);
  assert!(events(&trace).is_empty());
  assert!(!signal.lifetime().has_ended());

  release.wait();
  let holder_id = holder.join().unwrap();

  assert_eq!(events(&trace), vec![Event::Value(1), Event::Completed]);
  assert_eq!(*delivered_on.lock().unwrap(), vec![holder_id]);
  assert_eq!(signal.core().termination_state(), TerminationState::Terminated);
  assert_eq!(disposals.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panicking_observer_does_not_strand_terminal() {
  let (signal, input) = Signal::<i32, ()>::pipe();
  signal.observe_values({
    let input = input.clone();
    move |_| input.send_interrupted()
  });
  let (observer, trace) = recorder();
  signal.observe(observer);
  signal.observe_values(|_| panic!("observer failed"));

  let result = catch_unwind(AssertUnwindSafe(|| input.send_value(1)));
  assert!(result.is_err());
  input.send_value(2);
  input.send_completed();

  assert_eq!(events(&trace), vec![Event::Value(1), Event::Interrupted]);
  assert!(signal.is_terminated());
  assert!(signal.lifetime().has_ended());
}

#[test]
fn test_concurrent_dispose_of_signal_resources() {
  let (signal, input) = Signal::<(), ()>::pipe();
  let released = Arc::new(AtomicUsize::new(0));
  for _ in 0..16 {
    let released = released.clone();
    signal.lifetime().add(AnyDisposable::new(move || {
      released.fetch_add(1, Ordering::SeqCst);
    }));
  }

  let barrier = Arc::new(Barrier::new(8));
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let input = input.clone();
      let barrier = barrier.clone();
      thread::spawn(move || {
        barrier.wait();
        input.send_interrupted();
      })
    })
    .collect();
  for h in handles {
    h.join().unwrap();
  }

  assert_eq!(released.load(Ordering::SeqCst), 16);
  assert!(signal.lifetime().has_ended());
}

#[test]
fn test_scoped_subscription_detaches_on_drop() {
  let (signal, input) = Signal::<i32, ()>::pipe();
  let (observer, trace) = recorder();
  {
    let _scoped = ScopedDisposable::new(signal.observe(observer).unwrap());
    input.send_value(1);
  }
  input.send_value(2);
  assert_eq!(events(&trace), vec![Event::Value(1)]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_signal_lifetime_future() {
  let (signal, input) = Signal::<i32, ()>::pipe();
  let ended = signal.lifetime().ended();

  let producer = tokio::task::spawn_blocking(move || {
    input.send_value(1);
    input.send_completed();
  });

  ended.await;
  producer.await.unwrap();
  assert!(signal.is_terminated());
}
