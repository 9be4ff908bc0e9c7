use std::sync::{Arc, Mutex};

use rxsignal::prelude::*;

pub type Trace<V, E> = Arc<Mutex<Vec<Event<V, E>>>>;

/// Route `tracing` output through the test harness so `--nocapture` shows the
/// core's trace events.
#[allow(unused)]
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_test_writer()
    .with_max_level(tracing::Level::TRACE)
    .try_init();
}

/// An observer that records every event it receives, plus the shared trace.
#[allow(unused)]
pub fn recorder<V, E>() -> (Observer<V, E>, Trace<V, E>)
where
  V: Send + 'static,
  E: Send + 'static,
{
  let trace: Trace<V, E> = Arc::new(Mutex::new(Vec::new()));
  let observer = Observer::new({
    let trace = trace.clone();
    move |event| trace.lock().unwrap().push(event)
  });
  (observer, trace)
}

#[allow(unused)]
pub fn events<V: Clone, E: Clone>(trace: &Trace<V, E>) -> Vec<Event<V, E>> { trace.lock().unwrap().clone() }
