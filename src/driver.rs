use std::time::Instant;

use serde::{ Serialize, Deserialize };
use tracing::{ debug, info, warn };

use crate::{
  error::{ Error, Result, BoxError },
  logs::Logs,
  history::History,
  trigger::Trigger,
  callback::{ Callback, Monitor },
  stop::Stop,
};


/// Progress of a running loop.

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Elapsed {
  /// Current step, starting at 1
  pub steps: usize,
  /// Wall-clock time since the loop started
  pub seconds: f64,
}


/// Everything a finished loop hands back to its caller.

#[derive(Debug)]
pub struct Outcome<S> {
  pub state: S,
  pub history: History,
  /// Merged logs of the final step
  pub logs: Logs,
  pub elapsed: Elapsed,
}

impl<S> Outcome<S> {
  pub fn into_parts(self) -> (S, History, Logs) {
    (self.state, self.history, self.logs)
  }
}


/// Step-based loop, driven by a table of triggered callbacks.
///
/// Every step pulls one batch, runs all callbacks whose trigger fires
/// in registration order while threading the state through them, records
/// the merged logs and finally checks the stop condition.

pub struct Loop<S, B> {
  callbacks: Vec<Callback<S, B>>,
  stop: Stop<S>,
}

impl<S, B> Loop<S, B> {
  pub fn new(stop: impl Into<Stop<S>>) -> Self {
    Self { callbacks: vec![], stop: stop.into() }
  }

  pub fn callback(mut self, callback: Callback<S, B>) -> Self {
    self.callbacks.push(callback);
    self
  }

  pub fn step<F>(self, trigger: Trigger, name: impl Into<String>, f: F) -> Self
  where
    F: FnMut(S, &B) -> std::result::Result<(Logs, S), BoxError> + 'static,
  {
    self.callback(Callback::step(trigger, name, f))
  }

  pub fn monitor<F>(self, trigger: Trigger, name: impl Into<String>, f: F) -> Self
  where
    F: FnMut(&S, &Logs, &Elapsed) -> std::result::Result<Option<Logs>, BoxError> + 'static,
  {
    self.callback(Callback::monitor(trigger, name, f))
  }

  pub fn observe(self, trigger: Trigger, monitor: impl Monitor<S> + 'static) -> Self {
    self.callback(Callback::observer(trigger, monitor))
  }

  pub fn callbacks(&self) -> &[Callback<S, B>] {
    &self.callbacks
  }

  pub fn run<I>(self, state: S, data: I) -> Result<Outcome<S>>
  where
    I: IntoIterator<Item = B>,
  {
    run(state, data, self.callbacks, self.stop)
  }
}


/// Drive `state` through `callbacks` until `stop` holds.
///
/// Fails without returning any state or history as soon as the data runs
/// out, a callback fails or the stop condition itself fails.

pub fn run<S, B, I>(state: S, data: I, mut callbacks: Vec<Callback<S, B>>, stop: impl Into<Stop<S>>) -> Result<Outcome<S>>
where
  I: IntoIterator<Item = B>,
{
  let mut stop = stop.into();
  let start = Instant::now();
  let mut state = state;
  let mut history = History::new();
  let mut logs = Logs::new();
  let mut elapsed = Elapsed::default();

  info!(callbacks = callbacks.len(), ?stop, "loop started");

  if stop.ceiling() == Some(0) {
    info!("loop finished before the first step");
    return Ok(Outcome { state, history, logs, elapsed })
  }

  let mut data = data.into_iter();
  let mut step = 0;
  loop {
    step += 1;

    let Some(batch) = data.next() else {
      warn!(step, "data source exhausted");
      return Err(Error::IterationExhausted { step })
    };

    elapsed = Elapsed { steps: step, seconds: start.elapsed().as_secs_f64() };
    logs = Logs::new();

    for callback in &mut callbacks {
      state = match callback.fire(step, state, &batch, &mut logs, &elapsed) {
        Ok(state) => state,
        Err(source) => {
          warn!(step, callback = %callback.name, error = %source, "callback failed");
          return Err(Error::Callback { name: callback.name.clone(), step, source })
        },
      };
    }

    if !logs.is_empty() {
      debug!(step, entries = logs.len(), "recorded logs");
      history.push(step, logs.clone());
    }

    let done = stop.reached(step, &state, &logs).map_err(|source| {
      warn!(step, error = %source, "stop condition failed");
      Error::StopCondition { step, source }
    })?;

    if done { break }
  }

  elapsed.seconds = start.elapsed().as_secs_f64();
  info!(steps = step, records = history.len(), seconds = elapsed.seconds, "loop finished");

  Ok(Outcome { state, history, logs, elapsed })
}
