use std::fmt;

use crate::{
  error::BoxError,
  logs::Logs,
  trigger::Trigger,
  driver::Elapsed,
};


/// Training-type callback: consumes the state and a batch,
/// returns the step's logs together with the new state.

pub type StepFn<S, B> = Box<dyn FnMut(S, &B) -> Result<(Logs, S), BoxError>>;


/// Side-effecting callback that observes the loop without changing its state.
///
/// Monitors see the state and logs as left behind by all callbacks
/// that ran before them within the same step.

pub trait Monitor<S> {
  fn observe(&mut self, state: &S, logs: &Logs, elapsed: &Elapsed) -> Result<Option<Logs>, BoxError>;

  fn name(&self) -> &str {
    "monitor"
  }
}


struct FnMonitor<F> {
  name: String,
  f: F,
}

impl<S, F> Monitor<S> for FnMonitor<F>
where
  F: FnMut(&S, &Logs, &Elapsed) -> Result<Option<Logs>, BoxError>,
{
  fn observe(&mut self, state: &S, logs: &Logs, elapsed: &Elapsed) -> Result<Option<Logs>, BoxError> {
    (self.f)(state, logs, elapsed)
  }

  fn name(&self) -> &str {
    &self.name
  }
}


pub(crate) enum Action<S, B> {
  Step(StepFn<S, B>),
  Monitor(Box<dyn Monitor<S>>),
}


/// Entry of a loop's trigger table.

pub struct Callback<S, B> {
  pub(crate) name: String,
  pub(crate) trigger: Trigger,
  pub(crate) action: Action<S, B>,
}

impl<S, B> Callback<S, B> {
  pub fn step<F>(trigger: Trigger, name: impl Into<String>, f: F) -> Self
  where
    F: FnMut(S, &B) -> Result<(Logs, S), BoxError> + 'static,
  {
    Self { name: name.into(), trigger, action: Action::Step(Box::new(f)) }
  }

  pub fn monitor<F>(trigger: Trigger, name: impl Into<String>, f: F) -> Self
  where
    F: FnMut(&S, &Logs, &Elapsed) -> Result<Option<Logs>, BoxError> + 'static,
  {
    let name = name.into();
    let monitor = FnMonitor { name: name.clone(), f };
    Self { name, trigger, action: Action::Monitor(Box::new(monitor)) }
  }

  pub fn observer(trigger: Trigger, monitor: impl Monitor<S> + 'static) -> Self {
    Self {
      name: monitor.name().to_string(),
      trigger,
      action: Action::Monitor(Box::new(monitor)),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn trigger(&self) -> &Trigger {
    &self.trigger
  }

  pub fn is_step(&self) -> bool {
    matches!(self.action, Action::Step(_))
  }

  /// Run this callback if its trigger fires, threading `state` through
  /// and merging whatever it logs into `logs`.

  pub(crate) fn fire(&mut self, step: usize, state: S, batch: &B, logs: &mut Logs, elapsed: &Elapsed) -> Result<S, BoxError> {
    if !self.trigger.fires(step) { return Ok(state) }
    match &mut self.action {
      Action::Step(f) => {
        let (out, state) = f(state, batch)?;
        logs.merge(out);
        Ok(state)
      },
      Action::Monitor(monitor) => {
        if let Some(out) = monitor.observe(&state, logs, elapsed)? {
          logs.merge(out);
        }
        Ok(state)
      },
    }
  }
}

impl<S, B> fmt::Debug for Callback<S, B> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let kind = if self.is_step() { "step" } else { "monitor" };
    write!(f, "Callback({} {kind} {:?})", self.name, self.trigger)
  }
}
