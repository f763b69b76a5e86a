use std::fmt;

use tracing::info;

use crate::{
  error::BoxError,
  logs::Logs,
};


/// Predicate deciding after each step whether the loop ends.

pub type StopFn<S> = Box<dyn FnMut(usize, &S, &Logs) -> Result<bool, BoxError>>;


/// Condition that ends a loop.
///
/// Checked strictly after all callbacks of a step have run.

pub enum Stop<S> {
  /// Run steps `1..=n`
  Steps(usize),
  /// Stop once the predicate holds
  When(StopFn<S>),
  /// Stop once any of the conditions holds
  Any(Vec<Stop<S>>),
}

impl<S> Stop<S> {
  pub fn steps(n: usize) -> Self {
    Self::Steps(n)
  }

  pub fn when<F>(predicate: F) -> Self
  where
    F: FnMut(usize, &S, &Logs) -> Result<bool, BoxError> + 'static,
  {
    Self::When(Box::new(predicate))
  }

  pub fn or(self, other: Stop<S>) -> Self {
    match self {
      Self::Any(mut conditions) => {
        conditions.push(other);
        Self::Any(conditions)
      },
      this => Self::Any(vec![this, other]),
    }
  }

  /// Smallest step ceiling among the conditions, if any.

  pub fn ceiling(&self) -> Option<usize> {
    match self {
      Self::Steps(n) => Some(*n),
      Self::When(_) => None,
      Self::Any(conditions) => conditions.iter().filter_map(|c| c.ceiling() ).min(),
    }
  }

  pub(crate) fn reached(&mut self, step: usize, state: &S, logs: &Logs) -> Result<bool, BoxError> {
    match self {
      Self::Steps(n) => Ok(step >= *n),
      Self::When(predicate) => predicate(step, state, logs),
      Self::Any(conditions) => {
        // Every predicate sees every step, so stateful ones stay in sync
        let mut reached = false;
        for condition in conditions {
          reached |= condition.reached(step, state, logs)?;
        }
        Ok(reached)
      },
    }
  }
}

impl<S> From<usize> for Stop<S> {
  fn from(n: usize) -> Self {
    Self::Steps(n)
  }
}

impl<S> fmt::Debug for Stop<S> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Steps(n) => write!(f, "Steps({n})"),
      Self::When(_) => write!(f, "When"),
      Self::Any(conditions) => f.debug_tuple("Any").field(conditions).finish(),
    }
  }
}


/// Whether smaller or larger values of a watched metric are better.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Min,
  Max,
}


/// Stops a loop once a metric hasn't improved for `patience` consecutive
/// observations. Steps that don't log the metric are not counted.

#[derive(Debug, Clone)]
pub struct EarlyStopping {
  pub metric: String,
  pub patience: usize,
  pub min_delta: f64,
  pub mode: Mode,
  best: Option<f64>,
  wait: usize,
}

impl EarlyStopping {
  pub fn new(metric: impl Into<String>, patience: usize, mode: Mode) -> Self {
    Self {
      metric: metric.into(),
      patience,
      min_delta: 0.0,
      mode,
      best: None,
      wait: 0,
    }
  }

  pub fn min_delta(mut self, min_delta: f64) -> Self {
    self.min_delta = min_delta.abs();
    self
  }

  pub fn best(&self) -> Option<f64> {
    self.best
  }

  /// Feed one step's logs, returning true once patience has run out.

  pub fn update(&mut self, step: usize, logs: &Logs) -> bool {
    let Some(value) = logs.get(&self.metric) else { return false };
    let improved = match (self.best, self.mode) {
      (None, _) => !value.is_nan(),
      (Some(best), Mode::Min) => value < best - self.min_delta,
      (Some(best), Mode::Max) => value > best + self.min_delta,
    };
    if improved {
      self.best = Some(value);
      self.wait = 0;
      return false
    }
    self.wait += 1;
    let exhausted = self.wait >= self.patience;
    if exhausted {
      info!(step, metric = %self.metric, best = ?self.best, "early stopping");
    }
    exhausted
  }

  pub fn into_stop<S>(mut self) -> Stop<S> {
    Stop::when(move |step, _state: &S, logs| Ok(self.update(step, logs)) )
  }
}
