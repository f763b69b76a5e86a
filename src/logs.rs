use std::collections::BTreeMap;
use std::fmt;

use serde::{ Serialize, Deserialize };
use tracing::trace;

use crate::scalar::{ Scalar, to_metric };


/// Non-metric annotation attached to [Logs], such as a counter or a done flag.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
}

impl Value {
  /// Numeric view used when projecting a [History](crate::History).
  /// Booleans count as 0 or 1, text has no numeric value.

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
      Self::Int(i) => Some(*i as f64),
      Self::Float(f) => Some(*f),
      Self::Text(_) => None,
    }
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self { Self::Bool(value) }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self { Self::Int(value) }
}

impl From<usize> for Value {
  fn from(value: usize) -> Self { Self::Int(value as i64) }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self { Self::Float(value) }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self { Self::Text(value.to_string()) }
}

impl From<String> for Value {
  fn from(value: String) -> Self { Self::Text(value) }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Bool(b) => write!(f, "{b}"),
      Self::Int(i) => write!(f, "{i}"),
      Self::Float(x) => write!(f, "{x}"),
      Self::Text(s) => write!(f, "{s}"),
    }
  }
}


/// Record of named scalar metrics and annotations produced during one step.
///
/// Metrics and annotations live in separate namespaces. Merging two records
/// lets the later one win for every name they share.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Logs {
  metrics: BTreeMap<String, f64>,
  annotations: BTreeMap<String, Value>,
}

impl Logs {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style [add_metric](Self::add_metric).

  pub fn metric<S: Scalar>(mut self, name: impl Into<String>, value: S) -> Self {
    self.add_metric(name, value);
    self
  }

  /// Builder-style [add_annotation](Self::add_annotation).

  pub fn annotate(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.add_annotation(name, value);
    self
  }

  /// Record a metric, returning the value it replaced.

  pub fn add_metric<S: Scalar>(&mut self, name: impl Into<String>, value: S) -> Option<f64> {
    self.metrics.insert(name.into(), to_metric(value))
  }

  pub fn add_annotation(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.annotations.insert(name.into(), value.into())
  }

  pub fn get_metric(&self, name: &str) -> Option<f64> {
    self.metrics.get(name).copied()
  }

  pub fn get_annotation(&self, name: &str) -> Option<&Value> {
    self.annotations.get(name)
  }

  /// Look up a name as a metric first, then as a numeric annotation.

  pub fn get(&self, name: &str) -> Option<f64> {
    self.get_metric(name)
      .or_else(|| self.get_annotation(name).and_then(|value| value.as_f64() ))
  }

  pub fn metrics(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
    self.metrics.iter().map(|(name, &value)| (name.as_str(), value) )
  }

  pub fn annotations(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
    self.annotations.iter().map(|(name, value)| (name.as_str(), value) )
  }

  pub fn len(&self) -> usize {
    self.metrics.len() + self.annotations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.metrics.is_empty() && self.annotations.is_empty()
  }

  /// Fold `other` into this record. Names present in both keep `other`'s value.

  pub fn merge(&mut self, other: Logs) {
    for (name, value) in other.metrics {
      if let Some(previous) = self.metrics.insert(name.clone(), value) {
        trace!(metric = %name, previous, value, "metric overwritten");
      }
    }
    for (name, value) in other.annotations {
      if self.annotations.insert(name.clone(), value).is_some() {
        trace!(annotation = %name, "annotation overwritten");
      }
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builder() {
    let logs = Logs::new()
      .metric("loss", 0.5_f32)
      .metric("accuracy", 0.75)
      .annotate("done", false);
    assert_eq!(logs.get_metric("loss"), Some(0.5));
    assert_eq!(logs.get_metric("done"), None);
    assert_eq!(logs.get_annotation("done"), Some(&Value::Bool(false)));
    assert_eq!(logs.len(), 3);
  }

  #[test]
  fn last_write_wins() {
    let mut logs = Logs::new().metric("loss", 1.0).annotate("phase", "warmup");
    logs.merge(Logs::new().metric("loss", 2.0).metric("lr", 0.1).annotate("phase", "main"));
    assert_eq!(logs.get_metric("loss"), Some(2.0));
    assert_eq!(logs.get_metric("lr"), Some(0.1));
    assert_eq!(logs.get_annotation("phase"), Some(&Value::from("main")));
  }

  #[test]
  fn get_prefers_metrics() {
    let logs = Logs::new()
      .metric("count", 1)
      .annotate("count", 5_usize)
      .annotate("flag", true)
      .annotate("label", "x");
    assert_eq!(logs.get("count"), Some(1.0));
    assert_eq!(logs.get("flag"), Some(1.0));
    assert_eq!(logs.get("label"), None);
    assert_eq!(logs.get("missing"), None);
  }

  #[test]
  fn emptiness() {
    assert!(Logs::new().is_empty());
    assert!(!Logs::new().annotate("tick", 1_i64).is_empty());
    let mut logs = Logs::new();
    logs.merge(Logs::new());
    assert!(logs.is_empty());
  }

  #[test]
  fn replaced_value() {
    let mut logs = Logs::new();
    assert_eq!(logs.add_metric("loss", 3), None);
    assert_eq!(logs.add_metric("loss", 4), Some(3.0));
  }
}
