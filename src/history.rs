use std::fs;
use std::path::Path;

use num_traits::NumCast;
use serde::{ Serialize, Deserialize };

use crate::{
  error::Result,
  logs::Logs,
  scalar::from_metric,
};


/// Name under which [History::collect] projects a record's step number.

pub const STEPS: &str = "steps";


/// Logs recorded at one step.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub step: usize,
  pub logs: Logs,
}

impl Record {
  fn get(&self, name: &str) -> Option<f64> {
    if name == STEPS {
      Some(self.step as f64)
    } else {
      self.logs.get(name)
    }
  }
}


/// Ordered, append-only sequence of [Logs] produced by a loop.
///
/// Only steps that produced logs are recorded, so records
/// are sparse relative to the step count in general.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
  records: Vec<Record>,
}

impl History {
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn push(&mut self, step: usize, logs: Logs) {
    debug_assert!(self.records.last().map_or(true, |last| last.step < step ),
      "History records must be appended in step order");
    self.records.push(Record { step, logs });
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn records(&self) -> &[Record] {
    &self.records
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Record> {
    self.records.iter()
  }

  pub fn last(&self) -> Option<&Record> {
    self.records.last()
  }

  pub fn at_step(&self, step: usize) -> Option<&Record> {
    self.records
      .binary_search_by_key(&step, |record| record.step )
      .ok()
      .map(|i| &self.records[i] )
  }

  /// Project named fields across all records as parallel sequences.
  ///
  /// Only records containing every requested name contribute, so all
  /// returned sequences have the same length and stay aligned.
  /// [STEPS] yields the step number each record was taken at.

  pub fn collect(&self, names: &[&str]) -> Vec<Vec<f64>> {
    let mut columns = vec![Vec::new(); names.len()];
    for record in &self.records {
      let row: Option<Vec<f64>> = names.iter().map(|name| record.get(name) ).collect();
      if let Some(row) = row {
        for (column, value) in columns.iter_mut().zip(row) {
          column.push(value);
        }
      }
    }
    columns
  }

  /// Single name shorthand for [collect](Self::collect).

  pub fn series(&self, name: &str) -> Vec<f64> {
    self.collect(&[name]).pop().unwrap_or_default()
  }

  /// Like [series](Self::series), converted to a numeric type of choice.
  /// Values that don't fit are skipped.

  pub fn series_as<N: NumCast>(&self, name: &str) -> Vec<N> {
    self.series(name)
      .into_iter()
      .filter_map(from_metric)
      .collect()
  }

  pub fn to_bytes(&self) -> Result<Vec<u8>> {
    Ok(postcard::to_allocvec(self)?)
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
    Ok(postcard::from_bytes(bytes)?)
  }

  pub fn save(&self, filename: impl AsRef<Path>) -> Result<()> {
    fs::write(filename, self.to_bytes()?)?;
    Ok(())
  }

  pub fn load(filename: impl AsRef<Path>) -> Result<Self> {
    let bytes = fs::read(filename)?;
    Self::from_bytes(&bytes)
  }
}

impl<'a> IntoIterator for &'a History {
  type Item = &'a Record;
  type IntoIter = std::slice::Iter<'a, Record>;

  fn into_iter(self) -> Self::IntoIter {
    self.records.iter()
  }
}
