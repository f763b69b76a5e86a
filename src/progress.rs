use std::io::{ self, Write };

use itertools::Itertools;

use crate::{
  internal::*,
  error::BoxError,
  logs::Logs,
  driver::Elapsed,
  callback::Monitor,
};


/// Keras style progress display.
///
/// Redraws a single line per step, showing the step count, a bar when
/// the total is known, elapsed time and the metrics logged so far in the
/// current step. Produces no logs of its own.
///
/// ```text
///   42/100 [===========>..................] - 1.3s - accuracy: 0.8125 - loss: 0.5531
/// ```

pub struct ProgressBar<W: Write = io::Stderr> {
  total: Option<usize>,
  width: usize,
  sink: W,
  last_len: usize,
}

impl ProgressBar<io::Stderr> {
  pub fn new(total: usize) -> Self {
    Self::with_sink(Some(total), io::stderr())
  }

  /// Progress for loops without a known step ceiling.

  pub fn open_ended() -> Self {
    Self::with_sink(None, io::stderr())
  }
}

impl<W: Write> ProgressBar<W> {
  pub fn with_sink(total: Option<usize>, sink: W) -> Self {
    Self { total, width: 30, sink, last_len: 0 }
  }

  pub fn width(mut self, width: usize) -> Self {
    self.width = width;
    self
  }

  pub fn into_sink(self) -> W {
    self.sink
  }

  pub fn render(&self, logs: &Logs, elapsed: &Elapsed) -> String {
    let step = elapsed.steps;
    let head = match self.total {
      Some(total) => {
        let digits = total.to_string().len();
        format!("{step:>digits$}/{total} {}", render_bar(step, total, self.width))
      },
      None => format!("{step}"),
    };
    let metrics = logs.metrics()
      .map(|(name, value)| format!("{name}: {}", format_metric(value)) );
    std::iter::once(head)
      .chain(std::iter::once(format_seconds(elapsed.seconds)))
      .chain(metrics)
      .join(" - ")
  }

  fn draw(&mut self, line: &str, finished: bool) -> io::Result<()> {
    // Pad with blanks to wipe leftovers of a longer previous line
    let padding = self.last_len.saturating_sub(line.len());
    write!(self.sink, "\r{line}{:padding$}", "")?;
    self.last_len = line.len();
    if finished {
      writeln!(self.sink)?;
      self.last_len = 0;
    }
    self.sink.flush()
  }
}

impl<S, W: Write> Monitor<S> for ProgressBar<W> {
  fn observe(&mut self, _state: &S, logs: &Logs, elapsed: &Elapsed) -> Result<Option<Logs>, BoxError> {
    let line = self.render(logs, elapsed);
    let finished = self.total.map_or(false, |total| elapsed.steps >= total );
    self.draw(&line, finished)?;
    Ok(None)
  }

  fn name(&self) -> &str {
    "progress_bar"
  }
}
