use std::fmt;


/// Decides whether a [Callback](crate::Callback) runs on a given step.
///
/// Steps are numbered starting at 1.

pub enum Trigger {
  /// Every step
  Always,
  /// Steps that are multiples of n
  Every(usize),
  /// Exactly one step
  At(usize),
  /// Any predicate over the step number
  Custom(Box<dyn Fn(usize) -> bool>),
}

impl Trigger {
  pub fn every(steps: usize) -> Self {
    assert!(steps > 0, "Trigger interval must be at least one step");
    if steps == 1 { Self::Always } else { Self::Every(steps) }
  }

  pub fn at(step: usize) -> Self {
    Self::At(step)
  }

  pub fn custom(predicate: impl Fn(usize) -> bool + 'static) -> Self {
    Self::Custom(Box::new(predicate))
  }

  pub fn fires(&self, step: usize) -> bool {
    match self {
      Self::Always => true,
      Self::Every(n) => step % n == 0,
      Self::At(n) => step == *n,
      Self::Custom(predicate) => predicate(step),
    }
  }
}

impl fmt::Debug for Trigger {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Always => write!(f, "Always"),
      Self::Every(n) => write!(f, "Every({n})"),
      Self::At(n) => write!(f, "At({n})"),
      Self::Custom(_) => write!(f, "Custom"),
    }
  }
}
