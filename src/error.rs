use thiserror::Error;


/// Error type returned by user callbacks and stop predicates.

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;


/// Failures that abort a loop or a history operation.

#[derive(Debug, Error)]
pub enum Error {
  #[error("data source exhausted before step {step}")]
  IterationExhausted { step: usize },

  #[error("callback `{name}` failed at step {step}: {source}")]
  Callback {
    name: String,
    step: usize,
    #[source]
    source: BoxError,
  },

  #[error("stop condition failed at step {step}: {source}")]
  StopCondition {
    step: usize,
    #[source]
    source: BoxError,
  },

  #[error("history i/o failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("history encoding failed: {0}")]
  Encoding(#[from] postcard::Error),
}

impl Error {
  /// Step at which a loop failed, if the error came from a running loop.

  pub fn step(&self) -> Option<usize> {
    match self {
      Self::IterationExhausted { step }
      | Self::Callback { step, .. }
      | Self::StopCondition { step, .. } => Some(*step),
      Self::Io(_) | Self::Encoding(_) => None,
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages() {
    let err = Error::Callback { name: "train_step".into(), step: 7, source: "diverged".into() };
    assert_eq!(err.to_string(), "callback `train_step` failed at step 7: diverged");
    assert_eq!(err.step(), Some(7));
    assert!(std::error::Error::source(&err).is_some());

    let err = Error::IterationExhausted { step: 3 };
    assert_eq!(err.to_string(), "data source exhausted before step 3");
  }
}
