//! Step-based training loops.
//! Tiny. Few dependencies. Makes no assumptions about your model.
//!
//! # Features
//!
//! - **Opaque state** — The loop never looks inside your training state.
//! Step callbacks take it by value and hand back a new one, so
//! immutable, replace-on-update state types work naturally.
//!
//! - **Trigger tables** — Callbacks run on the steps their [Trigger] selects,
//! in registration order, each one seeing the state and logs left behind
//! by the ones before it.
//!
//! - **Typed logs** — Metrics of any primitive numeric type get recorded as `f64`
//! under their name. Later writes win when two callbacks log the same name in one step.
//!
//! - **History projection** — The [History] of all recorded steps can be projected
//! into aligned columns for plotting or analysis, and saved to disc.
//!
//! - **Monitoring** — Includes a keras style [ProgressBar] and [EarlyStopping].
//!
//! # Examples
//!
//! Running a loop over a stream of batches:
//! ```
//! use microloop::{ Loop, Logs, Trigger, ProgressBar, Stop };
//!
//! fn main() -> Result<(), microloop::Error> {
//!   // Any data source that can be iterated
//!   let batches = (1..).map(|i| i as f64 );
//!
//!   let outcome = Loop::new(Stop::steps(100))
//!     // Training step: consume state, return logs and new state
//!     .step(Trigger::every(1), "train_step", |state: f64, batch: &f64| {
//!       let loss = 10.0 / batch;
//!       Ok((Logs::new().metric("loss", loss), state + loss))
//!     })
//!     // Monitors only observe
//!     .observe(Trigger::every(10), ProgressBar::new(100))
//!     .run(0.0, batches)?;
//!
//!   let (_state, history, _last_logs) = outcome.into_parts();
//!   let columns = history.collect(&["steps", "loss"]);
//!   assert_eq!(columns[1].len(), 100);
//!   Ok(())
//! }
//! ```
//!
//! ## More examples
//! Check the `/demos` folder for a complete classifier training script.

mod internal;
mod driver;

pub mod error;
pub mod scalar;
pub mod logs;
pub mod history;
pub mod trigger;
pub mod callback;
pub mod stop;
pub mod progress;

pub use error::{ Error, Result, BoxError };
pub use logs::{ Logs, Value };
pub use history::{ History, Record, STEPS };
pub use trigger::Trigger;
pub use callback::{ Callback, Monitor, StepFn };
pub use stop::{ Stop, EarlyStopping, Mode };
pub use progress::ProgressBar;
pub use driver::{ Loop, Outcome, Elapsed, run };
