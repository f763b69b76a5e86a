use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;
use proptest::prelude::*;

use microloop::{ Loop, Logs, Trigger, Stop, Error, History, EarlyStopping, Mode, STEPS };


// Unbounded source that counts how many batches were pulled
fn counting_source(pulls: Rc<Cell<usize>>) -> impl Iterator<Item = usize> {
  (1..).inspect(move |_| pulls.set(pulls.get() + 1) )
}

fn inverse_loss(n: usize) -> History {
  Loop::new(Stop::steps(n))
    .step(Trigger::every(1), "train_step", |state: (), step: &usize| {
      Ok((Logs::new().metric("loss", 10.0 / *step as f64), state))
    })
    .run((), 1_usize..)
    .unwrap()
    .history
}

#[test]
fn loss_over_steps_scenario() {
  let outcome = Loop::new(Stop::steps(100))
    .step(Trigger::every(1), "train_step", |state: (), step: &usize| {
      Ok((Logs::new().metric("loss", 10.0 / *step as f64), state))
    })
    .run((), 1_usize..)
    .unwrap();
  let loss = outcome.history.series("loss");
  assert_eq!(outcome.history.len(), 100);
  assert_eq!(loss[0], 10.0);
  assert_relative_eq!(loss[99], 0.1, epsilon = 1e-12);
  assert_eq!(outcome.elapsed.steps, 100);
}

#[test]
fn exhaustion_returns_nothing() {
  let result = Loop::new(Stop::steps(10))
    .step(Trigger::Always, "train_step", |state: u32, _: &u8| Ok((Logs::new().metric("x", 1), state + 1)) )
    .run(0, vec![0_u8; 7]);
  match result {
    Err(Error::IterationExhausted { step }) => assert_eq!(step, 8),
    other => panic!("expected exhaustion, got {other:?}"),
  }
}

#[test]
fn early_stopping_with_ceiling() {
  // Loss stops improving after step 5
  let losses = [5.0, 4.0, 3.0, 2.0, 1.0, 1.5, 1.2, 1.1, 1.3, 1.0];
  let outcome = Loop::new(Stop::steps(losses.len()).or(EarlyStopping::new("loss", 3, Mode::Min).into_stop()))
    .step(Trigger::Always, "train_step", |state: (), loss: &f64| Ok((Logs::new().metric("loss", *loss), state)) )
    .run((), losses)
    .unwrap();
  assert_eq!(outcome.elapsed.steps, 8);
  assert_eq!(outcome.history.series(STEPS).last(), Some(&8.0));
}

#[test]
fn deterministic_history_survives_persistence() {
  let history = inverse_loss(12);
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("history.bin");
  history.save(&path).unwrap();
  assert_eq!(History::load(&path).unwrap(), history);
}

proptest! {
  #[test]
  fn ceiling_pulls_exactly_n_batches(n in 0usize..200) {
    let pulls = Rc::new(Cell::new(0));
    let outcome = Loop::new(Stop::steps(n))
      .step(Trigger::Always, "train_step", |state: usize, _: &usize| Ok((Logs::new(), state + 1)) )
      .run(0, counting_source(pulls.clone()))
      .unwrap();
    prop_assert_eq!(pulls.get(), n);
    prop_assert_eq!(outcome.state, n);
  }

  #[test]
  fn every_k_records_floor_n_over_k(n in 0usize..300, k in 1usize..20) {
    let outcome = Loop::new(Stop::steps(n))
      .step(Trigger::every(k), "eval", |state: (), _: &usize| Ok((Logs::new().metric("score", 1), state)) )
      .run((), 1..)
      .unwrap();
    prop_assert_eq!(outcome.history.len(), n / k);
    prop_assert!(outcome.history.iter().all(|record| record.step % k == 0 ));
  }

  #[test]
  fn projection_rezips_to_records(n in 1usize..100, k in 1usize..7) {
    let outcome = Loop::new(Stop::steps(n))
      .step(Trigger::Always, "train_step", |state: (), step: &usize| {
        Ok((Logs::new().metric("loss", 1.0 / *step as f64), state))
      })
      .step(Trigger::every(k), "eval", |state: (), step: &usize| {
        Ok((Logs::new().metric("val_loss", 2.0 / *step as f64), state))
      })
      .run((), 1_usize..)
      .unwrap();
    let history = &outcome.history;
    let columns = history.collect(&[STEPS, "val_loss"]);
    prop_assert_eq!(columns[0].len(), columns[1].len());
    prop_assert_eq!(columns[0].len(), n / k);
    for (step, value) in columns[0].iter().zip(&columns[1]) {
      let record = history.at_step(*step as usize).unwrap();
      prop_assert_eq!(record.logs.get_metric("val_loss"), Some(*value));
    }
  }

  #[test]
  fn identical_runs_identical_histories(n in 0usize..50) {
    let first = Loop::new(Stop::steps(n))
      .step(Trigger::Always, "train_step", |state: (), step: &usize| Ok((Logs::new().metric("loss", 1.0 / *step as f64), state)) )
      .run((), 1_usize..)
      .unwrap();
    let second = Loop::new(Stop::steps(n))
      .step(Trigger::Always, "train_step", |state: (), step: &usize| Ok((Logs::new().metric("loss", 1.0 / *step as f64), state)) )
      .run((), 1_usize..)
      .unwrap();
    prop_assert_eq!(first.history, second.history);
    prop_assert_eq!(first.logs, second.logs);
  }

  #[test]
  fn exhaustion_before_ceiling(len in 0usize..30, extra in 1usize..10) {
    let result = Loop::new(Stop::steps(len + extra))
      .step(Trigger::Always, "train_step", |state: (), _: &usize| Ok((Logs::new(), state)) )
      .run((), 0..len);
    let exhausted = matches!(result, Err(Error::IterationExhausted { step }) if step == len + 1);
    prop_assert!(exhausted);
  }
}
