// This demo trains a one-layer linear classifier on a synthetic, MNIST-shaped
// dataset and prints the resulting loss and accuracy curves.

// The model, its gradients and the AdamW update are hand written glue code.
// The loop itself only ever sees an opaque State and a stream of batches.

// Run with RUST_LOG=debug to see the loop's own tracing output.

use rand::{ Rng, SeedableRng, rngs::StdRng, seq::SliceRandom };
use tracing_subscriber::EnvFilter;

use microloop::{ Loop, Logs, Trigger, Stop, ProgressBar, BoxError, STEPS };

const SIDE: usize = 8;
const FEATURES: usize = SIDE * SIDE;
const CLASSES: usize = 10;
const BATCH_SIZE: usize = 32;


// --- Data ---

struct Sample {
  image: Vec<f32>,
  label: usize,
}

struct Batch {
  images: Vec<f32>,
  labels: Vec<usize>,
}

// Polar Box-Muller transformation
fn randn(rng: &mut impl Rng) -> (f32, f32) {
  loop {
    let u: f32 = rng.gen_range(-1.0, 1.0);
    let v: f32 = rng.gen_range(-1.0, 1.0);
    let r = u * u + v * v;
    // Try again if outside interval
    if r == 0.0 || r >= 1.0 { continue }
    let c = (-2.0 * r.ln() / r).sqrt();
    return (u * c, v * c)
  }
}

// One random prototype image per class, samples are noisy copies of it
fn synthetic_dataset(len: usize, rng: &mut impl Rng) -> Vec<Sample> {
  let prototypes: Vec<Vec<f32>> = (0..CLASSES)
    .map(|_| (0..FEATURES).map(|_| rng.gen_range(0.0, 255.0) ).collect() )
    .collect();
  (0..len).map(|i| {
    let label = i % CLASSES;
    let image = prototypes[label].iter()
      .map(|&pixel| (pixel + randn(&mut *rng).0 * 60.0).max(0.0).min(255.0) )
      .collect();
    Sample { image, label }
  }).collect()
}

// Shuffled, batched and endlessly repeated
fn batches(mut samples: Vec<Sample>, batch_size: usize, seed: u64) -> impl Iterator<Item = Batch> {
  assert!(!samples.is_empty(), "Cannot draw batches from an empty dataset");
  let mut rng = StdRng::seed_from_u64(seed);
  let mut cursor = samples.len();
  std::iter::from_fn(move || {
    let mut batch = Batch {
      images: Vec::with_capacity(batch_size * FEATURES),
      labels: Vec::with_capacity(batch_size),
    };
    while batch.labels.len() < batch_size {
      if cursor == samples.len() {
        samples.shuffle(&mut rng);
        cursor = 0;
      }
      batch.images.extend_from_slice(&samples[cursor].image);
      batch.labels.push(samples[cursor].label);
      cursor += 1;
    }
    Some(batch)
  })
}


// --- Model ---

// Weights [FEATURES, CLASSES] followed by bias [CLASSES], stored flat
#[derive(Debug, Clone)]
struct LinearClassifier {
  params: Vec<f32>,
}

impl LinearClassifier {
  pub fn new(rng: &mut impl Rng) -> Self {
    let scale = 1.0 / (FEATURES as f32).sqrt();
    let mut params: Vec<f32> = (0..FEATURES * CLASSES).map(|_| randn(&mut *rng).0 * scale ).collect();
    params.extend(std::iter::repeat(0.0).take(CLASSES));
    Self { params }
  }

  fn weight(&self, feature: usize, class: usize) -> f32 {
    self.params[feature * CLASSES + class]
  }

  fn bias(&self, class: usize) -> f32 {
    self.params[FEATURES * CLASSES + class]
  }

  // Flatten and rescale to [0, 1]
  pub fn run(&self, image: &[f32]) -> [f32; CLASSES] {
    let mut logits = [0.0; CLASSES];
    for (class, logit) in logits.iter_mut().enumerate() {
      *logit = self.bias(class) + image.iter()
        .enumerate()
        .map(|(feature, pixel)| pixel / 255.0 * self.weight(feature, class) )
        .sum::<f32>();
    }
    logits
  }

  // Mean softmax cross-entropy, accuracy and gradient w.r.t. params
  pub fn loss(&self, batch: &Batch) -> (f32, f32, Vec<f32>) {
    let n = batch.labels.len() as f32;
    let mut grads = vec![0.0; self.params.len()];
    let mut loss = 0.0;
    let mut correct = 0;
    for (image, &label) in batch.images.chunks(FEATURES).zip(&batch.labels) {
      let logits = self.run(image);
      let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
      let exp: Vec<f32> = logits.iter().map(|z| (z - max).exp() ).collect();
      let sum: f32 = exp.iter().sum();
      loss -= (exp[label] / sum).ln();
      let predicted = logits.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &z)| if z > best.1 { (i, z) } else { best } )
        .0;
      if predicted == label { correct += 1 }
      for class in 0..CLASSES {
        let target = if class == label { 1.0 } else { 0.0 };
        let delta = (exp[class] / sum - target) / n;
        for (feature, pixel) in image.iter().enumerate() {
          grads[feature * CLASSES + class] += pixel / 255.0 * delta;
        }
        grads[FEATURES * CLASSES + class] += delta;
      }
    }
    (loss / n, correct as f32 / n, grads)
  }
}


// --- Optimizer ---

trait Transform {
  type State;
  fn init(&self, params: &[f32]) -> Self::State;
  fn update(&self, grads: &[f32], state: Self::State, params: &[f32]) -> (Vec<f32>, Self::State);
}

fn apply_updates(params: &[f32], updates: &[f32]) -> Vec<f32> {
  params.iter().zip(updates).map(|(p, u)| p + u ).collect()
}

// Adaptive Movement Estimation with decoupled weight decay
#[derive(Debug, Clone)]
struct AdamW {
  learning_rate: f32,
  beta1: f32,
  beta2: f32,
  weight_decay: f32,
}

impl AdamW {
  pub fn new(learning_rate: f32) -> Self {
    Self { learning_rate, beta1: 0.9, beta2: 0.999, weight_decay: 1e-4 }
  }
}

struct AdamState {
  step: i32,
  m: Vec<f32>,
  v: Vec<f32>,
}

impl Transform for AdamW {
  type State = AdamState;

  fn init(&self, params: &[f32]) -> AdamState {
    AdamState { step: 0, m: vec![0.0; params.len()], v: vec![0.0; params.len()] }
  }

  fn update(&self, grads: &[f32], state: AdamState, params: &[f32]) -> (Vec<f32>, AdamState) {
    let step = state.step + 1;
    let m: Vec<f32> = state.m.iter().zip(grads)
      .map(|(m, g)| m * self.beta1 + g * (1.0 - self.beta1) )
      .collect();
    let v: Vec<f32> = state.v.iter().zip(grads)
      .map(|(v, g)| v * self.beta2 + g * g * (1.0 - self.beta2) )
      .collect();
    let mc = 1.0 - self.beta1.powi(step);
    let vc = 1.0 - self.beta2.powi(step);
    let updates = m.iter().zip(&v).zip(params)
      .map(|((m, v), p)| -self.learning_rate * ((m / mc) / ((v / vc).sqrt() + 1e-8) + self.weight_decay * p) )
      .collect();
    (updates, AdamState { step, m, v })
  }
}


// --- Training ---

struct State<T: Transform> {
  params: LinearClassifier,
  opt_state: T::State,
  tx: T,
}

impl<T: Transform> State<T> {
  pub fn create(params: LinearClassifier, tx: T) -> Self {
    let opt_state = tx.init(&params.params);
    Self { params, opt_state, tx }
  }

  pub fn apply_gradients(self, grads: &[f32]) -> Self {
    let (updates, opt_state) = self.tx.update(grads, self.opt_state, &self.params.params);
    let params = LinearClassifier { params: apply_updates(&self.params.params, &updates) };
    Self { params, opt_state, ..self }
  }
}

fn train_step<T: Transform>(state: State<T>, batch: &Batch) -> Result<(Logs, State<T>), BoxError> {
  let (loss, accuracy, grads) = state.params.loss(batch);
  if !loss.is_finite() {
    return Err(format!("loss diverged to {loss}").into())
  }
  let state = state.apply_gradients(&grads);
  let logs = Logs::new()
    .metric("loss", loss)
    .metric("accuracy", accuracy);
  Ok((logs, state))
}


fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let mut rng = StdRng::seed_from_u64(0);
  let data = batches(synthetic_dataset(4096, &mut rng), BATCH_SIZE, 1);

  // Initialize state
  let model = LinearClassifier::new(&mut rng);
  let state = State::create(model, AdamW::new(1e-3));

  // Training loop
  let total_samples = 32 * 100;
  let total_steps = total_samples / BATCH_SIZE;

  let outcome = Loop::new(Stop::steps(total_steps))
    .step(Trigger::every(1), "train_step", train_step::<AdamW>)
    .observe(Trigger::every(1), ProgressBar::new(total_steps))
    .run(state, data)?;

  let (_state, history, _logs) = outcome.into_parts();

  // Training curves, one row every ten steps
  let columns = history.collect(&[STEPS, "loss", "accuracy"]);
  println!("{:>6} {:>10} {:>10}", "step", "loss", "accuracy");
  for i in (0..columns[0].len()).step_by(10).chain(std::iter::once(columns[0].len() - 1)) {
    println!("{:>6} {:>10.4} {:>10.4}", columns[0][i], columns[1][i], columns[2][i]);
  }

  Ok(())
}
