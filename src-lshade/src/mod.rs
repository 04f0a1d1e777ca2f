//! L-SHADE global optimizer in pure Rust using ndarray
//!
//! Success-history based adaptive differential evolution with linear
//! population size reduction: a derivative-free minimizer for box-constrained
//! real vectors, suited to noisy, non-convex or multimodal objectives.
//!
//! Supported features:
//! - Box constraints (lower/upper bounds)
//! - current-to-pbest/1 mutation with an archive of displaced parents
//! - Binomial crossover
//! - Per-individual CR ~ Normal and F ~ Cauchy around a circular success memory
//! - Population shrinking linearly from its initial size to 4 over the budget
//! - Early stop once the best fitness stagnated for a cumulative number of generations
//! - Read-only per-generation snapshot callback, optional fitness history
//! - Parallel objective evaluation with rayon

#![allow(missing_docs)]
use std::fmt;

use ndarray::{Array1, Array2};
use serde::Serialize;

pub mod archive;
pub mod convergence;
pub mod error;
pub mod memory;
pub mod schedule;

pub mod distinct_indices;
pub mod init_random;

pub mod crossover_binomial;
pub mod mutant_current_to_pbest1;
pub mod selection;

pub mod minimize;
pub mod operators;
pub mod parallel_eval;
pub mod recorder;
pub mod run_recorded;
pub mod solver;

pub use archive::Archive;
pub use convergence::ConvergenceMonitor;
pub use error::{LShadeError, Result};
pub use memory::{ParameterMemory, SampledParameters};
pub use minimize::{lshade, try_lshade};
pub use operators::{
    BinomialCrossover, Crossover, CurrentToPBest1, Evaluator, FallibleObjectiveEvaluator,
    GreedySelection, Initializer, Mutator, ObjectiveEvaluator, Operators, RandomInit, Selection,
    Selector,
};
pub use parallel_eval::ParallelConfig;
pub use recorder::{GenerationRecord, GenerationRecorder};
pub use run_recorded::run_recorded_lshade;
pub use schedule::{MIN_POPULATION_SIZE, PopulationSchedule};
pub use solver::{CallbackAction, GenerationSnapshot, LShade};

/// Default number of slots in the success-history memory.
pub const DEFAULT_MEMORY_SIZE: usize = 6;

/// Index and value of the smallest entry, skipping NaN. An all-NaN vector
/// gives `(0, NaN)`.
pub(crate) fn argmin(v: &Array1<f64>) -> (usize, f64) {
	let mut best: Option<(usize, f64)> = None;
	for (i, &val) in v.iter().enumerate() {
		if val.is_nan() {
			continue;
		}
		match best {
			Some((_, b)) if val >= b => {}
			_ => best = Some((i, val)),
		}
	}
	best.unwrap_or((0, f64::NAN))
}

/// Per-generation telemetry callback
pub type Callback = Box<dyn FnMut(&GenerationSnapshot<'_>) -> CallbackAction>;

/// Configuration for the L-SHADE optimizer
pub struct LShadeConfig {
	/// Initial population size
	pub population_size: usize,
	/// Number of variables; `None` infers it from `bounds`
	pub individual_size: Option<usize>,
	/// `individual_size x 2` matrix, column 0 = min, column 1 = max
	pub bounds: Array2<f64>,
	/// Evaluation budget
	pub max_evals: usize,
	/// Slots in the CR/F success memory
	pub memory_size: usize,
	/// Stagnation threshold on the best fitness; `None` disables the early stop
	pub precision: Option<f64>,
	/// Stagnating generations allowed over the whole run (`None` or 0 => 2 * individual_size)
	pub max_evals_after_converge: Option<usize>,
	pub seed: Option<u64>,
	/// Keep the best fitness of every generation in the report
	pub return_history: bool,
	/// Optional per-generation callback (may stop early)
	pub callback: Option<Callback>,
	/// Parallel evaluation configuration
	pub parallel: ParallelConfig,
}

impl Default for LShadeConfig {
	fn default() -> Self {
		Self {
			population_size: 100,
			individual_size: None,
			bounds: Array2::zeros((0, 2)),
			max_evals: 10_000,
			memory_size: DEFAULT_MEMORY_SIZE,
			precision: None,
			max_evals_after_converge: None,
			seed: None,
			return_history: false,
			callback: None,
			parallel: ParallelConfig::default(),
		}
	}
}

impl fmt::Debug for LShadeConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LShadeConfig")
			.field("population_size", &self.population_size)
			.field("individual_size", &self.individual_size)
			.field("bounds", &format!("{}x{}", self.bounds.nrows(), self.bounds.ncols()))
			.field("max_evals", &self.max_evals)
			.field("memory_size", &self.memory_size)
			.field("precision", &self.precision)
			.field("max_evals_after_converge", &self.max_evals_after_converge)
			.field("seed", &self.seed)
			.field("return_history", &self.return_history)
			.field("callback", &self.callback.is_some())
			.field("parallel", &self.parallel)
			.finish()
	}
}

impl LShadeConfig {
	/// Preset scaled to the problem size: budget `10000 * dim`, population
	/// `18 * dim`, precision `1e-6`, stagnation budget `2 * dim`.
	///
	/// Bounds are left empty and must be filled in before solving.
	pub fn for_dimension(dim: usize) -> Self {
		Self {
			population_size: 18 * dim,
			individual_size: Some(dim),
			max_evals: 10_000 * dim,
			precision: Some(1e-6),
			max_evals_after_converge: Some(2 * dim),
			..Self::default()
		}
	}

	/// Number of variables: explicit `individual_size` or the number of bound rows.
	pub fn dimension(&self) -> usize {
		self.individual_size.unwrap_or(self.bounds.nrows())
	}

	/// Stagnation budget after substituting the default for missing or zero values.
	pub fn stagnation_budget(&self) -> usize {
		match self.max_evals_after_converge {
			Some(n) if n > 0 => n,
			_ => 2 * self.dimension(),
		}
	}

	/// Check the configuration; the first violation is reported.
	pub fn validate(&self) -> Result<()> {
		if self.population_size == 0 {
			return Err(LShadeError::InvalidPopulationSize { population_size: self.population_size });
		}
		let n = self.dimension();
		if n == 0 {
			return Err(LShadeError::InvalidIndividualSize { individual_size: n });
		}
		if self.max_evals == 0 {
			return Err(LShadeError::InvalidMaxEvals { max_evals: self.max_evals });
		}
		if self.memory_size == 0 {
			return Err(LShadeError::InvalidMemorySize { memory_size: self.memory_size });
		}
		if self.bounds.nrows() != n || self.bounds.ncols() != 2 {
			return Err(LShadeError::BoundsShape {
				expected_rows: n,
				rows: self.bounds.nrows(),
				cols: self.bounds.ncols(),
			});
		}
		for (i, row) in self.bounds.rows().into_iter().enumerate() {
			let (lower, upper) = (row[0], row[1]);
			if !lower.is_finite() || !upper.is_finite() || lower > upper {
				return Err(LShadeError::InvalidBounds { index: i, lower, upper });
			}
		}
		if let Some(precision) = self.precision {
			if !(precision.is_finite() && precision > 0.0) {
				return Err(LShadeError::InvalidPrecision { precision });
			}
		}
		Ok(())
	}
}

/// Build an `n x 2` bounds matrix from `(lower, upper)` pairs.
pub fn bounds_matrix(bounds: &[(f64, f64)]) -> Array2<f64> {
	let mut m = Array2::<f64>::zeros((bounds.len(), 2));
	for (i, (lo, hi)) in bounds.iter().enumerate() {
		m[(i, 0)] = *lo;
		m[(i, 1)] = *hi;
	}
	m
}

/// Fluent builder for `LShadeConfig` for ergonomic configuration.
pub struct LShadeConfigBuilder {
	cfg: LShadeConfig,
}
impl Default for LShadeConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}
impl LShadeConfigBuilder {
	pub fn new() -> Self {
		Self { cfg: LShadeConfig::default() }
	}
	/// Start from [`LShadeConfig::for_dimension`].
	pub fn for_dimension(dim: usize) -> Self {
		Self { cfg: LShadeConfig::for_dimension(dim) }
	}
	pub fn population_size(mut self, v: usize) -> Self {
		self.cfg.population_size = v;
		self
	}
	pub fn individual_size(mut self, v: usize) -> Self {
		self.cfg.individual_size = Some(v);
		self
	}
	pub fn bounds(mut self, v: &[(f64, f64)]) -> Self {
		self.cfg.bounds = bounds_matrix(v);
		self
	}
	pub fn bounds_matrix(mut self, v: Array2<f64>) -> Self {
		self.cfg.bounds = v;
		self
	}
	pub fn max_evals(mut self, v: usize) -> Self {
		self.cfg.max_evals = v;
		self
	}
	pub fn memory_size(mut self, v: usize) -> Self {
		self.cfg.memory_size = v;
		self
	}
	pub fn precision(mut self, v: f64) -> Self {
		self.cfg.precision = Some(v);
		self
	}
	pub fn max_evals_after_converge(mut self, v: usize) -> Self {
		self.cfg.max_evals_after_converge = Some(v);
		self
	}
	pub fn seed(mut self, v: u64) -> Self {
		self.cfg.seed = Some(v);
		self
	}
	pub fn return_history(mut self, v: bool) -> Self {
		self.cfg.return_history = v;
		self
	}
	pub fn callback(mut self, cb: Callback) -> Self {
		self.cfg.callback = Some(cb);
		self
	}
	pub fn parallel(mut self, parallel: ParallelConfig) -> Self {
		self.cfg.parallel = parallel;
		self
	}
	pub fn enable_parallel(mut self, enable: bool) -> Self {
		self.cfg.parallel.enabled = enable;
		self
	}
	pub fn parallel_threads(mut self, num_threads: usize) -> Self {
		self.cfg.parallel.num_threads = Some(num_threads);
		self
	}
	pub fn build(self) -> LShadeConfig {
		self.cfg
	}
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
	/// The stagnation countdown reached zero
	Stagnation,
	/// The evaluation budget was used up
	MaxEvals,
	/// The callback asked to stop
	Callback,
}

/// Result/Report of an L-SHADE run
#[derive(Clone, Serialize)]
pub struct LShadeReport {
	pub x: Array1<f64>,
	pub fun: f64,
	pub success: bool,
	pub message: String,
	pub termination: Termination,
	/// Generations completed
	pub nit: usize,
	/// Objective evaluations performed
	pub nfev: usize,
	pub population: Array2<f64>,
	pub population_fitness: Array1<f64>,
	/// Minimum fitness of every generation, when requested
	pub history: Option<Vec<f64>>,
}

impl fmt::Debug for LShadeReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LShadeReport")
			.field("x", &format!("len={}", self.x.len()))
			.field("fun", &self.fun)
			.field("success", &self.success)
			.field("message", &self.message)
			.field("termination", &self.termination)
			.field("nit", &self.nit)
			.field("nfev", &self.nfev)
			.field(
				"population",
				&format!("{}x{}", self.population.nrows(), self.population.ncols()),
			)
			.field("population_fitness", &format!("len={}", self.population_fitness.len()))
			.field("history", &self.history.as_ref().map(|h| format!("len={}", h.len())))
			.finish()
	}
}
