//! Error types for the L-SHADE optimizer.
//!
//! Configuration problems are detected before any population is created.
//! Objective failures abort the run. Numeric degeneracy inside the parameter
//! memory update is recovered locally and never shows up here.

use thiserror::Error;

/// Errors that can occur while configuring or running L-SHADE.
#[derive(Debug, Error)]
pub enum LShadeError {
    /// Population size must be a positive integer.
    #[error("population_size must be a positive integer (got {population_size})")]
    InvalidPopulationSize {
        /// The rejected population size
        population_size: usize,
    },

    /// Individual size must be a positive integer.
    #[error("individual_size must be a positive integer (got {individual_size})")]
    InvalidIndividualSize {
        /// The rejected individual size
        individual_size: usize,
    },

    /// Evaluation budget must be a positive integer.
    #[error("max_evals must be a positive integer (got {max_evals})")]
    InvalidMaxEvals {
        /// The rejected budget
        max_evals: usize,
    },

    /// Parameter memory needs at least one slot.
    #[error("memory_size must be a positive integer (got {memory_size})")]
    InvalidMemorySize {
        /// The rejected memory size
        memory_size: usize,
    },

    /// Bounds must be an `individual_size x 2` matrix.
    #[error("bounds must have shape ({expected_rows}, 2), got ({rows}, {cols})")]
    BoundsShape {
        /// Number of rows implied by `individual_size`
        expected_rows: usize,
        /// Rows provided
        rows: usize,
        /// Columns provided
        cols: usize,
    },

    /// A bound row is not a finite `lower <= upper` pair.
    #[error("invalid bounds at index {index}: lower ({lower}) must be finite and <= upper ({upper})")]
    InvalidBounds {
        /// Row of the invalid bound pair
        index: usize,
        /// The lower bound value
        lower: f64,
        /// The upper bound value
        upper: f64,
    },

    /// Precision, when set, must be a positive finite real.
    #[error("precision must be a positive finite number (got {precision})")]
    InvalidPrecision {
        /// The rejected precision
        precision: f64,
    },

    /// The bounded scale-factor resampling loop ran out of rounds.
    #[error("scale factor resampling did not converge after {rounds} rounds ({remaining} draws still invalid)")]
    ResampleExhausted {
        /// Rounds attempted
        rounds: usize,
        /// Draws still outside (0, 1] when giving up
        remaining: usize,
    },

    /// A sampling distribution could not be built.
    #[error("cannot build sampling distribution: {0}")]
    Distribution(String),

    /// The evaluator returned a fitness array of the wrong length.
    #[error("evaluator returned {got} fitness values for {expected} individuals")]
    EvaluationShape {
        /// Number of individuals evaluated
        expected: usize,
        /// Number of fitness values returned
        got: usize,
    },

    /// The objective function failed on one individual.
    #[error("objective failed on individual {index}: {message}")]
    Evaluation {
        /// Row of the individual being evaluated
        index: usize,
        /// Error reported by the objective
        message: String,
    },

    /// Writing records failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing records to CSV failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// A specialized `Result` type for L-SHADE operations.
pub type Result<T> = std::result::Result<T, LShadeError>;

impl LShadeError {
    /// Returns `true` if this is a bounds-related configuration error.
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            LShadeError::BoundsShape { .. } | LShadeError::InvalidBounds { .. }
        )
    }

    /// Returns `true` if this error was raised by configuration validation.
    pub fn is_config_error(&self) -> bool {
        self.is_bounds_error()
            || matches!(
                self,
                LShadeError::InvalidPopulationSize { .. }
                    | LShadeError::InvalidIndividualSize { .. }
                    | LShadeError::InvalidMaxEvals { .. }
                    | LShadeError::InvalidMemorySize { .. }
                    | LShadeError::InvalidPrecision { .. }
            )
    }

    /// Returns `true` if an internal invariant of the optimizer was violated.
    pub fn is_internal_error(&self) -> bool {
        matches!(
            self,
            LShadeError::ResampleExhausted { .. }
                | LShadeError::Distribution(_)
                | LShadeError::EvaluationShape { .. }
        )
    }
}
