use std::fmt::Display;

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::error::{LShadeError, Result};

/// Parallel evaluation configuration
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Enable parallel evaluation
    pub enabled: bool,
    /// Number of threads to use (None = use rayon default)
    pub num_threads: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            num_threads: None, // Use rayon's default (typically num_cpus)
        }
    }
}

/// Evaluate every row of `population`, possibly in parallel.
///
/// Row `i` of the population always maps to entry `i` of the result.
pub fn evaluate_population_parallel<F>(
    population: &Array2<f64>,
    eval_fn: &F,
    config: &ParallelConfig,
) -> Array1<f64>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    let npop = population.nrows();

    if !config.enabled || npop < 4 {
        return population.rows().into_iter().map(|row| eval_fn(&row.to_owned())).collect();
    }

    let results = (0..npop)
        .into_par_iter()
        .map(|i| eval_fn(&population.row(i).to_owned()))
        .collect::<Vec<f64>>();

    Array1::from_vec(results)
}

/// Fallible variant: any failing row aborts the batch with its row index.
pub fn try_evaluate_population_parallel<F, E>(
    population: &Array2<f64>,
    eval_fn: &F,
    config: &ParallelConfig,
) -> Result<Array1<f64>>
where
    F: Fn(&Array1<f64>) -> std::result::Result<f64, E> + Sync,
    E: Display,
{
    let npop = population.nrows();
    let wrap = |i: usize| {
        eval_fn(&population.row(i).to_owned())
            .map_err(|e| LShadeError::Evaluation { index: i, message: e.to_string() })
    };

    let results = if !config.enabled || npop < 4 {
        (0..npop).map(wrap).collect::<Result<Vec<f64>>>()?
    } else {
        (0..npop).into_par_iter().map(wrap).collect::<Result<Vec<f64>>>()?
    };

    Ok(Array1::from_vec(results))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population() -> Array2<f64> {
        let mut population = Array2::zeros((10, 3));
        for i in 0..10 {
            for j in 0..3 {
                population[[i, j]] = (i as f64) * 0.1 + (j as f64) * 0.01;
            }
        }
        population
    }

    #[test]
    fn test_parallel_evaluation() {
        let eval_fn = |x: &Array1<f64>| -> f64 { x.iter().map(|&xi| xi * xi).sum() };
        let population = population();

        let config = ParallelConfig { enabled: true, num_threads: Some(2) };
        let energies = evaluate_population_parallel(&population, &eval_fn, &config);
        assert_eq!(energies.len(), 10);
        for i in 0..10 {
            let expected = population.row(i).iter().map(|&x| x * x).sum::<f64>();
            assert!((energies[i] - expected).abs() < 1e-10);
        }

        let config_seq = ParallelConfig { enabled: false, num_threads: None };
        let energies_seq = evaluate_population_parallel(&population, &eval_fn, &config_seq);
        assert_eq!(energies, energies_seq);
    }

    #[test]
    fn test_fallible_evaluation_reports_row() {
        let eval_fn = |x: &Array1<f64>| -> std::result::Result<f64, String> {
            if (x[0] - 0.5).abs() < 1e-9 { Err(format!("rejected: {:.2}", x[0])) } else { Ok(x[0]) }
        };
        let population = population();
        for enabled in [true, false] {
            let config = ParallelConfig { enabled, num_threads: None };
            let err = try_evaluate_population_parallel(&population, &eval_fn, &config).unwrap_err();
            match err {
                LShadeError::Evaluation { index, message } => {
                    assert_eq!(index, 5);
                    assert_eq!(message, "rejected: 0.50");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_fallible_evaluation_ok() {
        let eval_fn = |x: &Array1<f64>| -> std::result::Result<f64, String> { Ok(x.sum()) };
        let population = population();
        let energies =
            try_evaluate_population_parallel(&population, &eval_fn, &ParallelConfig::default()).unwrap();
        assert_eq!(energies.len(), 10);
        assert!((energies[1] - (0.1 + 0.11 + 0.12)).abs() < 1e-12);
    }
}
