use std::fmt::Display;

use ndarray::Array1;

use crate::error::Result;
use crate::solver::LShade;
use crate::operators::{FallibleObjectiveEvaluator, ObjectiveEvaluator};
use crate::{LShadeConfig, LShadeReport, bounds_matrix};

/// Convenience function mirroring the usual `minimize(func, bounds, ...)` entry point.
///
/// `bounds` replaces whatever `config.bounds` held. Evaluation honours
/// `config.parallel`.
pub fn lshade<F>(func: &F, bounds: &[(f64, f64)], mut config: LShadeConfig) -> Result<LShadeReport>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    config.bounds = bounds_matrix(bounds);
    let evaluator = ObjectiveEvaluator::new(func, config.parallel.clone());
    LShade::new(evaluator, config)?.solve()
}

/// Like [`lshade`] for objectives that can fail. The first failure aborts the
/// run and is returned as `LShadeError::Evaluation`.
pub fn try_lshade<F, E>(
    func: &F,
    bounds: &[(f64, f64)],
    mut config: LShadeConfig,
) -> Result<LShadeReport>
where
    F: Fn(&Array1<f64>) -> std::result::Result<f64, E> + Sync,
    E: Display,
{
    config.bounds = bounds_matrix(bounds);
    let evaluator = FallibleObjectiveEvaluator::new(func, config.parallel.clone());
    LShade::new(evaluator, config)?.solve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LShadeConfigBuilder, LShadeError};

    #[test]
    fn test_lshade_quadratic() {
        let config = LShadeConfigBuilder::new().population_size(30).max_evals(4000).seed(11).build();
        let report = lshade(&|x: &Array1<f64>| (x[0] - 1.0).powi(2) + (x[1] + 0.5).powi(2), &[(-3.0, 3.0), (-3.0, 3.0)], config)
            .unwrap();
        assert!((report.x[0] - 1.0).abs() < 1e-3);
        assert!((report.x[1] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_try_lshade_propagates_failure() {
        let config = LShadeConfigBuilder::new().population_size(10).max_evals(1000).seed(2).build();
        let objective = |x: &Array1<f64>| -> std::result::Result<f64, String> {
            if x[0] > 0.0 { Err("positive half rejected".to_string()) } else { Ok(x[0] * x[0]) }
        };
        let err = try_lshade(&objective, &[(-1.0, 1.0)], config).unwrap_err();
        match err {
            LShadeError::Evaluation { message, .. } => assert_eq!(message, "positive half rejected"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bounds_mismatch_with_individual_size() {
        let config = LShadeConfigBuilder::new().individual_size(3).max_evals(100).build();
        let err = lshade(&|x: &Array1<f64>| x.sum(), &[(0.0, 1.0), (0.0, 1.0)], config).unwrap_err();
        assert!(err.is_config_error());
    }
}
