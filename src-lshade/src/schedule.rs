//! Linear population size reduction.

use ndarray::{Array1, Array2, Axis};

/// Smallest population the schedule ever asks for.
pub const MIN_POPULATION_SIZE: usize = 4;

/// Population size as a linear function of consumed evaluations, from the
/// initial size down to [`MIN_POPULATION_SIZE`] at the end of the budget.
#[derive(Debug, Clone, Copy)]
pub struct PopulationSchedule {
    initial_size: usize,
    max_evals: usize,
}

impl PopulationSchedule {
    pub fn new(initial_size: usize, max_evals: usize) -> Self {
        Self { initial_size, max_evals }
    }

    pub fn initial_size(&self) -> usize {
        self.initial_size
    }

    /// `round(((4 - N_init) / max_evals) * nfev + N_init)`, never below 4.
    pub fn target_size(&self, evals_consumed: usize) -> usize {
        let init = self.initial_size as f64;
        let slope = (MIN_POPULATION_SIZE as f64 - init) / self.max_evals as f64;
        let target = (slope * evals_consumed as f64 + init).round_ties_even();
        if target <= MIN_POPULATION_SIZE as f64 {
            MIN_POPULATION_SIZE
        } else {
            target as usize
        }
    }
}

/// Keep the `target` fittest rows (stable ascending order of fitness).
///
/// Returns `None` when the population is already at or below `target`.
pub fn shrink_population(
    population: &Array2<f64>,
    fitness: &Array1<f64>,
    target: usize,
) -> Option<(Array2<f64>, Array1<f64>)> {
    if population.nrows() <= target {
        return None;
    }
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));
    order.truncate(target);
    Some((population.select(Axis(0), &order), fitness.select(Axis(0), &order)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_target_size_endpoints() {
        let schedule = PopulationSchedule::new(100, 10_000);
        assert_eq!(schedule.target_size(0), 100);
        assert_eq!(schedule.target_size(10_000), 4);
        assert_eq!(schedule.target_size(5_000), 52);
        // overshooting the budget stays at the floor
        assert_eq!(schedule.target_size(12_000), 4);
    }

    #[test]
    fn test_target_size_monotone() {
        let schedule = PopulationSchedule::new(50, 20_000);
        let mut last = usize::MAX;
        for nfev in (0..=20_000).step_by(37) {
            let t = schedule.target_size(nfev);
            assert!(t <= last);
            assert!(t >= MIN_POPULATION_SIZE);
            last = t;
        }
    }

    #[test]
    fn test_target_size_rounds_half_to_even() {
        // slope = -1/2 per evaluation: 5 evals -> 7.5 -> 8, 7 evals -> 6.5 -> 6
        let schedule = PopulationSchedule::new(10, 12);
        assert_eq!(schedule.target_size(5), 8);
        assert_eq!(schedule.target_size(7), 6);
    }

    #[test]
    fn test_small_initial_population_never_grows() {
        let schedule = PopulationSchedule::new(3, 100);
        assert_eq!(schedule.target_size(50), MIN_POPULATION_SIZE);
        let pop = Array2::<f64>::zeros((3, 2));
        let fit = array![1.0, 2.0, 3.0];
        assert!(shrink_population(&pop, &fit, schedule.target_size(50)).is_none());
    }

    #[test]
    fn test_shrink_keeps_fittest_stable() {
        let pop = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let fit = array![3.0, 1.0, 2.0, 1.0, 0.5];
        let (kept, kept_fit) = shrink_population(&pop, &fit, 3).unwrap();
        assert_eq!(kept, array![[4.0], [1.0], [3.0]]);
        assert_eq!(kept_fit, array![0.5, 1.0, 1.0]);
    }
}
