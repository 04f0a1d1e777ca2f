use ndarray::{Array1, Array2};

/// Survivors of one generation.
#[derive(Debug, Clone)]
pub struct Selection {
    pub population: Array2<f64>,
    pub fitness: Array1<f64>,
    /// Positions where the trial replaced its parent, ascending
    pub success_indexes: Vec<usize>,
}

/// Elementwise minimisation: a trial replaces its parent when its fitness is
/// lower or equal. A NaN on either side keeps the parent.
pub(crate) fn select_greedy(
    pop: &Array2<f64>,
    trials: &Array2<f64>,
    fitness: &Array1<f64>,
    trial_fitness: &Array1<f64>,
) -> Selection {
    let mut population = pop.clone();
    let mut new_fitness = fitness.clone();
    let mut success_indexes = Vec::new();
    for i in 0..pop.nrows() {
        if trial_fitness[i] <= fitness[i] {
            population.row_mut(i).assign(&trials.row(i));
            new_fitness[i] = trial_fitness[i];
            success_indexes.push(i);
        }
    }
    Selection { population, fitness: new_fitness, success_indexes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_ties_go_to_trial() {
        let pop = array![[0.0], [1.0], [2.0]];
        let trials = array![[10.0], [11.0], [12.0]];
        let fitness = array![1.0, 2.0, 3.0];
        let trial_fitness = array![0.5, 2.0, f64::NAN];
        let sel = select_greedy(&pop, &trials, &fitness, &trial_fitness);
        assert_eq!(sel.success_indexes, vec![0, 1]);
        assert_eq!(sel.population, array![[10.0], [11.0], [2.0]]);
        assert_eq!(sel.fitness, array![0.5, 2.0, 3.0]);
    }
}
