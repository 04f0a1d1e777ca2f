use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;

use crate::archive::Archive;
use crate::distinct_indices::random_index_excluding;

/// current-to-pbest/1 with archive, one mutant per row, clipped to bounds.
///
/// `v_i = x_i + F_i (x_pbest - x_i) + F_i (x_r1 - x~_r2)` where `pbest` is one
/// of the `max(2, round(p_i * NP))` fittest rows, `r1` is a population row
/// other than `i` and `x~_r2` comes from the population or the archive.
/// Populations smaller than 4 are returned unchanged.
#[allow(clippy::too_many_arguments)]
pub(crate) fn mutant_current_to_pbest1<R: Rng + ?Sized>(
    pop: &Array2<f64>,
    fitness: &Array1<f64>,
    f: &Array1<f64>,
    p: &Array1<f64>,
    archive: &Archive,
    lower: ArrayView1<'_, f64>,
    upper: ArrayView1<'_, f64>,
    rng: &mut R,
) -> Array2<f64> {
    let npop = pop.nrows();
    if npop < 4 {
        return pop.clone();
    }

    let mut sorted_indices: Vec<usize> = (0..npop).collect();
    sorted_indices.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));

    let n = pop.ncols();
    let mut mutants = Array2::<f64>::zeros((npop, n));
    for i in 0..npop {
        let n_best = ((p[i] * npop as f64).round_ties_even() as usize).clamp(2, npop);
        let pbest = sorted_indices[rng.random_range(0..n_best)];
        let r1 = random_index_excluding(npop, &[i], rng);
        let r2 = random_index_excluding(npop + archive.len(), &[i, r1], rng);
        let x_r2 = if r2 < npop { pop.row(r2) } else { archive.members()[r2 - npop].view() };

        let xi = pop.row(i);
        let mut row = mutants.row_mut(i);
        for j in 0..n {
            let v = xi[j] + f[i] * (pop[(pbest, j)] - xi[j]) + f[i] * (pop[(r1, j)] - x_r2[j]);
            row[j] = v.clamp(lower[j], upper[j]);
        }
    }
    mutants
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_mutants_clipped_to_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        let pop = array![[-1.0, 1.0], [1.0, -1.0], [0.9, 0.9], [-0.9, -0.9], [0.0, 0.5]];
        let fitness = array![4.0, 3.0, 2.0, 1.0, 0.0];
        let f = Array1::from_elem(5, 1.0);
        let p = Array1::from_elem(5, 0.11);
        let mut archive = Archive::new();
        archive.record_displaced(array![-1.0, -1.0].view());
        let lower = array![-1.0, -1.0];
        let upper = array![1.0, 1.0];
        for _ in 0..50 {
            let m = mutant_current_to_pbest1(&pop, &fitness, &f, &p, &archive, lower.view(), upper.view(), &mut rng);
            assert_eq!(m.dim(), (5, 2));
            assert!(m.iter().all(|&v| (-1.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn test_small_population_unchanged() {
        let mut rng = StdRng::seed_from_u64(9);
        let pop = array![[0.1], [0.2], [0.3]];
        let fitness = array![1.0, 2.0, 3.0];
        let f = Array1::from_elem(3, 0.5);
        let p = Array1::from_elem(3, 0.11);
        let bounds = array![0.0];
        let m = mutant_current_to_pbest1(&pop, &fitness, &f, &p, &Archive::new(), bounds.view(), array![1.0].view(), &mut rng);
        assert_eq!(m, pop);
    }

    #[test]
    fn test_identical_population_is_fixed_point() {
        // x_i == x_pbest == x_r1 == x_r2, so every difference vanishes
        let mut rng = StdRng::seed_from_u64(4);
        let pop = Array2::from_elem((6, 3), 0.25);
        let fitness = Array1::zeros(6);
        let f = Array1::from_elem(6, 0.7);
        let p = Array1::from_elem(6, 0.11);
        let lower = Array1::from_elem(3, -1.0);
        let upper = Array1::from_elem(3, 1.0);
        let m = mutant_current_to_pbest1(&pop, &fitness, &f, &p, &Archive::new(), lower.view(), upper.view(), &mut rng);
        assert_eq!(m, pop);
    }
}
