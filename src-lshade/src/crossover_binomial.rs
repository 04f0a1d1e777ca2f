use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;

pub(crate) fn binomial_crossover<R: Rng + ?Sized>(
    target: ArrayView1<'_, f64>,
    mutant: ArrayView1<'_, f64>,
    cr: f64,
    rng: &mut R,
) -> Array1<f64> {
    let n = target.len();
    let jrand = rng.random_range(0..n);
    let mut trial = target.to_owned();
    for j in 0..n {
        if j == jrand || rng.random::<f64>() < cr {
            trial[j] = mutant[j];
        }
    }
    trial
}

/// Row-wise binomial crossover; row `i` uses `cr[i]`.
pub(crate) fn binomial_crossover_population<R: Rng + ?Sized>(
    pop: &Array2<f64>,
    mutants: &Array2<f64>,
    cr: &Array1<f64>,
    rng: &mut R,
) -> Array2<f64> {
    let mut trials = Array2::<f64>::zeros(pop.raw_dim());
    for i in 0..pop.nrows() {
        let trial = binomial_crossover(pop.row(i), mutants.row(i), cr[i], rng);
        trials.row_mut(i).assign(&trial);
    }
    trials
}
