use ndarray::{Array2, ArrayView1};
use rand::Rng;

/// Uniform random population of `npop` rows inside `[lower, upper]`.
pub(crate) fn init_random<R: Rng + ?Sized>(
    npop: usize,
    lower: ArrayView1<'_, f64>,
    upper: ArrayView1<'_, f64>,
    rng: &mut R,
) -> Array2<f64> {
    let n = lower.len();
    let mut pop = Array2::<f64>::zeros((npop, n));
    for i in 0..npop {
        for j in 0..n {
            let u: f64 = rng.random::<f64>();
            pop[(i, j)] = (lower[j] + u * (upper[j] - lower[j])).clamp(lower[j], upper[j]);
        }
    }
    pop
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_init_within_bounds() {
        let lower = array![-1.0, 0.0, 2.0];
        let upper = array![1.0, 10.0, 2.0];
        let mut rng = StdRng::seed_from_u64(0);
        let pop = init_random(25, lower.view(), upper.view(), &mut rng);
        assert_eq!(pop.dim(), (25, 3));
        for row in pop.rows() {
            for j in 0..3 {
                assert!(row[j] >= lower[j] && row[j] <= upper[j]);
            }
            // degenerate bound pins the variable
            assert_eq!(row[2], 2.0);
        }
    }
}
