//! Success-history parameter memory.
//!
//! Holds `M` location parameters for the crossover rate (CR) and the scale
//! factor (F). Every generation draws per-individual CR/F values around a
//! random slot, and the successful values overwrite the slot under the cursor
//! with their fitness-improvement weighted Lehmer mean.

use log::debug;
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Cauchy, Normal};

use crate::error::{LShadeError, Result};

/// Value every memory slot starts with.
pub const INITIAL_MEMORY_VALUE: f64 = 0.5;
/// Standard deviation of the normal CR draw.
pub const CR_SCALE: f64 = 0.1;
/// Scale of the Cauchy F draw.
pub const F_SCALE: f64 = 0.1;
/// Greediness of current-to-pbest mutation (fraction of the population used as pbest pool).
pub const PBEST_RATE: f64 = 0.11;
/// Upper limit on scale factor resampling rounds.
pub const MAX_RESAMPLE_ROUNDS: usize = 10_000;

/// Control parameters drawn for one generation, one entry per individual.
#[derive(Debug, Clone)]
pub struct SampledParameters {
    /// Crossover rates in [0, 1]
    pub cr: Array1<f64>,
    /// Scale factors in (0, 1]
    pub f: Array1<f64>,
    /// pbest greediness
    pub p: Array1<f64>,
}

/// Circular memory of successful (CR, F) location parameters.
#[derive(Debug, Clone)]
pub struct ParameterMemory {
    cr: Array1<f64>,
    f: Array1<f64>,
    cursor: usize,
}

fn is_valid_scale_factor(f: f64) -> bool {
    f > 0.0 && f <= 1.0
}

/// Weighted Lehmer mean `sum(w * v^2) / sum(w * v)`, `None` when undefined.
pub(crate) fn weighted_lehmer_mean(weights: &[f64], values: &[f64]) -> Option<f64> {
    let (num, den) = weights
        .iter()
        .zip(values)
        .fold((0.0, 0.0), |(num, den), (&w, &v)| (num + w * v * v, den + w * v));
    let mean = num / den;
    if den > 0.0 && mean.is_finite() { Some(mean) } else { None }
}

impl ParameterMemory {
    /// Create a memory with `size` slots, all set to 0.5.
    pub fn new(size: usize) -> Self {
        debug_assert!(size > 0, "memory needs at least one slot");
        Self {
            cr: Array1::from_elem(size, INITIAL_MEMORY_VALUE),
            f: Array1::from_elem(size, INITIAL_MEMORY_VALUE),
            cursor: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_values(cr: Array1<f64>, f: Array1<f64>) -> Self {
        assert_eq!(cr.len(), f.len());
        Self { cr, f, cursor: 0 }
    }

    /// Number of slots `M`.
    pub fn len(&self) -> usize {
        self.cr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cr.is_empty()
    }

    /// CR location parameters.
    pub fn cr(&self) -> &Array1<f64> {
        &self.cr
    }

    /// F location parameters.
    pub fn f(&self) -> &Array1<f64> {
        &self.f
    }

    /// Slot overwritten by the next successful update.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Draw CR, F and p for `npop` individuals.
    ///
    /// CR follows N(CR-mem[r], 0.1) clipped to [0, 1], except that a slot
    /// holding exactly 1 forces CR = 0. F follows Cauchy(F-mem[r], 0.1); draws
    /// outside (0, 1] are redrawn, each time with a fresh slot, until all are
    /// valid or [`MAX_RESAMPLE_ROUNDS`] is reached.
    pub fn sample_parameters<R: Rng + ?Sized>(
        &self,
        npop: usize,
        rng: &mut R,
    ) -> Result<SampledParameters> {
        let normal =
            Normal::new(0.0, CR_SCALE).map_err(|e| LShadeError::Distribution(e.to_string()))?;
        let cauchy =
            Cauchy::new(0.0, F_SCALE).map_err(|e| LShadeError::Distribution(e.to_string()))?;
        let m = self.len();

        let mut cr = Array1::<f64>::zeros(npop);
        let mut f = Array1::<f64>::zeros(npop);
        for i in 0..npop {
            let r = rng.random_range(0..m);
            let noise: f64 = rng.sample(&normal);
            cr[i] = if self.cr[r] == 1.0 { 0.0 } else { (self.cr[r] + noise).clamp(0.0, 1.0) };
            let spread: f64 = rng.sample(&cauchy);
            f[i] = self.f[r] + spread;
        }

        let mut invalid: Vec<usize> = (0..npop).filter(|&i| !is_valid_scale_factor(f[i])).collect();
        let mut rounds = 0;
        while !invalid.is_empty() {
            if rounds == MAX_RESAMPLE_ROUNDS {
                return Err(LShadeError::ResampleExhausted { rounds, remaining: invalid.len() });
            }
            rounds += 1;
            for &i in &invalid {
                let r = rng.random_range(0..m);
                let spread: f64 = rng.sample(&cauchy);
                f[i] = self.f[r] + spread;
            }
            invalid.retain(|&i| !is_valid_scale_factor(f[i]));
        }

        Ok(SampledParameters { cr, f, p: Array1::from_elem(npop, PBEST_RATE) })
    }

    /// Fold one generation of successes into the slot under the cursor.
    ///
    /// `cr`, `f` and `deltas` are aligned: one entry per successful trial,
    /// `deltas` holding `|parent_fitness - trial_fitness|`. Returns `false`
    /// (and changes nothing) when there were no successes.
    pub fn update(&mut self, cr: &[f64], f: &[f64], deltas: &[f64]) -> bool {
        debug_assert!(cr.len() == deltas.len() && f.len() == deltas.len());
        if deltas.is_empty() {
            return false;
        }

        let k = self.cursor;
        let total: f64 = deltas.iter().sum();
        if total > 0.0 && total.is_finite() {
            let weights: Vec<f64> = deltas.iter().map(|d| d / total).collect();
            self.cr[k] = match weighted_lehmer_mean(&weights, cr) {
                Some(mean) => mean.clamp(0.0, 1.0),
                None => {
                    debug!("CR memory slot {} undefined, using sentinel 1", k);
                    1.0
                }
            };
            match weighted_lehmer_mean(&weights, f) {
                Some(mean) => self.f[k] = mean.clamp(0.0, 1.0),
                None => debug!("F memory slot {} undefined, keeping {:.4}", k, self.f[k]),
            }
        } else {
            debug!(
                "degenerate success weights (sum={}), CR memory slot {} set to sentinel 1",
                total, k
            );
            self.cr[k] = 1.0;
        }

        self.cursor = (k + 1) % self.len();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_new_memory() {
        let mem = ParameterMemory::new(6);
        assert_eq!(mem.len(), 6);
        assert_eq!(mem.cursor(), 0);
        assert!(mem.cr().iter().all(|&v| v == 0.5));
        assert!(mem.f().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_sample_domains() {
        let mem = ParameterMemory::new(6);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let params = mem.sample_parameters(200, &mut rng).unwrap();
            assert_eq!(params.cr.len(), 200);
            assert!(params.cr.iter().all(|&v| (0.0..=1.0).contains(&v)));
            assert!(params.f.iter().all(|&v| v > 0.0 && v <= 1.0));
            assert!(params.p.iter().all(|&v| v == PBEST_RATE));
        }
    }

    #[test]
    fn test_sentinel_forces_zero_crossover() {
        let mem = ParameterMemory::from_values(Array1::from_elem(3, 1.0), Array1::from_elem(3, 0.5));
        let mut rng = StdRng::seed_from_u64(1);
        let params = mem.sample_parameters(50, &mut rng).unwrap();
        assert!(params.cr.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_resampling_is_bounded() {
        let mem = ParameterMemory::from_values(Array1::from_elem(2, 0.5), Array1::from_elem(2, 1e6));
        let mut rng = StdRng::seed_from_u64(3);
        let err = mem.sample_parameters(4, &mut rng).unwrap_err();
        assert!(matches!(err, LShadeError::ResampleExhausted { rounds: MAX_RESAMPLE_ROUNDS, remaining: 4 }));
        assert!(err.is_internal_error());
    }

    #[test]
    fn test_update_empty_is_noop() {
        let mut mem = ParameterMemory::new(4);
        assert!(!mem.update(&[], &[], &[]));
        assert_eq!(mem.cursor(), 0);
        assert!(mem.cr().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_update_weighted_lehmer_mean() {
        let mut mem = ParameterMemory::new(4);
        assert!(mem.update(&[0.2, 0.6], &[0.5, 1.0], &[1.0, 3.0]));
        assert!((mem.cr()[0] - 0.56).abs() < 1e-12);
        assert!((mem.f()[0] - 0.8125 / 0.875).abs() < 1e-12);
        assert_eq!(mem.cursor(), 1);
        assert_eq!(mem.cr()[1], 0.5);
    }

    #[test]
    fn test_update_zero_crossover_uses_sentinel() {
        let mut mem = ParameterMemory::new(2);
        mem.update(&[0.0, 0.0], &[0.3, 0.4], &[1.0, 2.0]);
        assert_eq!(mem.cr()[0], 1.0);
        assert!(mem.f()[0] > 0.3 && mem.f()[0] < 0.4);
    }

    #[test]
    fn test_update_zero_weights_keeps_f() {
        let mut mem = ParameterMemory::new(2);
        mem.update(&[0.3], &[0.9], &[0.0]);
        assert_eq!(mem.cr()[0], 1.0);
        assert_eq!(mem.f()[0], 0.5);
        assert_eq!(mem.cursor(), 1);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut mem = ParameterMemory::new(2);
        for _ in 0..3 {
            mem.update(&[0.4], &[0.4], &[1.0]);
        }
        assert_eq!(mem.cursor(), 1);
        assert!(mem.cr().iter().all(|&v| (v - 0.4).abs() < 1e-12));
    }

    #[test]
    fn test_lehmer_mean_undefined() {
        assert_eq!(weighted_lehmer_mean(&[0.5, 0.5], &[0.0, 0.0]), None);
        assert_eq!(weighted_lehmer_mean(&[], &[]), None);
        let m = weighted_lehmer_mean(&[1.0], &[0.7]).unwrap();
        assert!((m - 0.7).abs() < 1e-12);
    }
}
