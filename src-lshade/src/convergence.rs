//! Best-fitness tracking and the cumulative stagnation countdown.

/// Tracks the best fitness seen and how many stagnating generations remain.
///
/// The countdown only ever decreases: a generation whose minimum fitness is
/// within `precision` of the best so far costs one unit, and later
/// improvements do not give it back.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    best_fitness: f64,
    countdown: usize,
    precision: Option<f64>,
    history: Option<Vec<f64>>,
}

impl ConvergenceMonitor {
    pub fn new(
        initial_best: f64,
        countdown: usize,
        precision: Option<f64>,
        track_history: bool,
    ) -> Self {
        Self {
            best_fitness: initial_best,
            countdown,
            precision: precision.filter(|p| p.is_finite()),
            history: track_history.then(Vec::new),
        }
    }

    /// Account for one generation whose minimum fitness is `current_min`.
    ///
    /// The stagnation test compares against the best fitness from before this
    /// generation. Returns `true` if the countdown was decremented.
    pub fn observe(&mut self, current_min: f64) -> bool {
        let stagnated = match self.precision {
            Some(precision) => (current_min - self.best_fitness).abs() < precision,
            None => false,
        };
        if stagnated {
            self.countdown = self.countdown.saturating_sub(1);
        }
        if current_min < self.best_fitness {
            self.best_fitness = current_min;
        }
        if let Some(history) = self.history.as_mut() {
            history.push(current_min);
        }
        stagnated
    }

    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    pub fn countdown(&self) -> usize {
        self.countdown
    }

    pub fn is_exhausted(&self) -> bool {
        self.countdown == 0
    }

    pub fn history(&self) -> Option<&[f64]> {
        self.history.as_deref()
    }

    pub fn into_history(self) -> Option<Vec<f64>> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_is_cumulative() {
        let mut monitor = ConvergenceMonitor::new(10.0, 3, Some(1e-3), false);
        assert!(monitor.observe(10.0));
        assert_eq!(monitor.countdown(), 2);
        // a large improvement does not restore the budget
        assert!(!monitor.observe(1.0));
        assert_eq!(monitor.countdown(), 2);
        assert_eq!(monitor.best_fitness(), 1.0);
        assert!(monitor.observe(1.0 - 1e-4));
        assert!(monitor.observe(1.0 - 1e-4));
        assert!(monitor.is_exhausted());
        // stays at zero
        monitor.observe(1.0 - 1e-4);
        assert_eq!(monitor.countdown(), 0);
    }

    #[test]
    fn test_uses_previous_best() {
        let mut monitor = ConvergenceMonitor::new(5.0, 2, Some(0.5), false);
        // 4.0 is 1.0 away from the previous best: no stagnation, even though
        // it becomes the new best
        assert!(!monitor.observe(4.0));
        assert_eq!(monitor.best_fitness(), 4.0);
        assert_eq!(monitor.countdown(), 2);
    }

    #[test]
    fn test_without_precision_never_stagnates() {
        let mut monitor = ConvergenceMonitor::new(0.0, 1, None, true);
        for _ in 0..5 {
            assert!(!monitor.observe(0.0));
        }
        assert_eq!(monitor.countdown(), 1);
        assert_eq!(monitor.history().unwrap().len(), 5);
    }

    #[test]
    fn test_history_disabled() {
        let mut monitor = ConvergenceMonitor::new(1.0, 1, Some(1.0), false);
        monitor.observe(0.5);
        assert!(monitor.history().is_none());
        assert!(monitor.into_history().is_none());
    }
}
