//! The L-SHADE generation controller.
//!
//! One `LShade` value owns everything a run mutates: population, fitness,
//! parameter memory, archive, schedule, stagnation monitor, counters and RNG.
//! Two controllers never share state, so independent runs can coexist.

use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::archive::Archive;
use crate::convergence::ConvergenceMonitor;
use crate::error::{LShadeError, Result};
use crate::memory::ParameterMemory;
use crate::operators::{Evaluator, Operators, Selection};
use crate::schedule::{PopulationSchedule, shrink_population};
use crate::{LShadeConfig, LShadeReport, Termination, argmin};

/// What the callback wants the optimizer to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Keep going
    Continue,
    /// Stop after this generation
    Stop,
}

/// Read-only view of the controller at the end of one generation.
///
/// Borrowed from the running controller and valid only for the duration of
/// the callback. `parents`, `parent_fitness`, `trials`, `trial_fitness`, `cr`,
/// `f` and `success_indexes` describe the generation before the shrink and are
/// indexed by the pre-shrink row position; `population` and `fitness` are the
/// survivors after the shrink.
#[derive(Debug)]
pub struct GenerationSnapshot<'a> {
    /// 0-based index of the generation just completed
    pub generation: usize,
    pub nfev: usize,
    pub max_evals: usize,
    pub initial_population_size: usize,
    pub population: &'a Array2<f64>,
    pub fitness: &'a Array1<f64>,
    pub parents: &'a Array2<f64>,
    pub parent_fitness: &'a Array1<f64>,
    pub trials: &'a Array2<f64>,
    pub trial_fitness: &'a Array1<f64>,
    /// Crossover rates used this generation
    pub cr: &'a Array1<f64>,
    /// Scale factors used this generation
    pub f: &'a Array1<f64>,
    pub success_indexes: &'a [usize],
    pub memory_cr: &'a Array1<f64>,
    pub memory_f: &'a Array1<f64>,
    pub memory_cursor: usize,
    pub archive: &'a [Array1<f64>],
    /// Best fitness seen over the whole run
    pub best_fitness: f64,
    /// Stagnating generations still allowed
    pub countdown: usize,
}

impl GenerationSnapshot<'_> {
    /// Minimum fitness of the current population.
    pub fn current_min(&self) -> f64 {
        self.fitness.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// L-SHADE optimizer driven by an [`Evaluator`] and a set of [`Operators`].
pub struct LShade<E: Evaluator> {
    evaluator: E,
    config: LShadeConfig,
    operators: Operators,
}

impl<E: Evaluator> LShade<E> {
    /// Create an optimizer with the default operator set.
    ///
    /// The configuration is checked here, before anything is allocated or
    /// evaluated.
    pub fn new(evaluator: E, config: LShadeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { evaluator, config, operators: Operators::default() })
    }

    /// Replace the mutation, crossover, initialisation and selection operators.
    pub fn with_operators(mut self, operators: Operators) -> Self {
        self.operators = operators;
        self
    }

    pub fn config(&self) -> &LShadeConfig {
        &self.config
    }

    fn evaluate(&self, population: &Array2<f64>) -> Result<Array1<f64>> {
        let fitness = self.evaluator.evaluate(population)?;
        if fitness.len() != population.nrows() {
            return Err(LShadeError::EvaluationShape {
                expected: population.nrows(),
                got: fitness.len(),
            });
        }
        Ok(fitness)
    }

    /// Run the optimization and return a report
    pub fn solve(&mut self) -> Result<LShadeReport> {
        self.config.validate()?;

        if let Some(n) = self.config.parallel.num_threads {
            // Ignore error if global pool already set
            let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
        }

        let mut rng: StdRng = match self.config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => {
                let mut thread_rng = rand::rng();
                StdRng::from_rng(&mut thread_rng)
            }
        };

        let mut callback = self.config.callback.take();
        let result = self.run(&mut rng, &mut callback);
        self.config.callback = callback;
        result
    }

    fn run(
        &self,
        rng: &mut StdRng,
        callback: &mut Option<crate::Callback>,
    ) -> Result<LShadeReport> {
        let config = &self.config;
        let bounds = &config.bounds;
        let initial_size = config.population_size;
        let max_evals = config.max_evals;

        info!(
            "L-SHADE start: dim={}, population={}, max_evals={}, memory={}, precision={:?}, countdown={}",
            config.dimension(),
            initial_size,
            max_evals,
            config.memory_size,
            config.precision,
            config.stagnation_budget()
        );

        let mut population = self.operators.initializer.init_population(initial_size, bounds, rng);
        let mut fitness = self.evaluate(&population)?;
        let mut nfev = initial_size;

        let mut memory = ParameterMemory::new(config.memory_size);
        let mut archive = Archive::new();
        let schedule = PopulationSchedule::new(initial_size, max_evals);
        let (_, initial_best) = argmin(&fitness);
        let mut monitor = ConvergenceMonitor::new(
            initial_best,
            config.stagnation_budget(),
            config.precision,
            config.return_history,
        );

        let mut generation = 0usize;
        let mut stopped_by_callback = false;

        while nfev < max_evals && !monitor.is_exhausted() {
            let npop = population.nrows();

            let params = memory.sample_parameters(npop, rng)?;
            let mutants = self.operators.mutator.mutate(
                &population,
                &fitness,
                &params.f,
                &params.p,
                &archive,
                bounds,
                rng,
            );
            let trials = self.operators.crossover.crossover(&population, &mutants, &params.cr, rng);
            let trial_fitness = self.evaluate(&trials)?;
            nfev += npop;

            let Selection { population: survivors, fitness: survivor_fitness, success_indexes } =
                self.operators.selector.select(&population, &trials, &fitness, &trial_fitness);
            let parents = std::mem::replace(&mut population, survivors);
            let parent_fitness = std::mem::replace(&mut fitness, survivor_fitness);

            for &i in &success_indexes {
                archive.record_displaced(parents.row(i));
            }
            archive.enforce_capacity(npop, rng);

            let success_cr: Vec<f64> = success_indexes.iter().map(|&i| params.cr[i]).collect();
            let success_f: Vec<f64> = success_indexes.iter().map(|&i| params.f[i]).collect();
            let deltas: Vec<f64> = success_indexes
                .iter()
                .map(|&i| (parent_fitness[i] - trial_fitness[i]).abs())
                .collect();
            memory.update(&success_cr, &success_f, &deltas);

            let target = schedule.target_size(nfev);
            if let Some((kept, kept_fitness)) = shrink_population(&population, &fitness, target) {
                population = kept;
                fitness = kept_fitness;
                // cursor compared against a population size, kept as-is
                if memory.cursor() == schedule.initial_size() {
                    memory.reset_cursor();
                }
                archive.enforce_capacity(population.nrows(), rng);
            }

            let (_, current_min) = argmin(&fitness);
            monitor.observe(current_min);

            debug!(
                "generation {}: nfev={}, population={}, successes={}, current_min={:.6e}, best={:.6e}, archive={}, countdown={}",
                generation,
                nfev,
                population.nrows(),
                success_indexes.len(),
                current_min,
                monitor.best_fitness(),
                archive.len(),
                monitor.countdown()
            );

            if let Some(cb) = callback.as_mut() {
                let snapshot = GenerationSnapshot {
                    generation,
                    nfev,
                    max_evals,
                    initial_population_size: initial_size,
                    population: &population,
                    fitness: &fitness,
                    parents: &parents,
                    parent_fitness: &parent_fitness,
                    trials: &trials,
                    trial_fitness: &trial_fitness,
                    cr: &params.cr,
                    f: &params.f,
                    success_indexes: &success_indexes,
                    memory_cr: memory.cr(),
                    memory_f: memory.f(),
                    memory_cursor: memory.cursor(),
                    archive: archive.members(),
                    best_fitness: monitor.best_fitness(),
                    countdown: monitor.countdown(),
                };
                if cb(&snapshot) == CallbackAction::Stop {
                    stopped_by_callback = true;
                }
            }

            generation += 1;
            if stopped_by_callback {
                break;
            }
        }

        let termination = if stopped_by_callback {
            Termination::Callback
        } else if monitor.is_exhausted() {
            Termination::Stagnation
        } else {
            Termination::MaxEvals
        };
        let message = match termination {
            Termination::Stagnation => format!(
                "Stagnation budget of {} generations exhausted",
                config.stagnation_budget()
            ),
            Termination::MaxEvals => format!("Maximum evaluations reached ({})", max_evals),
            Termination::Callback => "Optimization stopped by callback".to_string(),
        };

        let (best_idx, best_f) = argmin(&fitness);
        let x = population.row(best_idx).to_owned();

        info!(
            "L-SHADE finish: {} after {} generations, nfev={}, best={:.6e}",
            message, generation, nfev, best_f
        );
        if termination == Termination::MaxEvals && config.precision.is_some() {
            warn!(
                "evaluation budget of {} used up before the stagnation countdown ended ({} left)",
                max_evals,
                monitor.countdown()
            );
        }

        Ok(LShadeReport {
            x,
            fun: best_f,
            success: termination != Termination::Callback,
            message,
            termination,
            nit: generation,
            nfev,
            population,
            population_fitness: fitness,
            history: monitor.into_history(),
        })
    }
}
