//! Variation operators consumed by the generation loop.
//!
//! The controller only talks to these traits. The default set is the
//! standard L-SHADE one: uniform initialisation, current-to-pbest/1 with
//! archive, binomial crossover, batched objective evaluation and greedy
//! one-to-one selection.

use std::fmt::Display;
use std::marker::PhantomData;

use ndarray::{Array1, Array2};
use rand::RngCore;

use crate::archive::Archive;
use crate::crossover_binomial::binomial_crossover_population;
use crate::error::Result;
use crate::init_random::init_random;
use crate::mutant_current_to_pbest1::mutant_current_to_pbest1;
use crate::parallel_eval::{
    ParallelConfig, evaluate_population_parallel, try_evaluate_population_parallel,
};
pub use crate::selection::Selection;
use crate::selection::select_greedy;

/// Builds the initial population. `bounds` is `n x 2` (min, max).
pub trait Initializer {
    fn init_population(&self, size: usize, bounds: &Array2<f64>, rng: &mut dyn RngCore) -> Array2<f64>;
}

/// Produces one bound-respecting mutant per row of the population.
pub trait Mutator {
    #[allow(clippy::too_many_arguments)]
    fn mutate(
        &self,
        population: &Array2<f64>,
        fitness: &Array1<f64>,
        f: &Array1<f64>,
        p: &Array1<f64>,
        archive: &Archive,
        bounds: &Array2<f64>,
        rng: &mut dyn RngCore,
    ) -> Array2<f64>;
}

/// Recombines parents with their mutants, row `i` using `cr[i]`.
pub trait Crossover {
    fn crossover(
        &self,
        population: &Array2<f64>,
        mutants: &Array2<f64>,
        cr: &Array1<f64>,
        rng: &mut dyn RngCore,
    ) -> Array2<f64>;
}

/// Scores a batch of individuals, one fitness per row, in row order.
pub trait Evaluator {
    fn evaluate(&self, population: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Chooses survivors between parents and their trials.
pub trait Selector {
    fn select(
        &self,
        population: &Array2<f64>,
        trials: &Array2<f64>,
        fitness: &Array1<f64>,
        trial_fitness: &Array1<f64>,
    ) -> Selection;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomInit;

impl Initializer for RandomInit {
    fn init_population(&self, size: usize, bounds: &Array2<f64>, rng: &mut dyn RngCore) -> Array2<f64> {
        init_random(size, bounds.column(0), bounds.column(1), rng)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentToPBest1;

impl Mutator for CurrentToPBest1 {
    fn mutate(
        &self,
        population: &Array2<f64>,
        fitness: &Array1<f64>,
        f: &Array1<f64>,
        p: &Array1<f64>,
        archive: &Archive,
        bounds: &Array2<f64>,
        rng: &mut dyn RngCore,
    ) -> Array2<f64> {
        mutant_current_to_pbest1(population, fitness, f, p, archive, bounds.column(0), bounds.column(1), rng)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinomialCrossover;

impl Crossover for BinomialCrossover {
    fn crossover(
        &self,
        population: &Array2<f64>,
        mutants: &Array2<f64>,
        cr: &Array1<f64>,
        rng: &mut dyn RngCore,
    ) -> Array2<f64> {
        binomial_crossover_population(population, mutants, cr, rng)
    }
}

/// Trial replaces parent when `trial_fitness <= parent_fitness`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySelection;

impl Selector for GreedySelection {
    fn select(
        &self,
        population: &Array2<f64>,
        trials: &Array2<f64>,
        fitness: &Array1<f64>,
        trial_fitness: &Array1<f64>,
    ) -> Selection {
        select_greedy(population, trials, fitness, trial_fitness)
    }
}

/// Evaluator over an infallible objective `x -> f(x)`.
pub struct ObjectiveEvaluator<'a, F>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    func: &'a F,
    parallel: ParallelConfig,
}

impl<'a, F> ObjectiveEvaluator<'a, F>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    pub fn new(func: &'a F, parallel: ParallelConfig) -> Self {
        Self { func, parallel }
    }
}

impl<F> Evaluator for ObjectiveEvaluator<'_, F>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    fn evaluate(&self, population: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(evaluate_population_parallel(population, self.func, &self.parallel))
    }
}

/// Evaluator over an objective that may fail; a failure aborts the run.
pub struct FallibleObjectiveEvaluator<'a, F, E> {
    func: &'a F,
    parallel: ParallelConfig,
    _error: PhantomData<fn() -> E>,
}

impl<'a, F, E> FallibleObjectiveEvaluator<'a, F, E>
where
    F: Fn(&Array1<f64>) -> std::result::Result<f64, E> + Sync,
    E: Display,
{
    pub fn new(func: &'a F, parallel: ParallelConfig) -> Self {
        Self { func, parallel, _error: PhantomData }
    }
}

impl<F, E> Evaluator for FallibleObjectiveEvaluator<'_, F, E>
where
    F: Fn(&Array1<f64>) -> std::result::Result<f64, E> + Sync,
    E: Display,
{
    fn evaluate(&self, population: &Array2<f64>) -> Result<Array1<f64>> {
        try_evaluate_population_parallel(population, self.func, &self.parallel)
    }
}

/// The non-evaluator operators driving one run.
pub struct Operators {
    pub initializer: Box<dyn Initializer>,
    pub mutator: Box<dyn Mutator>,
    pub crossover: Box<dyn Crossover>,
    pub selector: Box<dyn Selector>,
}

impl Default for Operators {
    fn default() -> Self {
        Self {
            initializer: Box::new(RandomInit),
            mutator: Box::new(CurrentToPBest1),
            crossover: Box::new(BinomialCrossover),
            selector: Box::new(GreedySelection),
        }
    }
}
