//! The generation loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::schema::{
    EvolutionHistory, EvolutionPhase, EvolutionProgress, EvolutionReport, EvolutionStats,
    GenomeSnapshot, MutationStats, SearchConfig, StopReason,
};

use super::EvolutionError;
use super::breeder::{Breeder, TwoPointCrossover};
use super::fitness::FitnessFunction;
use super::genome::{Genome, GenomeRng, fitness_order, genome_distance};
use super::mutation::MutatorRegistry;
use super::selection::{Selector, TournamentSelector};

/// Evolution engine that runs the search.
///
/// Lower fitness is better. Each generation keeps the `elitism` best genomes
/// unchanged and fills the rest of the population with mutated offspring of
/// tournament-selected parents.
pub struct EvolutionEngine<G: Genome, F: FitnessFunction<G>> {
    config: SearchConfig,
    rng: GenomeRng,
    fitness: F,
    selector: Box<dyn Selector<G>>,
    breeder: Box<dyn Breeder<G>>,
    mutator: MutatorRegistry<G>,
    population: Vec<G>,
    history: EvolutionHistory,
    phase: EvolutionPhase,
    generation: usize,
    best_fitness: f64,
    stagnation_count: usize,
    last_stats: Option<EvolutionStats>,
    cancelled: Arc<AtomicBool>,
}

impl<G: Genome + 'static, F: FitnessFunction<G>> EvolutionEngine<G, F> {
    /// Create a new evolution engine.
    pub fn new(config: SearchConfig, fitness: F) -> Result<Self, EvolutionError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        info!("Search RNG seed: {}", seed);

        Ok(Self {
            rng: GenomeRng::new(seed),
            fitness,
            selector: Box::new(TournamentSelector::from_config(&config.selection)),
            breeder: Box::new(TwoPointCrossover),
            mutator: MutatorRegistry::from_config(&config.mutation),
            population: Vec::new(),
            history: EvolutionHistory::default(),
            phase: EvolutionPhase::Uninitialized,
            generation: 0,
            best_fitness: f64::INFINITY,
            stagnation_count: 0,
            last_stats: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            config,
        })
    }

    /// Replace the parent selector.
    pub fn with_selector<S: Selector<G> + 'static>(mut self, selector: S) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Replace the breeder.
    pub fn with_breeder<B: Breeder<G> + 'static>(mut self, breeder: B) -> Self {
        self.breeder = Box::new(breeder);
        self
    }

    /// Replace the mutation registry.
    pub fn with_mutator(mut self, mutator: MutatorRegistry<G>) -> Self {
        self.mutator = mutator;
        self
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Fill the population with `population_size` copies of `seed`.
    ///
    /// `population_size` must equal the configured size, which validation
    /// keeps above `elitism`.
    pub fn init(&mut self, population_size: usize, seed: &G) -> Result<(), EvolutionError> {
        if population_size == 0 {
            return Err(EvolutionError::EmptyPopulation);
        }
        if population_size != self.config.population_size {
            return Err(EvolutionError::PopulationSize {
                expected: self.config.population_size,
                actual: population_size,
            });
        }
        if let Some(expected) = self.fitness.genome_len()
            && expected != seed.len()
        {
            return Err(EvolutionError::LengthMismatch {
                expected,
                actual: seed.len(),
            });
        }

        self.population = vec![seed.clone(); population_size];
        self.history = EvolutionHistory::default();
        self.generation = 0;
        self.best_fitness = f64::INFINITY;
        self.stagnation_count = 0;
        self.last_stats = None;
        self.phase = EvolutionPhase::Ready;

        info!(
            "Initialized population of {} genomes with {} genes",
            population_size,
            seed.len()
        );
        Ok(())
    }

    /// Current population, in engine order.
    pub fn population(&self) -> &[G] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    pub fn fitness(&self) -> &F {
        &self.fitness
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Total fitness function calls.
    pub fn evaluations(&self) -> u64 {
        self.fitness.evaluations()
    }

    /// Per-operator mutation counts.
    pub fn mutation_stats(&self) -> MutationStats {
        self.mutator.stats()
    }

    /// Evaluate every genome that has no cached fitness.
    pub fn evaluate_population(&mut self) -> Result<(), EvolutionError> {
        if self.population.is_empty() {
            return Err(EvolutionError::NotInitialized);
        }
        self.phase = EvolutionPhase::Evaluating;

        let fitness = &self.fitness;
        if self.config.parallel_evaluation {
            self.population
                .par_iter_mut()
                .try_for_each(|genome| genome.evaluate(fitness).map(drop))?;
        } else {
            for genome in &mut self.population {
                genome.evaluate(fitness)?;
            }
        }

        self.phase = EvolutionPhase::Ready;
        Ok(())
    }

    /// Population indices, best first; ties keep population order.
    fn ranked_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.population.len()).collect();
        indices.sort_by(|&a, &b| fitness_order(&self.population[a], &self.population[b]));
        indices
    }

    /// Best genome in the current population.
    pub fn best(&self) -> Option<&G> {
        self.population
            .iter()
            .reduce(|best, g| if fitness_order(g, best).is_lt() { g } else { best })
    }

    /// The `k` best genomes, best first; ties keep population order.
    pub fn top_k(&self, k: usize) -> Vec<&G> {
        self.ranked_indices()
            .into_iter()
            .take(k)
            .map(|i| &self.population[i])
            .collect()
    }

    /// Record statistics for the evaluated population.
    fn record_generation(&mut self) {
        let values: Vec<f64> = self
            .population
            .iter()
            .filter_map(|g| g.cached_fitness())
            .collect();
        if values.is_empty() {
            return;
        }

        let gen_best = values.iter().copied().fold(f64::INFINITY, f64::min);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let variance =
            values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;

        if gen_best < self.best_fitness {
            self.best_fitness = gen_best;
            self.stagnation_count = 0;
        } else {
            self.stagnation_count += 1;
        }

        self.history.best_fitness.push(gen_best);
        self.history.avg_fitness.push(avg);
        self.history.fitness_std.push(variance.sqrt());
        self.history.diversity.push(self.compute_diversity());
    }

    /// Mean pairwise gene distance.
    fn compute_diversity(&self) -> f64 {
        if self.population.len() < 2 {
            return 0.0;
        }

        let mut total_distance = 0.0;
        let mut count = 0;
        for i in 0..self.population.len() {
            for j in (i + 1)..self.population.len() {
                total_distance += genome_distance(&self.population[i], &self.population[j]);
                count += 1;
            }
        }
        total_distance / count as f64
    }

    /// Run one full generation: rank, keep the elite, breed and mutate the
    /// rest, replace, and evaluate the new population.
    pub fn step_generation(&mut self) -> Result<(), EvolutionError> {
        self.evaluate_population()?;

        let size = self.population.len();
        let elitism = self.config.elitism.min(size.saturating_sub(1));
        let mut next_gen = Vec::with_capacity(size);

        for idx in self.ranked_indices().into_iter().take(elitism) {
            next_gen.push(self.population[idx].clone());
        }

        while next_gen.len() < size {
            self.phase = EvolutionPhase::Selecting;
            let idx1 = self.selector.select_index(&self.population, &mut self.rng)?;
            let idx2 = self.selector.select_index(&self.population, &mut self.rng)?;

            self.phase = EvolutionPhase::Breeding;
            let mut child = if self.rng.chance(self.config.crossover_probability) {
                self.breeder.breed(
                    &self.population[idx1],
                    &self.population[idx2],
                    &mut self.rng,
                )?
            } else if self.rng.chance(0.5) {
                self.population[idx1].clone()
            } else {
                self.population[idx2].clone()
            };

            self.phase = EvolutionPhase::Mutating;
            self.mutator.mutate(&mut child, &mut self.rng)?;
            next_gen.push(child);
        }

        self.population = next_gen;
        self.generation += 1;

        self.evaluate_population()?;
        self.record_generation();

        debug!(
            "Generation {}: best={:.1} evaluations={}",
            self.generation,
            self.best_fitness,
            self.evaluations()
        );
        Ok(())
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        let values: Vec<f64> = self
            .population
            .iter()
            .filter_map(|g| g.cached_fitness())
            .collect();
        let avg_fitness = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        let best_fitness = self
            .best()
            .and_then(|g| g.cached_fitness())
            .unwrap_or(f64::INFINITY);

        EvolutionProgress {
            generation: self.generation,
            best_fitness,
            avg_fitness,
            stagnation_count: self.stagnation_count,
            evaluations: self.evaluations(),
            phase: self.phase,
        }
    }

    /// Check the engine-side stop conditions.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if let Some(cap) = self.config.max_generations
            && self.generation >= cap
        {
            return Some(StopReason::MaxGenerations);
        }

        None
    }

    /// Run generations until `stop` returns true for the best genome.
    ///
    /// `stop` is the only termination authority unless `max_generations` is
    /// configured or the cancellation handle is set; a predicate that never
    /// returns true runs forever.
    pub fn run_until<P>(&mut self, stop: P) -> Result<EvolutionStats, EvolutionError>
    where
        P: FnMut(&G) -> bool,
    {
        self.run_until_with_callback(stop, |_| {})
    }

    /// Run evolution with progress callback, invoked after every generation.
    pub fn run_until_with_callback<P, C>(
        &mut self,
        mut stop: P,
        mut callback: C,
    ) -> Result<EvolutionStats, EvolutionError>
    where
        P: FnMut(&G) -> bool,
        C: FnMut(&EvolutionProgress),
    {
        if self.population.is_empty() {
            return Err(EvolutionError::NotInitialized);
        }

        let start_time = Instant::now();
        let start_evaluations = self.evaluations();

        // Evaluate initial population
        self.evaluate_population()?;
        if self.history.is_empty() {
            self.record_generation();
        }

        let stop_reason = loop {
            self.step_generation()?;
            callback(&self.progress());

            let best = self.best().ok_or(EvolutionError::NotInitialized)?;
            if stop(best) {
                break StopReason::PredicateSatisfied;
            }

            if let Some(reason) = self.should_stop() {
                if reason == StopReason::MaxGenerations {
                    warn!(
                        "Stopping at generation cap of {} before the stop condition held",
                        self.generation
                    );
                }
                break reason;
            }
        };

        self.phase = EvolutionPhase::Terminated;

        let elapsed = start_time.elapsed().as_secs_f64();
        let total_evaluations = self.evaluations();
        let run_evaluations = total_evaluations - start_evaluations;
        let progress = self.progress();

        let stats = EvolutionStats {
            generations: self.generation,
            total_evaluations,
            best_fitness: progress.best_fitness,
            final_avg_fitness: progress.avg_fitness,
            elapsed_seconds: elapsed,
            evaluations_per_second: if elapsed > 0.0 {
                run_evaluations as f64 / elapsed
            } else {
                0.0
            },
            stop_reason,
        };

        info!(
            "Search stopped after {} generations ({:?}), best fitness {:.1}",
            stats.generations, stats.stop_reason, stats.best_fitness
        );

        self.last_stats = Some(stats.clone());
        Ok(stats)
    }

    /// Report for a reporting sink: top `k` genomes, evaluation count, and
    /// mutation counts.
    pub fn report(&self, k: usize) -> EvolutionReport {
        let top = self
            .top_k(k)
            .into_iter()
            .enumerate()
            .map(|(rank, g)| GenomeSnapshot {
                rank,
                fitness: g.cached_fitness(),
                nonzero_genes: g.genes().iter().filter(|&&v| v != 0).count(),
                genes: g.genes().to_vec(),
            })
            .collect();

        EvolutionReport {
            top,
            total_evaluations: self.evaluations(),
            mutations: self.mutation_stats(),
            stats: self.last_stats.clone(),
            history: self.history.clone(),
        }
    }
}
