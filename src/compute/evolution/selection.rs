//! Parent selection.

use crate::schema::SelectionConfig;

use super::EvolutionError;
use super::genome::{Genome, GenomeRng, fitness_order};

/// Chooses one parent per call from an evaluated population.
pub trait Selector<G: Genome>: Send + Sync {
    /// Index of the selected parent in `population`.
    fn select_index(&self, population: &[G], rng: &mut GenomeRng) -> Result<usize, EvolutionError>;
}

/// Probabilistic tournament selection.
///
/// Draws `size` contestants with replacement and ranks them best first. The
/// best contestant wins with `probability`; on a loss the next one gets the
/// same chance, and the last contestant wins if every other one lost.
#[derive(Debug, Clone)]
pub struct TournamentSelector {
    size: usize,
    probability: f64,
}

impl TournamentSelector {
    pub fn new(size: usize, probability: f64) -> Self {
        Self {
            size: size.max(1),
            probability,
        }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.tournament_size, config.tournament_probability)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl<G: Genome> Selector<G> for TournamentSelector {
    fn select_index(&self, population: &[G], rng: &mut GenomeRng) -> Result<usize, EvolutionError> {
        if population.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }

        let mut contestants: Vec<usize> = (0..self.size)
            .map(|_| rng.index(population.len()))
            .collect();
        contestants.sort_by(|&a, &b| fitness_order(&population[a], &population[b]));

        let (last, ranked) = contestants
            .split_last()
            .ok_or(EvolutionError::EmptyPopulation)?;
        for &idx in ranked {
            if rng.chance(self.probability) {
                return Ok(idx);
            }
        }
        Ok(*last)
    }
}
