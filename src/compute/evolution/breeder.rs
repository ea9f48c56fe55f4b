//! Recombination of two parents into one child.

use super::EvolutionError;
use super::genome::{Genome, GenomeRng};

/// Produces one child from two parents.
pub trait Breeder<G: Genome>: Send + Sync {
    fn breed(&self, parent1: &G, parent2: &G, rng: &mut GenomeRng) -> Result<G, EvolutionError>;
}

/// Two-point crossover.
///
/// The child takes parent 1's genes outside `[a, b)` and parent 2's genes
/// inside it, with `0 <= a < b <= len` drawn uniformly.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoPointCrossover;

impl TwoPointCrossover {
    /// Crossover with explicit cut points.
    pub fn crossover_at<G: Genome>(
        parent1: &G,
        parent2: &G,
        a: usize,
        b: usize,
    ) -> Result<G, EvolutionError> {
        if parent1.len() != parent2.len() {
            return Err(EvolutionError::LengthMismatch {
                expected: parent1.len(),
                actual: parent2.len(),
            });
        }

        let mut child = parent1.clone();
        for i in a..b.min(parent2.len()) {
            let value = parent2.gene(i);
            if child.gene(i) != value {
                child.set_gene(i, value)?;
            }
        }
        Ok(child)
    }

    /// Draw two distinct cut points in `0..=len`, returned in order.
    pub fn cut_points(len: usize, rng: &mut GenomeRng) -> (usize, usize) {
        let first = rng.index(len + 1);
        let mut second = rng.index(len.max(1));
        if second >= first {
            second += 1;
        }
        (first.min(second), first.max(second))
    }
}

impl<G: Genome> Breeder<G> for TwoPointCrossover {
    fn breed(&self, parent1: &G, parent2: &G, rng: &mut GenomeRng) -> Result<G, EvolutionError> {
        if parent1.is_empty() {
            return Self::crossover_at(parent1, parent2, 0, 0);
        }
        let (a, b) = Self::cut_points(parent1.len(), rng);
        Self::crossover_at(parent1, parent2, a, b)
    }
}
