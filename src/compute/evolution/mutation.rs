//! Mutation operators and the registry that applies them.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::schema::{MutationConfig, MutationCount, MutationKind, MutationStats};

use super::EvolutionError;
use super::genome::{Genome, GenomeRng};

/// A single in-place mutation.
pub trait MutationOperator<G: Genome>: Send + Sync {
    /// Name used in mutation reports.
    fn name(&self) -> &str;

    fn mutate(&self, genome: &mut G, rng: &mut GenomeRng) -> Result<(), EvolutionError>;
}

/// Adds a small non-zero signed step to one random gene, clamped to bounds.
#[derive(Debug, Clone)]
pub struct ShiftMutation {
    sigma: f64,
}

impl ShiftMutation {
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }
}

impl<G: Genome> MutationOperator<G> for ShiftMutation {
    fn name(&self) -> &str {
        MutationKind::Shift.name()
    }

    fn mutate(&self, genome: &mut G, rng: &mut GenomeRng) -> Result<(), EvolutionError> {
        if genome.is_empty() {
            return Ok(());
        }
        let index = rng.index(genome.len());
        let step = rng.gaussian_step(self.sigma);
        let value = genome.bounds().clamp(genome.gene(index).saturating_add(step));
        genome.set_gene(index, value)
    }
}

/// Swaps the values of two random genes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchMutation;

impl<G: Genome> MutationOperator<G> for SwitchMutation {
    fn name(&self) -> &str {
        MutationKind::Switch.name()
    }

    fn mutate(&self, genome: &mut G, rng: &mut GenomeRng) -> Result<(), EvolutionError> {
        if genome.is_empty() {
            return Ok(());
        }
        let i = rng.index(genome.len());
        let j = rng.index(genome.len());
        let (a, b) = (genome.gene(i), genome.gene(j));
        if a != b {
            genome.set_gene(i, b)?;
            genome.set_gene(j, a)?;
        }
        Ok(())
    }
}

/// Replaces one random gene with a uniform value in bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomResetMutation;

impl<G: Genome> MutationOperator<G> for RandomResetMutation {
    fn name(&self) -> &str {
        MutationKind::RandomReset.name()
    }

    fn mutate(&self, genome: &mut G, rng: &mut GenomeRng) -> Result<(), EvolutionError> {
        if genome.is_empty() {
            return Ok(());
        }
        let index = rng.index(genome.len());
        let value = rng.uniform_gene(genome.bounds());
        genome.set_gene(index, value)
    }
}

struct RegisteredOperator<G> {
    operator: Box<dyn MutationOperator<G>>,
    invocations: AtomicU64,
}

/// Ordered set of mutation operators, each applied independently with the
/// same probability. Invocation counts are for reporting only.
pub struct MutatorRegistry<G> {
    operators: Vec<RegisteredOperator<G>>,
    probability: f64,
}

impl<G: Genome> MutatorRegistry<G> {
    /// Empty registry firing each operator with `probability`.
    pub fn new(probability: f64) -> Self {
        Self {
            operators: Vec::new(),
            probability,
        }
    }

    /// Registry with the operators listed in `config`, in order.
    pub fn from_config(config: &MutationConfig) -> Self {
        let mut registry = Self::new(config.probability);
        for kind in &config.operators {
            match kind {
                MutationKind::Shift => registry.add(ShiftMutation::new(config.shift_sigma)),
                MutationKind::Switch => registry.add(SwitchMutation),
                MutationKind::RandomReset => registry.add(RandomResetMutation),
            }
        }
        registry
    }

    /// Append an operator.
    pub fn add<M: MutationOperator<G> + 'static>(&mut self, operator: M) {
        self.operators.push(RegisteredOperator {
            operator: Box::new(operator),
            invocations: AtomicU64::new(0),
        });
    }

    /// Builder-style [`add`](Self::add).
    pub fn with_operator<M: MutationOperator<G> + 'static>(mut self, operator: M) -> Self {
        self.add(operator);
        self
    }

    /// Give every operator its independent chance to fire on `genome`.
    /// Returns the number of operators applied.
    pub fn mutate(&self, genome: &mut G, rng: &mut GenomeRng) -> Result<usize, EvolutionError> {
        let mut applied = 0;
        for entry in &self.operators {
            if rng.chance(self.probability) {
                entry.operator.mutate(genome, rng)?;
                entry.invocations.fetch_add(1, Ordering::Relaxed);
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Invocation counts in registry order.
    pub fn stats(&self) -> MutationStats {
        MutationStats {
            operators: self
                .operators
                .iter()
                .map(|entry| MutationCount {
                    name: entry.operator.name().to_string(),
                    count: entry.invocations.load(Ordering::Relaxed),
                })
                .collect(),
        }
    }
}
