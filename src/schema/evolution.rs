//! Progress and reporting types produced by the search engine.
//!
//! These are plain serde data so callers can print them, log them, or dump
//! them as JSON at the end of a run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the search engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// No population yet.
    #[default]
    Uninitialized,
    /// Population present, waiting for the next generation.
    Ready,
    /// Computing fitness for the population.
    Evaluating,
    /// Choosing parents.
    Selecting,
    /// Producing offspring.
    Breeding,
    /// Mutating offspring.
    Mutating,
    /// Run finished.
    Terminated,
}

/// Per-generation statistics, one entry per evaluated population.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionHistory {
    /// Best (lowest) fitness per generation.
    pub best_fitness: Vec<f64>,
    /// Mean fitness per generation.
    pub avg_fitness: Vec<f64>,
    /// Fitness standard deviation per generation.
    pub fitness_std: Vec<f64>,
    /// Mean pairwise gene distance per generation.
    pub diversity: Vec<f64>,
}

impl EvolutionHistory {
    pub fn len(&self) -> usize {
        self.best_fitness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_fitness.is_empty()
    }
}

/// Snapshot of the engine handed to progress callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Completed generation count.
    pub generation: usize,
    /// Best fitness in the current population.
    pub best_fitness: f64,
    /// Mean fitness of the current population.
    pub avg_fitness: f64,
    /// Generations without improvement of the best fitness.
    pub stagnation_count: usize,
    /// Total fitness function calls so far.
    pub evaluations: u64,
    /// Current phase.
    pub phase: EvolutionPhase,
}

/// Reason the search loop stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// The caller's stopping predicate returned true.
    PredicateSatisfied,
    /// The configured generation cap was reached.
    MaxGenerations,
    /// The cancellation handle was set.
    Cancelled,
}

/// Statistics from a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations completed.
    pub generations: usize,
    /// Total fitness function calls.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Mean fitness of the final population.
    pub final_avg_fitness: f64,
    /// Wall-clock time in seconds.
    pub elapsed_seconds: f64,
    /// Fitness calls per second.
    pub evaluations_per_second: f64,
    /// Why the loop ended.
    pub stop_reason: StopReason,
}

/// A ranked genome, detached from the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeSnapshot {
    /// Zero-based rank, best first.
    pub rank: usize,
    /// Cached fitness, if evaluated.
    pub fitness: Option<f64>,
    /// Number of genes that differ from zero.
    pub nonzero_genes: usize,
    /// Gene values.
    pub genes: Vec<i32>,
}

/// Invocation count of one mutation operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationCount {
    pub name: String,
    pub count: u64,
}

/// Invocation counts of every registered mutation operator, in registry order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationStats {
    pub operators: Vec<MutationCount>,
}

impl MutationStats {
    /// Sum of all operator invocations.
    pub fn total(&self) -> u64 {
        self.operators.iter().map(|op| op.count).sum()
    }

    /// Count for the operator with the given name.
    pub fn count(&self, name: &str) -> Option<u64> {
        self.operators
            .iter()
            .find(|op| op.name == name)
            .map(|op| op.count)
    }
}

impl fmt::Display for MutationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.operators.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", op.name, op.count)?;
        }
        Ok(())
    }
}

/// Everything a reporting sink needs at the end of (or during) a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionReport {
    /// Best genomes, best first.
    pub top: Vec<GenomeSnapshot>,
    /// Total fitness function calls.
    pub total_evaluations: u64,
    /// Per-operator mutation counts.
    pub mutations: MutationStats,
    /// Run statistics, once a run has finished.
    pub stats: Option<EvolutionStats>,
    /// Per-generation history.
    pub history: EvolutionHistory,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> MutationStats {
        MutationStats {
            operators: vec![
                MutationCount {
                    name: "Shift".into(),
                    count: 3,
                },
                MutationCount {
                    name: "Switch".into(),
                    count: 1,
                },
            ],
        }
    }

    #[test]
    fn test_mutation_stats_display() {
        assert_eq!(stats().to_string(), "Shift: 3, Switch: 1");
        assert_eq!(MutationStats::default().to_string(), "");
    }

    #[test]
    fn test_mutation_stats_lookup() {
        let stats = stats();
        assert_eq!(stats.total(), 4);
        assert_eq!(stats.count("Switch"), Some(1));
        assert_eq!(stats.count("RandomReset"), None);
    }

    #[test]
    fn test_report_serialization() {
        let report = EvolutionReport {
            top: vec![GenomeSnapshot {
                rank: 0,
                fitness: Some(16.0),
                nonzero_genes: 0,
                genes: vec![0; 4],
            }],
            total_evaluations: 10,
            mutations: stats(),
            stats: None,
            history: EvolutionHistory::default(),
        };
        let json = serde_json::to_string(&report).unwrap();
        let parsed: EvolutionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.total_evaluations, 10);
        assert_eq!(parsed.top[0].fitness, Some(16.0));
        assert_eq!(parsed.mutations, report.mutations);
    }
}
