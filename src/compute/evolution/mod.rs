//! Evolutionary search module for discovering compressible pixel perturbations.
//!
//! The engine is generic over any [`Genome`] and any [`FitnessFunction`];
//! images only enter through the reference buffer handed to
//! [`CompressionFitness`].
//!
//! # Overview
//!
//! - **Genomes** (`genome`): bounded integer vectors with a cached fitness
//! - **Fitness** (`fitness`): perturb a reference buffer, score by compressed size
//! - **Selection** (`selection`): tournament selection
//! - **Breeding** (`breeder`): two-point crossover
//! - **Mutation** (`mutation`): shift, switch, and random-reset operators
//! - **Search** (`search`): the generation loop
//!
//! # Example
//!
//! ```rust,no_run
//! use gapress::compute::IdentityCompressor;
//! use gapress::compute::evolution::{CompressionFitness, EvolutionEngine, Genome, IntGenome};
//! use gapress::schema::SearchConfig;
//!
//! let config = SearchConfig {
//!     random_seed: Some(7),
//!     max_generations: Some(50),
//!     ..Default::default()
//! };
//! let fitness = CompressionFitness::new(vec![100u8; 16], IdentityCompressor);
//! let seed = IntGenome::zeros(16, config.gene_bounds).unwrap();
//!
//! let mut engine = EvolutionEngine::new(config, fitness).unwrap();
//! engine.init(10, &seed).unwrap();
//! let stats = engine.run_until(|best| best.cached_fitness() == Some(0.0)).unwrap();
//! println!("stopped after {} generations: {:?}", stats.generations, stats.stop_reason);
//! ```

mod breeder;
mod fitness;
mod genome;
mod mutation;
mod search;
mod selection;

use crate::schema::ConfigError;

pub use breeder::{Breeder, TwoPointCrossover};
pub use fitness::{CompressionFitness, FitnessFunction, apply_deltas, compression_ratio};
pub use genome::{Genome, GenomeRng, IntGenome, fitness_order, genome_distance};
pub use mutation::{
    MutationOperator, MutatorRegistry, RandomResetMutation, ShiftMutation, SwitchMutation,
};
pub use search::EvolutionEngine;
pub use selection::{Selector, TournamentSelector};

/// Error type for genome and search operations.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Gene value {value} at index {index} is outside [{min}, {max}]")]
    OutOfRange {
        index: usize,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("Gene index {index} is out of bounds for genome of length {len}")]
    GeneIndex { index: usize, len: usize },

    #[error("Genome length {actual} does not match reference length {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Population size must be non-zero")]
    EmptyPopulation,

    #[error("Population size {actual} does not match configured size {expected}")]
    PopulationSize { expected: usize, actual: usize },

    #[error("Population has not been initialized")]
    NotInitialized,

    #[error("Invalid search configuration: {0}")]
    Config(#[from] ConfigError),
}
