//! GAPress - Evolve per-pixel noise that makes grayscale images more compressible.
//!
//! A genetic algorithm searches for bounded per-pixel deltas which, added to
//! a grayscale image, minimize the size of the result under a byte
//! compressor. Fitness is the squared compressed length, so lower is better.
//!
//! # Architecture
//!
//! - `schema`: Configuration, progress, and report types
//! - `compute`: Compressors and the generic evolutionary search engine
//! - `imaging`: Image loading and saving for the reference buffer
//!
//! # Example
//!
//! ```rust,no_run
//! use gapress::{
//!     compute::{
//!         Lz4Compressor,
//!         evolution::{CompressionFitness, EvolutionEngine, IntGenome},
//!     },
//!     schema::SearchConfig,
//! };
//!
//! let reference: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8).collect();
//! let config = SearchConfig {
//!     max_generations: Some(100),
//!     ..Default::default()
//! };
//!
//! let seed = IntGenome::zeros(reference.len(), config.gene_bounds).unwrap();
//! let fitness = CompressionFitness::new(reference, Lz4Compressor);
//! let mut engine = EvolutionEngine::new(config, fitness).unwrap();
//! engine.init(10, &seed).unwrap();
//!
//! let stats = engine.run_until(|_| false).unwrap();
//! println!("Best fitness after {} generations: {}", stats.generations, stats.best_fitness);
//! ```

pub mod compute;
pub mod imaging;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{
    CompressionFitness, EvolutionEngine, EvolutionError, Genome, IntGenome,
};
pub use compute::{Compressor, IdentityCompressor, Lz4Compressor};
pub use schema::{CompressConfig, SearchConfig};
