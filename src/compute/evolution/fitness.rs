//! Fitness evaluation for the compression search.
//!
//! A genome's deltas are added to an immutable reference buffer, the result
//! is clamped to valid pixel values and compressed; fitness is the square of
//! the compressed length. Lower is better.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::compute::Compressor;

use super::EvolutionError;
use super::genome::Genome;

/// Maps a genome to a scalar fitness.
///
/// Implementations are shared across rayon workers during evaluation, so any
/// internal counters must be atomic.
pub trait FitnessFunction<G: ?Sized>: Sync {
    /// Compute the fitness of `genome`.
    fn score(&self, genome: &G) -> Result<f64, EvolutionError>;

    /// Total calls to [`score`](Self::score) so far.
    fn evaluations(&self) -> u64;

    /// Genome length this function accepts, if it is fixed.
    fn genome_len(&self) -> Option<usize> {
        None
    }
}

/// Add `deltas` to `reference`, clamping each pixel to `0..=255`.
pub fn apply_deltas(reference: &[u8], deltas: &[i32]) -> Vec<u8> {
    reference
        .iter()
        .zip(deltas)
        .map(|(&pixel, &delta)| (pixel as i32).saturating_add(delta).clamp(0, 255) as u8)
        .collect()
}

/// Compressed size relative to the unperturbed baseline, derived from a
/// squared-length fitness.
pub fn compression_ratio(fitness: f64, baseline_len: usize) -> f64 {
    if baseline_len == 0 {
        return 1.0;
    }
    fitness.max(0.0).sqrt() / baseline_len as f64
}

/// Scores genomes by how well the perturbed reference buffer compresses.
pub struct CompressionFitness<C> {
    reference: Arc<[u8]>,
    compressor: C,
    baseline_len: usize,
    evaluations: AtomicU64,
}

impl<C: Compressor> CompressionFitness<C> {
    /// Create an evaluator over `reference`.
    pub fn new(reference: impl Into<Arc<[u8]>>, compressor: C) -> Self {
        let reference = reference.into();
        let baseline_len = compressor.compressed_len(&reference);

        Self {
            reference,
            compressor,
            baseline_len,
            evaluations: AtomicU64::new(0),
        }
    }

    /// The unperturbed pixel data.
    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    /// Compressed length of the unperturbed reference.
    pub fn baseline_len(&self) -> usize {
        self.baseline_len
    }

    /// Fail unless `len` equals the reference length.
    pub fn check_len(&self, len: usize) -> Result<(), EvolutionError> {
        if len != self.reference.len() {
            return Err(EvolutionError::LengthMismatch {
                expected: self.reference.len(),
                actual: len,
            });
        }
        Ok(())
    }

    /// Perturbed pixel buffer for `genes`.
    pub fn perturb(&self, genes: &[i32]) -> Result<Vec<u8>, EvolutionError> {
        self.check_len(genes.len())?;
        Ok(apply_deltas(&self.reference, genes))
    }

    /// Compressed length of the perturbed buffer. Does not count as an
    /// evaluation.
    pub fn compressed_len(&self, genes: &[i32]) -> Result<usize, EvolutionError> {
        let pixels = self.perturb(genes)?;
        Ok(self.compressor.compressed_len(&pixels))
    }
}

impl<G, C> FitnessFunction<G> for CompressionFitness<C>
where
    G: Genome,
    C: Compressor,
{
    fn score(&self, genome: &G) -> Result<f64, EvolutionError> {
        let len = self.compressed_len(genome.genes())?;
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let len = len as f64;
        Ok(len * len)
    }

    fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    fn genome_len(&self) -> Option<usize> {
        Some(self.reference.len())
    }
}
