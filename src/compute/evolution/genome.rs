//! Genome representation and the random source shared by genetic operators.

use std::cmp::Ordering;

use rand::prelude::*;

use crate::schema::GeneBounds;

use super::EvolutionError;
use super::fitness::FitnessFunction;

/// Random number generator wrapper for genome operations.
///
/// One instance is threaded explicitly through initialization, selection,
/// breeding, and mutation so a fixed seed reproduces a whole run.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Bernoulli trial with the given success probability.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.r#gen::<f64>() < probability
    }

    /// Uniform gene value within bounds.
    pub fn uniform_gene(&mut self, bounds: GeneBounds) -> i32 {
        self.rng.gen_range(bounds.min..=bounds.max)
    }

    /// Non-zero integer step drawn from a normal distribution with the given
    /// standard deviation.
    pub fn gaussian_step(&mut self, sigma: f64) -> i32 {
        let noise: f64 = self.rng.sample(rand_distr::StandardNormal);
        let step = (noise * sigma).round() as i32;
        if step != 0 {
            step
        } else if self.rng.gen_bool(0.5) {
            1
        } else {
            -1
        }
    }
}

/// Capabilities the search engine needs from a candidate solution.
///
/// Selection, breeding, and mutation are written against this trait only.
/// `Clone` must be a deep copy.
pub trait Genome: Clone + Send + Sync {
    /// Gene values.
    fn genes(&self) -> &[i32];

    /// Bounds every gene must respect.
    fn bounds(&self) -> GeneBounds;

    /// Overwrite gene `index`, invalidating the cached fitness.
    fn set_gene(&mut self, index: usize, value: i32) -> Result<(), EvolutionError>;

    /// Fitness from the last evaluation, if still valid.
    fn cached_fitness(&self) -> Option<f64>;

    /// Store a freshly computed fitness.
    fn store_fitness(&mut self, fitness: f64);

    fn len(&self) -> usize {
        self.genes().len()
    }

    fn is_empty(&self) -> bool {
        self.genes().is_empty()
    }

    fn gene(&self, index: usize) -> i32 {
        self.genes()[index]
    }

    /// Return the cached fitness, computing it first if there is none.
    fn evaluate<F>(&mut self, fitness: &F) -> Result<f64, EvolutionError>
    where
        F: FitnessFunction<Self> + ?Sized,
        Self: Sized,
    {
        if let Some(cached) = self.cached_fitness() {
            return Ok(cached);
        }
        let value = fitness.score(self)?;
        self.store_fitness(value);
        Ok(value)
    }
}

/// Fixed-length vector of bounded integer deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct IntGenome {
    genes: Vec<i32>,
    bounds: GeneBounds,
    fitness: Option<f64>,
}

impl IntGenome {
    /// Create a genome, rejecting any gene outside `bounds`.
    pub fn new(genes: Vec<i32>, bounds: GeneBounds) -> Result<Self, EvolutionError> {
        if let Some((index, &value)) = genes
            .iter()
            .enumerate()
            .find(|(_, v)| !bounds.contains(**v))
        {
            return Err(EvolutionError::OutOfRange {
                index,
                value,
                min: bounds.min,
                max: bounds.max,
            });
        }

        Ok(Self {
            genes,
            bounds,
            fitness: None,
        })
    }

    /// All-zero genome of length `len`.
    pub fn zeros(len: usize, bounds: GeneBounds) -> Result<Self, EvolutionError> {
        Self::new(vec![0; len], bounds)
    }

    /// Number of genes that differ from zero.
    pub fn nonzero_genes(&self) -> usize {
        self.genes.iter().filter(|&&g| g != 0).count()
    }
}

impl Genome for IntGenome {
    fn genes(&self) -> &[i32] {
        &self.genes
    }

    fn bounds(&self) -> GeneBounds {
        self.bounds
    }

    fn set_gene(&mut self, index: usize, value: i32) -> Result<(), EvolutionError> {
        if !self.bounds.contains(value) {
            return Err(EvolutionError::OutOfRange {
                index,
                value,
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }
        let len = self.genes.len();
        let gene = self
            .genes
            .get_mut(index)
            .ok_or(EvolutionError::GeneIndex { index, len })?;
        *gene = value;
        self.fitness = None;
        Ok(())
    }

    fn cached_fitness(&self) -> Option<f64> {
        self.fitness
    }

    fn store_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }
}

/// Order genomes best first (lowest fitness); unevaluated genomes sort last.
pub fn fitness_order<G: Genome>(a: &G, b: &G) -> Ordering {
    match (a.cached_fitness(), b.cached_fitness()) {
        (Some(fa), Some(fb)) => fa.total_cmp(&fb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Mean absolute gene difference between two genomes.
pub fn genome_distance<G: Genome>(g1: &G, g2: &G) -> f64 {
    let count = g1.len().min(g2.len());
    if count == 0 {
        return 0.0;
    }

    let total: u64 = g1
        .genes()
        .iter()
        .zip(g2.genes())
        .map(|(a, b)| a.abs_diff(*b) as u64)
        .sum();

    total as f64 / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

    /// Counts calls and scores by the sum of genes.
    struct SumFitness {
        calls: AtomicU64,
    }

    impl FitnessFunction<IntGenome> for SumFitness {
        fn score(&self, genome: &IntGenome) -> Result<f64, EvolutionError> {
            self.calls.fetch_add(1, AtomicOrdering::Relaxed);
            Ok(genome.genes().iter().map(|&g| g as f64).sum())
        }

        fn evaluations(&self) -> u64 {
            self.calls.load(AtomicOrdering::Relaxed)
        }
    }

    fn sum_fitness() -> SumFitness {
        SumFitness {
            calls: AtomicU64::new(0),
        }
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        let result = IntGenome::new(vec![0, 11, 0], GeneBounds::new(-10, 10));
        assert!(matches!(
            result,
            Err(EvolutionError::OutOfRange {
                index: 1,
                value: 11,
                ..
            })
        ));
    }

    #[test]
    fn test_set_gene_rejects_out_of_range() {
        let mut genome = IntGenome::zeros(4, GeneBounds::new(-10, 10)).unwrap();
        assert!(matches!(
            genome.set_gene(2, -11),
            Err(EvolutionError::OutOfRange { index: 2, .. })
        ));
        assert_eq!(genome.genes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_set_gene_rejects_bad_index() {
        let mut genome = IntGenome::zeros(4, GeneBounds::new(-10, 10)).unwrap();
        assert!(matches!(
            genome.set_gene(4, 1),
            Err(EvolutionError::GeneIndex { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_evaluate_caches() {
        let fitness = sum_fitness();
        let mut genome = IntGenome::new(vec![1, 2, 3], GeneBounds::new(-10, 10)).unwrap();

        assert_eq!(genome.evaluate(&fitness).unwrap(), 6.0);
        assert_eq!(genome.evaluate(&fitness).unwrap(), 6.0);
        assert_eq!(fitness.evaluations(), 1);
    }

    #[test]
    fn test_set_gene_invalidates_cache() {
        let fitness = sum_fitness();
        let mut genome = IntGenome::new(vec![1, 2, 3], GeneBounds::new(-10, 10)).unwrap();
        genome.evaluate(&fitness).unwrap();

        genome.set_gene(0, 5).unwrap();
        assert_eq!(genome.cached_fitness(), None);
        assert_eq!(genome.evaluate(&fitness).unwrap(), 10.0);
        assert_eq!(fitness.evaluations(), 2);
    }

    #[test]
    fn test_clone_is_isolated() {
        let original = IntGenome::new(vec![1, 2, 3], GeneBounds::new(-10, 10)).unwrap();
        let mut copy = original.clone();
        copy.set_gene(1, -7).unwrap();

        assert_eq!(original.genes(), &[1, 2, 3]);
        assert_eq!(copy.genes(), &[1, -7, 3]);
        assert_eq!(copy.bounds(), original.bounds());
    }

    #[test]
    fn test_fitness_order_puts_unevaluated_last() {
        let bounds = GeneBounds::new(-10, 10);
        let mut a = IntGenome::zeros(2, bounds).unwrap();
        let mut b = IntGenome::zeros(2, bounds).unwrap();
        let c = IntGenome::zeros(2, bounds).unwrap();
        a.store_fitness(4.0);
        b.store_fitness(9.0);

        assert_eq!(fitness_order(&a, &b), Ordering::Less);
        assert_eq!(fitness_order(&b, &c), Ordering::Less);
        assert_eq!(fitness_order(&c, &a), Ordering::Greater);
    }

    #[test]
    fn test_genome_distance() {
        let bounds = GeneBounds::new(-10, 10);
        let g1 = IntGenome::new(vec![0, 0, 0, 0], bounds).unwrap();
        let g2 = IntGenome::new(vec![2, -2, 0, 4], bounds).unwrap();

        assert_eq!(genome_distance(&g1, &g1.clone()), 0.0);
        assert_eq!(genome_distance(&g1, &g2), 2.0);
    }

    #[test]
    fn test_rng_is_reproducible() {
        let mut a = GenomeRng::new(42);
        let mut b = GenomeRng::new(42);
        for _ in 0..16 {
            assert_eq!(a.index(1000), b.index(1000));
            assert_eq!(a.gaussian_step(3.0), b.gaussian_step(3.0));
        }
    }

    #[test]
    fn test_gaussian_step_is_nonzero() {
        let mut rng = GenomeRng::new(3);
        for _ in 0..200 {
            assert_ne!(rng.gaussian_step(0.1), 0);
        }
    }

    #[test]
    fn test_uniform_gene_in_bounds() {
        let mut rng = GenomeRng::new(9);
        let bounds = GeneBounds::new(-2, 3);
        for _ in 0..200 {
            assert!(bounds.contains(rng.uniform_gene(bounds)));
        }
    }
}
