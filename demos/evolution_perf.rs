//! Quick evolution performance test

use gapress::{
    CompressionFitness, EvolutionEngine, IntGenome, Lz4Compressor,
    compute::evolution::compression_ratio,
    schema::{SearchConfig, SelectionConfig},
};
use rand::prelude::*;
use std::time::Instant;

fn main() {
    println!("=== Evolution Performance Test ===\n");

    // Synthetic gray images: smooth gradient plus small noise
    for side in [16usize, 32, 64] {
        println!("Image size: {}x{}", side, side);

        let mut rng = StdRng::seed_from_u64(side as u64);
        let reference: Vec<u8> = (0..side * side)
            .map(|i| {
                let base = ((i % side) * 255 / side) as i32;
                (base + rng.gen_range(-6..=6)).clamp(0, 255) as u8
            })
            .collect();

        let config = SearchConfig {
            population_size: 20,
            max_generations: Some(50),
            selection: SelectionConfig {
                tournament_size: 3,
                tournament_probability: 0.8,
            },
            random_seed: Some(42),
            ..Default::default()
        };

        let start = Instant::now();
        let seed = IntGenome::zeros(reference.len(), config.gene_bounds).unwrap();
        let fitness = CompressionFitness::new(reference, Lz4Compressor);
        let baseline = fitness.baseline_len();
        let mut engine = EvolutionEngine::new(config, fitness).unwrap();
        engine.init(20, &seed).unwrap();
        let stats = engine.run_until(|_| false).unwrap();
        let elapsed = start.elapsed();

        println!("  Generations:    {}", stats.generations);
        println!("  Evaluations:    {}", stats.total_evaluations);
        println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
        println!("  Evals/sec:      {:.1}", stats.evaluations_per_second);
        println!(
            "  Best ratio:     {:.4}",
            compression_ratio(stats.best_fitness, baseline)
        );
        println!("  Mutations:      {}", engine.mutation_stats());
        println!();
    }
}
