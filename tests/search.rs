//! End-to-end search scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};

use gapress::{
    compute::{
        IdentityCompressor, Lz4Compressor,
        evolution::{
            CompressionFitness, EvolutionEngine, EvolutionError, FitnessFunction, Genome,
            IntGenome,
        },
    },
    schema::{
        EvolutionPhase, GeneBounds, MutationKind, SearchConfig, SelectionConfig, StopReason,
    },
};

fn reference_config() -> SearchConfig {
    SearchConfig {
        population_size: 10,
        selection: SelectionConfig {
            tournament_size: 5,
            tournament_probability: 0.7,
        },
        crossover_probability: 0.7,
        random_seed: Some(2017),
        ..Default::default()
    }
}

fn noisy(len: usize) -> Vec<u8> {
    (0..len as u32)
        .map(|i| 120 + ((i.wrapping_mul(2_654_435_761) >> 27) as u8))
        .collect()
}

#[test]
fn four_byte_identity_fitness() {
    let fitness = CompressionFitness::new(vec![100u8; 4], IdentityCompressor);
    let mut genome = IntGenome::zeros(4, GeneBounds::new(-10, 10)).unwrap();

    assert_eq!(genome.evaluate(&fitness).unwrap(), 16.0);
    assert_eq!(FitnessFunction::<IntGenome>::evaluations(&fitness), 1);
}

#[test]
fn init_then_first_evaluation() {
    let mut config = reference_config();
    config.mutation.probability = 0.5;

    let fitness = CompressionFitness::new(vec![100u8; 16], IdentityCompressor);
    let seed = IntGenome::zeros(16, GeneBounds::new(-10, 10)).unwrap();
    let mut engine = EvolutionEngine::new(config, fitness).unwrap();
    engine.init(10, &seed).unwrap();

    assert_eq!(engine.population().len(), 10);
    assert!(engine.population().iter().all(|g| g.genes() == seed.genes()));

    engine.evaluate_population().unwrap();
    assert_eq!(engine.evaluations(), 10);
}

#[test]
fn first_run_scores_each_seed_copy_once() {
    // Without mutation every child is a copy or a crossover of identical
    // parents, so no genome needs rescoring after the initial evaluation.
    let mut config = reference_config();
    config.mutation.probability = 0.0;

    let fitness = CompressionFitness::new(noisy(32), Lz4Compressor);
    let seed = IntGenome::zeros(32, GeneBounds::new(-10, 10)).unwrap();
    let mut engine = EvolutionEngine::new(config, fitness).unwrap();
    engine.init(10, &seed).unwrap();
    assert_eq!(engine.evaluations(), 0);

    engine.run_until(|_| true).unwrap();
    assert_eq!(engine.evaluations(), 10);
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn offspring_are_rescored_after_mutation() {
    let mut config = reference_config();
    config.mutation.probability = 1.0;
    config.mutation.operators = vec![MutationKind::Shift];

    let fitness = CompressionFitness::new(noisy(32), Lz4Compressor);
    let seed = IntGenome::zeros(32, GeneBounds::new(-10, 10)).unwrap();
    let mut engine = EvolutionEngine::new(config, fitness).unwrap();
    engine.init(10, &seed).unwrap();

    engine.run_until(|_| true).unwrap();
    // Ten initial scores, then one per offspring beside the single elite.
    assert_eq!(engine.evaluations(), 10 + 9);
    assert_eq!(engine.mutation_stats().count("Shift"), Some(9));
}

#[test]
fn immediate_stop_runs_one_generation() {
    let fitness = CompressionFitness::new(noisy(64), Lz4Compressor);
    let seed = IntGenome::zeros(64, GeneBounds::new(-10, 10)).unwrap();
    let mut engine = EvolutionEngine::new(reference_config(), fitness).unwrap();
    engine.init(10, &seed).unwrap();

    let calls = AtomicUsize::new(0);
    let stats = engine
        .run_until(|_| {
            calls.fetch_add(1, Ordering::Relaxed);
            true
        })
        .unwrap();

    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(stats.generations, 1);
    assert_eq!(engine.generation(), 1);
    assert_eq!(stats.stop_reason, StopReason::PredicateSatisfied);
    assert_eq!(engine.phase(), EvolutionPhase::Terminated);
}

#[test]
fn predicate_sees_best_genome() {
    let fitness = CompressionFitness::new(noisy(64), Lz4Compressor);
    let seed = IntGenome::zeros(64, GeneBounds::new(-10, 10)).unwrap();
    let mut engine = EvolutionEngine::new(reference_config(), fitness).unwrap();
    engine.init(10, &seed).unwrap();

    let mut seen = Vec::new();
    engine
        .run_until(|best| {
            seen.push(best.cached_fitness().unwrap());
            seen.len() == 5
        })
        .unwrap();

    assert_eq!(seen.len(), 5);
    assert!(seen.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(
        engine.best().unwrap().cached_fitness(),
        seen.last().copied()
    );
}

#[test]
fn search_improves_on_noisy_reference() {
    let reference: Vec<u8> = (0..256u32)
        .map(|i| 100 + ((i.wrapping_mul(2_654_435_761) >> 29) as u8))
        .collect();
    let fitness = CompressionFitness::new(reference, Lz4Compressor);
    let seed = IntGenome::zeros(256, GeneBounds::new(-10, 10)).unwrap();
    let config = SearchConfig {
        max_generations: Some(300),
        ..reference_config()
    };
    let mut engine = EvolutionEngine::new(config, fitness).unwrap();
    engine.init(10, &seed).unwrap();
    engine.evaluate_population().unwrap();
    let initial = engine.best().unwrap().cached_fitness().unwrap();

    let stats = engine.run_until(|_| false).unwrap();

    assert_eq!(stats.stop_reason, StopReason::MaxGenerations);
    assert!(stats.best_fitness <= initial);
    assert_eq!(engine.population().len(), 10);
    assert!(engine.mutation_stats().total() > 0);
}

#[test]
fn fixed_seed_is_reproducible() {
    let run = || {
        let fitness = CompressionFitness::new(noisy(128), Lz4Compressor);
        let seed = IntGenome::zeros(128, GeneBounds::new(-10, 10)).unwrap();
        let config = SearchConfig {
            max_generations: Some(20),
            ..reference_config()
        };
        let mut engine = EvolutionEngine::new(config, fitness).unwrap();
        engine.init(10, &seed).unwrap();
        engine.run_until(|_| false).unwrap();
        let report = engine.report(3);
        (report.top[0].genes.clone(), report.mutations, report.total_evaluations)
    };

    assert_eq!(run(), run());
}

#[test]
fn evaluation_failure_aborts_generation() {
    struct Failing;

    impl FitnessFunction<IntGenome> for Failing {
        fn score(&self, genome: &IntGenome) -> Result<f64, EvolutionError> {
            Err(EvolutionError::LengthMismatch {
                expected: 0,
                actual: genome.len(),
            })
        }

        fn evaluations(&self) -> u64 {
            0
        }
    }

    let seed = IntGenome::zeros(4, GeneBounds::new(-10, 10)).unwrap();
    let mut engine = EvolutionEngine::new(reference_config(), Failing).unwrap();
    engine.init(10, &seed).unwrap();

    assert!(matches!(
        engine.run_until(|_| true),
        Err(EvolutionError::LengthMismatch { .. })
    ));
}
