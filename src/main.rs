//! GAPress CLI - Evolve compressible noise for a grayscale image.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use gapress::{
    compute::{
        Lz4Compressor,
        evolution::{CompressionFitness, EvolutionEngine, Genome, IntGenome, compression_ratio},
    },
    imaging,
    schema::CompressConfig,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <image> [config.json]", args[0]);
        eprintln!();
        eprintln!("Evolve per-pixel noise that makes a grayscale image compress better.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  image        Input image (PNG, JPEG, GIF, BMP)");
        eprintln!("  config.json  Search configuration (default settings if omitted)");
        eprintln!();
        eprintln!("Print a default configuration with --example.");
        std::process::exit(1);
    }

    let image_path = PathBuf::from(&args[1]);
    let config_path = args.get(2).map(PathBuf::from);

    if let Err(e) = run(&image_path, config_path.as_deref()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(image_path: &Path, config_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = match config_path {
        Some(path) => CompressConfig::from_json_file(path)?,
        None => CompressConfig::default(),
    };

    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string();

    // Load reference pixels and keep a copy of what the search sees
    let frame = imaging::load_reference(image_path, config.scale)?;
    frame.save(format!("{}.png", stem))?;

    println!("GAPress");
    println!("=======");
    println!(
        "Reference: {}x{} ({} pixels, scale 1/{})",
        frame.width,
        frame.height,
        frame.len(),
        config.scale
    );

    let fitness = CompressionFitness::new(frame.pixels.clone(), Lz4Compressor);
    let baseline = fitness.baseline_len();
    println!("Baseline compressed size: {} bytes", baseline);
    println!(
        "Population: {}, gene bounds: [{}, {}]",
        config.search.population_size, config.search.gene_bounds.min, config.search.gene_bounds.max
    );
    println!();

    let seed = IntGenome::zeros(frame.len(), config.search.gene_bounds)?;
    let mut engine = EvolutionEngine::new(config.search.clone(), fitness)?;
    engine.init(config.search.population_size, &seed)?;

    let target_ratio = config.target_ratio;
    let start = Instant::now();
    let stats = engine.run_until_with_callback(
        |best: &IntGenome| {
            let Some(fitness) = best.cached_fitness() else {
                return false;
            };
            fitness == 0.0
                || target_ratio.is_some_and(|t| compression_ratio(fitness, baseline) <= t)
        },
        |progress| {
            println!(
                "  Generation {}: ratio={:.4} best={:.0} evaluations={}",
                progress.generation,
                compression_ratio(progress.best_fitness, baseline),
                progress.best_fitness,
                progress.evaluations
            );
        },
    )?;
    let elapsed = start.elapsed();

    let report = engine.report(config.top_k);
    println!();
    println!("Top {} genomes:", report.top.len());
    for snapshot in &report.top {
        let fitness = snapshot.fitness.unwrap_or(f64::NAN);
        println!(
            "  #{:<3} fitness={:<12.0} ratio={:.4} nonzero genes={}",
            snapshot.rank + 1,
            fitness,
            compression_ratio(fitness, baseline),
            snapshot.nonzero_genes
        );
    }
    println!();
    println!("Stop reason: {:?}", stats.stop_reason);
    println!("Generations: {}", stats.generations);
    println!("Calls to score = {}", report.total_evaluations);
    println!("{}", report.mutations);
    println!(
        "Time: {:.2}s ({:.1} evaluations/s)",
        elapsed.as_secs_f64(),
        stats.evaluations_per_second
    );

    if let Some(best) = engine.best() {
        let pixels = engine.fitness().perturb(best.genes())?;
        let best_path = format!("{}.best.png", stem);
        frame.with_pixels(pixels)?.save(&best_path)?;
        println!("Best result written to {}", best_path);
    }

    Ok(())
}

fn print_example_config() {
    let config = CompressConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
