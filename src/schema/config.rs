//! Configuration types for the compression search.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Inclusive range a single gene (per-pixel delta) may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneBounds {
    /// Smallest allowed delta.
    pub min: i32,
    /// Largest allowed delta.
    pub max: i32,
}

impl GeneBounds {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Check whether `value` lies within the bounds.
    #[inline]
    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp `value` into the bounds.
    #[inline]
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    /// Check that `min <= max`.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

impl Default for GeneBounds {
    fn default() -> Self {
        Self::new(-10, 10)
    }
}

/// Top-level configuration for the genetic search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of genomes kept in every generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Bounds applied to every gene.
    #[serde(default)]
    pub gene_bounds: GeneBounds,
    /// Parent selection settings.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Probability that an offspring slot is filled by crossover (0.0-1.0).
    /// Otherwise the child is a copy of one parent.
    #[serde(default = "default_crossover_probability")]
    pub crossover_probability: f64,
    /// Mutation settings.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Number of best genomes carried over unchanged each generation.
    #[serde(default = "default_elitism")]
    pub elitism: usize,
    /// Hard cap on generations, on top of the caller's stopping predicate.
    #[serde(default)]
    pub max_generations: Option<usize>,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Evaluate fitness across genomes on the rayon thread pool.
    #[serde(default = "default_parallel_evaluation")]
    pub parallel_evaluation: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            gene_bounds: GeneBounds::default(),
            selection: SelectionConfig::default(),
            crossover_probability: default_crossover_probability(),
            mutation: MutationConfig::default(),
            elitism: default_elitism(),
            max_generations: None,
            random_seed: None,
            parallel_evaluation: default_parallel_evaluation(),
        }
    }
}

fn default_population_size() -> usize {
    10
}
fn default_crossover_probability() -> f64 {
    0.7
}
fn default_elitism() -> usize {
    1
}
fn default_parallel_evaluation() -> bool {
    true
}

/// Tournament selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Contestants drawn (with replacement) per tournament.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Probability that the best remaining contestant wins, in (0, 1].
    #[serde(default = "default_tournament_probability")]
    pub tournament_probability: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            tournament_size: default_tournament_size(),
            tournament_probability: default_tournament_probability(),
        }
    }
}

fn default_tournament_size() -> usize {
    5
}
fn default_tournament_probability() -> f64 {
    0.7
}

/// Mutation operator kinds available to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// Nudge one gene by a small signed step.
    Shift,
    /// Swap the values of two genes.
    Switch,
    /// Replace one gene with a uniform value in bounds.
    RandomReset,
}

impl MutationKind {
    pub const ALL: [MutationKind; 3] = [Self::Shift, Self::Switch, Self::RandomReset];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Shift => "Shift",
            Self::Switch => "Switch",
            Self::RandomReset => "RandomReset",
        }
    }
}

/// Mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability that each registered operator fires on a child (0.0-1.0).
    #[serde(default = "default_mutation_probability")]
    pub probability: f64,
    /// Operators in registry order.
    #[serde(default = "default_operators")]
    pub operators: Vec<MutationKind>,
    /// Standard deviation of the shift step, in gene units.
    #[serde(default = "default_shift_sigma")]
    pub shift_sigma: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            probability: default_mutation_probability(),
            operators: default_operators(),
            shift_sigma: default_shift_sigma(),
        }
    }
}

fn default_mutation_probability() -> f64 {
    0.5
}
fn default_operators() -> Vec<MutationKind> {
    MutationKind::ALL.to_vec()
}
fn default_shift_sigma() -> f64 {
    2.0
}

/// Configuration for the command-line image run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressConfig {
    /// Search engine settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Integer downscale factor applied to the input image.
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Stop once the best compression ratio drops to this value.
    #[serde(default)]
    pub target_ratio: Option<f64>,
    /// Number of genomes printed in the final report.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            scale: default_scale(),
            target_ratio: None,
            top_k: default_top_k(),
        }
    }
}

fn default_scale() -> u32 {
    8
}
fn default_top_k() -> usize {
    10
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

impl SearchConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if !self.gene_bounds.is_valid() {
            return Err(ConfigError::InvalidBounds {
                min: self.gene_bounds.min,
                max: self.gene_bounds.max,
            });
        }
        if self.selection.tournament_size == 0 {
            return Err(ConfigError::InvalidTournamentSize);
        }
        let p = self.selection.tournament_probability;
        if !(p > 0.0 && p <= 1.0) {
            return Err(ConfigError::InvalidProbability {
                name: "tournament_probability",
                value: p,
            });
        }
        check_probability("crossover_probability", self.crossover_probability)?;
        check_probability("mutation.probability", self.mutation.probability)?;
        if self.mutation.operators.is_empty() {
            return Err(ConfigError::NoMutationOperators);
        }
        if !(self.mutation.shift_sigma > 0.0 && self.mutation.shift_sigma.is_finite()) {
            return Err(ConfigError::InvalidShiftSigma(self.mutation.shift_sigma));
        }
        if self.elitism == 0 || self.elitism >= self.population_size {
            return Err(ConfigError::InvalidElitism {
                elitism: self.elitism,
                population: self.population_size,
            });
        }
        if self.max_generations == Some(0) {
            return Err(ConfigError::InvalidGenerationCap);
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

impl CompressConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()?;
        if self.scale == 0 {
            return Err(ConfigError::InvalidScale);
        }
        if let Some(ratio) = self.target_ratio
            && !(ratio > 0.0 && ratio.is_finite())
        {
            return Err(ConfigError::InvalidTargetRatio(ratio));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be non-zero")]
    EmptyPopulation,
    #[error("Invalid gene bounds: min ({min}) > max ({max})")]
    InvalidBounds { min: i32, max: i32 },
    #[error("Tournament size must be non-zero")]
    InvalidTournamentSize,
    #[error("Probability {name} = {value} is out of range")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("At least one mutation operator is required")]
    NoMutationOperators,
    #[error("Shift sigma must be positive, got {0}")]
    InvalidShiftSigma(f64),
    #[error("Elitism {elitism} must be at least 1 and below the population size ({population})")]
    InvalidElitism { elitism: usize, population: usize },
    #[error("Generation cap must be non-zero")]
    InvalidGenerationCap,
    #[error("Downscale factor must be non-zero")]
    InvalidScale,
    #[error("Target compression ratio must be positive, got {0}")]
    InvalidTargetRatio(f64),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
