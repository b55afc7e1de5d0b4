use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error raised by user supplied code (evaluation tasks, snapshot sources)
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Invalid engine configuration or misuse of the setup paths
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The fixed repopulation quotas alone need more slots than the population has
    #[error(
        "repopulation quotas (keep {keep} + random_add {random_add} + random_mutate \
         {random_mutate}) exceed population size {population_size}"
    )]
    QuotasExceedPopulation {
        /// Unmutated carry-overs
        keep: usize,
        /// Brand new genomes
        random_add: usize,
        /// Mutants drawn from the whole population
        random_mutate: usize,
        /// Target population size
        population_size: usize,
    },

    /// Genomes are left to breed from the elite, but the elite is empty
    #[error("best_n must be positive while {rest} genomes are bred from the elite")]
    EmptyElite {
        /// Number of genomes bred from the elite
        rest: usize,
    },

    /// Base must be finite and non-negative, factor finite and positive
    #[error("invalid learning rate: base {base}, factor {factor}")]
    InvalidLearningRate {
        /// Learning rate at generation zero
        base: f32,
        /// Per generation decay
        factor: f32,
    },

    /// Mutation chance must be a probability
    #[error("mutation chance {0} is outside [0, 1]")]
    InvalidMutationChance(f32),

    /// A population needs at least one genome
    #[error("population size must be positive")]
    EmptyPopulation,

    /// Only one setup path may ever run
    #[error("population has already been set up")]
    AlreadyPopulated,

    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    /// Config file is not valid JSON for the config struct
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Misuse of a single genome, or a failure inside its evaluation
#[derive(Debug, Error)]
pub enum GenomeError {
    /// `setup` was called on a genome that already has an evaluation handle
    #[error("genome has already been set up")]
    AlreadySetUp,

    /// The genome has no evaluation handle yet
    #[error("genome has not been set up")]
    NotSetUp,

    /// The evaluation handle has no score, usually because no evaluation completed
    #[error("evaluation handle reports no score")]
    MissingScore,

    /// The user supplied evaluation failed
    #[error("evaluation failed: {0}")]
    Evaluation(#[source] BoxError),
}

/// Errors raised by the evolution engine
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `advance_generation` was called before any setup path
    #[error("population has not been set up")]
    NotPopulated,

    /// A genome failed while being evaluated or ranked
    #[error("genome {index}: {source}")]
    Genome {
        /// Position of the genome in the population
        index: usize,
        /// What went wrong
        #[source]
        source: GenomeError,
    },

    /// A genome reported a score that cannot be ranked
    #[error("genome {index} reported a non-comparable score {score}")]
    InvalidScore {
        /// Position of the genome in the population
        index: usize,
        /// The offending score
        score: f32,
    },

    /// The generation counter cannot advance any further
    #[error("generation {0} is the last representable generation")]
    GenerationOverflow(i64),

    /// The snapshot source could not provide a snapshot
    #[error("snapshot unavailable: {0}")]
    Snapshot(#[source] BoxError),
}
