mod config;
mod engine;

pub use self::config::{EvolutionConfig, FailurePolicy};
pub use self::engine::{learning_rate, GenerationReport, NeuroEvolution};
