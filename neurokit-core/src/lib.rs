//! Neurokit-Core
//! ===
//!
//! This library contains the pieces needed to evolve the parameters of small models
//! with a population-based, gradient-free search.  It knows nothing about any
//! particular model: models plug in through the traits in [`model`], and the task a
//! model is scored against plugs in through the traits in [`genome`].
//!
//! Evolution
//! ---
//! [`evolution::NeuroEvolution`] owns a population of genomes and advances it one
//! generation at a time: repopulate from the previous ranking, evaluate every genome,
//! then stably sort the population by descending score.  Repopulation is driven by
//! fixed quotas (brand new genomes, unmutated carry-overs, mutants of any member and
//! mutants of the elite) and a learning rate that decays geometrically with each
//! generation.
//!
//! Snapshots
//! ---
//! [`snapshot::Snapshot`] and [`snapshot::Export`] are the records exchanged with
//! whatever persists a population.  The engine only needs a [`snapshot::SnapshotSource`]
//! to restore from.
//!

#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;

/// Error types for configuration, genomes and the evolution engine
pub mod error;

/// Defines the interfaces for Model types for use in neuro-evolution.
pub mod model;

/// Defines the genome contract between the engine and an evaluation task
pub mod genome;

/// Records describing a persisted population or a single exported model
pub mod snapshot;

/// Defines the evolution engine and its configuration
pub mod evolution;

pub use crate::error::{ConfigError, EvolutionError, GenomeError};
