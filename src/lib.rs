//! Neurokit
//!
//! Neurokit is a library and a set of executables to train small neural networks with
//! neuro-evolution.  The engine and the networks live in `ne_core` and `ne_models`;
//! this crate adds persistence to disk, an example task and the pieces shared by the
//! binaries.
#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate clap;

/// Tools for binaries
pub mod bin_utils;
/// Example environment
pub mod example;
/// Snapshot and export files
pub mod store;

pub use crate::store::{FileStore, NeuroLoader, StoreError};
