pub mod sampler;

use std::io::{Read, Write};

use rand::Rng;

/// Builds fresh default models for a population
pub trait Initializer {
    /// Model produced by this initializer
    type Model: Clone + Send + Sync;

    /// Builds a new model.  Any parameter without a fixed default is drawn from `rng`,
    /// which is the only source of diversity before mutation.
    fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Model;
}

/// Evaluates a model with a given payload to a given output
pub trait Evaluator<Payload: ?Sized, Output>: Sync {
    /// Runs the model over `payload`
    fn evaluate(&self, payload: &Payload) -> Output;
}

/// Walks a model's mutable parameters
pub trait WeightUpdater {
    /// Number of parameters visited by `update_weights`
    fn num_weights(&self) -> usize;

    /// Replaces every parameter `w` with `f(w)`, in a fixed order
    fn update_weights<F>(&mut self, f: &mut F)
    where
        F: FnMut(f32) -> f32;
}

/// Serialization for models
pub trait SerDe: Sized {
    /// Error conditions due to writing
    type Error;

    /// Writes out a model to writer
    fn save<A: Write>(&self, writer: &mut A) -> Result<(), Self::Error>;

    /// Loads a model from a reader.  All necessary metadata should be
    /// stored within the model
    fn load<A: Read>(reader: &mut A) -> Result<Self, Self::Error>;
}
