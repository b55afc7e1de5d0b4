//! Masked uniform perturbation of model parameters
extern crate rand;

use self::rand::distributions::{Distribution, Uniform};
use self::rand::Rng;

use super::WeightUpdater;

/// Perturbs each parameter independently.  With probability `chance` a parameter
/// gets a value drawn uniformly from `[-learning_rate, +learning_rate]` added to it;
/// otherwise it is left alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mutation {
    learning_rate: f32,
    chance: f32,
}

impl Mutation {
    /// Returns a new Mutation.  The sign of `learning_rate` is ignored.
    pub fn new(learning_rate: f32, chance: f32) -> Self {
        Mutation {
            learning_rate: learning_rate.abs(),
            chance: chance,
        }
    }

    /// Bound on the magnitude of each perturbation
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Probability that a single parameter is perturbed
    pub fn chance(&self) -> f32 {
        self.chance
    }

    /// Mutates `model` in place, returning how many parameters were perturbed
    pub fn apply<M, R>(&self, model: &mut M, rng: &mut R) -> usize
    where
        M: WeightUpdater + ?Sized,
        R: Rng + ?Sized,
    {
        if self.chance <= 0.0 {
            return 0;
        }

        let mask = Uniform::new(0f32, 1.0);
        let noise = Uniform::new_inclusive(-self.learning_rate, self.learning_rate);
        let chance = self.chance;
        let mut mutated = 0;
        model.update_weights(&mut |w: f32| {
            if chance >= 1.0 || mask.sample(&mut *rng) < chance {
                mutated += 1;
                w + noise.sample(&mut *rng)
            } else {
                w
            }
        });
        mutated
    }
}
