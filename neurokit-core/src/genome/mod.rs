//! Genomes
//! ---
//!
//! A genome is one member of the population: a model it exclusively owns, plus an
//! evaluation handle that an [`Environment`] hands out during `setup`.  The engine
//! never looks inside the handle; it asks the genome to run its evaluation and then
//! reads the handle's score through [`Scoreable`].
use rand::Rng;

use crate::error::GenomeError;
use crate::model::sampler::Mutation;
use crate::model::{Evaluator, WeightUpdater};

/// Anything that can report the result of an evaluation
pub trait Scoreable {
    /// Latest score.  `None` means no evaluation has completed yet.
    fn score(&self) -> Option<f32>;
}

/// Evaluation handle bound to a single genome.  Higher scores are better.
pub trait Evaluation<M>: Scoreable + Send {
    /// Failure raised by the task
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the task against `model` and records the score.  `generation` is the
    /// generation being evaluated.
    fn run_evaluation(&mut self, model: &M, generation: i64) -> Result<(), Self::Error>;
}

/// Task-specific host.  Whatever arguments a handle needs live in the environment,
/// so calling `setup` again yields an equivalent, fresh handle.
pub trait Environment<M>: Send + Sync {
    /// Handle bound to each genome
    type Handle: Evaluation<M>;

    /// Creates a fresh evaluation handle
    fn setup(&self) -> Self::Handle;
}

/// One population member
#[derive(Debug)]
pub struct Genome<M, H> {
    model: M,
    handle: Option<H>,
    failed: bool,
}

impl<M, H> Genome<M, H> {
    /// Wraps a model.  The genome must be set up before it can be evaluated.
    pub fn new(model: M) -> Self {
        Genome {
            model: model,
            handle: None,
            failed: false,
        }
    }

    /// Wraps a model and sets it up against `env`
    pub fn with_environment<E>(model: M, env: &E) -> Self
    where
        E: Environment<M, Handle = H>,
    {
        Genome {
            model: model,
            handle: Some(env.setup()),
            failed: false,
        }
    }

    /// Binds an evaluation handle from `env`.  Allowed exactly once.
    pub fn setup<E>(&mut self, env: &E) -> Result<(), GenomeError>
    where
        E: Environment<M, Handle = H>,
    {
        if self.handle.is_some() {
            return Err(GenomeError::AlreadySetUp);
        }
        self.handle = Some(env.setup());
        Ok(())
    }

    /// The owned model
    pub fn network(&self) -> &M {
        &self.model
    }

    /// Consumes the genome, returning its model
    pub fn into_network(self) -> M {
        self.model
    }

    /// The evaluation handle, if set up
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    /// Whether the last evaluation failed and was penalized
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub(crate) fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Runs the model over `payload`
    pub fn feed_forward<P: ?Sized, O>(&self, payload: &P) -> O
    where
        M: Evaluator<P, O>,
    {
        self.model.evaluate(payload)
    }
}

impl<M, H> Genome<M, H>
where
    H: Evaluation<M>,
{
    /// Evaluates the model through its handle
    pub fn run_evaluation(&mut self, generation: i64) -> Result<(), GenomeError> {
        self.failed = false;
        let handle = self.handle.as_mut().ok_or(GenomeError::NotSetUp)?;
        handle
            .run_evaluation(&self.model, generation)
            .map_err(|e| GenomeError::Evaluation(Box::new(e)))
    }

    /// Score of the last evaluation.  Penalized genomes score negative infinity.
    pub fn score(&self) -> Result<f32, GenomeError> {
        if self.failed {
            return Ok(std::f32::NEG_INFINITY);
        }
        let handle = self.handle.as_ref().ok_or(GenomeError::NotSetUp)?;
        handle.score().ok_or(GenomeError::MissingScore)
    }
}

impl<M: Clone, H> Genome<M, H> {
    /// New genome around a copy of this model, with a fresh handle from `env`
    pub fn clone_with<E>(&self, env: &E) -> Self
    where
        E: Environment<M, Handle = H>,
    {
        Genome::with_environment(self.model.clone(), env)
    }

    /// New genome around a mutated copy of this model.  This genome is untouched.
    pub fn mutated_with<E, R>(&self, env: &E, mutation: &Mutation, rng: &mut R) -> Self
    where
        M: WeightUpdater,
        E: Environment<M, Handle = H>,
        R: Rng + ?Sized,
    {
        let mut model = self.model.clone();
        mutation.apply(&mut model, rng);
        Genome::with_environment(model, env)
    }
}
