use ne_core::genome::{Environment, Genome};
use serde::de::DeserializeOwned;

use super::{FileStore, StoreError};

/// A single trained network, read from a snapshot or an export, that hands out fresh
/// genomes for evaluation
#[derive(Clone, Debug)]
pub struct NeuroLoader<M> {
    generation: i64,
    network: M,
}

impl<M: Clone + DeserializeOwned> NeuroLoader<M> {
    /// Takes the best network of `filename`, or of the latest snapshot
    pub fn from_snapshot(store: &FileStore, filename: Option<&str>) -> Result<Self, StoreError> {
        let snapshot = store.load::<M>(filename)?;
        let generation = snapshot.generation;
        let network = snapshot
            .networks
            .into_iter()
            .next()
            .ok_or(StoreError::EmptySnapshot(generation))?;
        Ok(NeuroLoader {
            generation: generation,
            network: network,
        })
    }

    /// Reads an export
    pub fn from_export(store: &FileStore, filename: Option<&str>) -> Result<Self, StoreError> {
        let export = store.load_export::<M>(filename)?;
        Ok(NeuroLoader {
            generation: export.generation,
            network: export.network,
        })
    }
}

impl<M: Clone> NeuroLoader<M> {
    /// Generation the network was saved at
    pub fn generation(&self) -> i64 {
        self.generation
    }

    /// The loaded network
    pub fn network(&self) -> &M {
        &self.network
    }

    /// New genome around a copy of the network, set up against `env`
    pub fn genome<E: Environment<M>>(&self, env: &E) -> Genome<M, E::Handle> {
        Genome::with_environment(self.network.clone(), env)
    }
}
