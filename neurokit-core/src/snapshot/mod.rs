use std::error::Error as StdError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
/// A persisted population: one model per population slot, in ranked order
pub struct Snapshot<M> {
    /// Generation the population was ranked at
    pub generation: i64,
    /// Models, best first
    pub networks: Vec<M>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
/// A single exported model and the generation it came from
pub struct Export<M> {
    /// Generation of the owning engine at export time
    pub generation: i64,
    /// The exported model
    pub network: M,
}

/// Anything that can hand the engine a snapshot to restore
pub trait SnapshotSource<M> {
    /// Failure to locate or read a snapshot
    type Error: StdError + Send + Sync + 'static;

    /// Loads the snapshot named by `handle`, or the most recent one when `handle` is
    /// `None`.  Fails when nothing can be found.
    fn load_snapshot(&self, handle: Option<&str>) -> Result<Snapshot<M>, Self::Error>;
}
