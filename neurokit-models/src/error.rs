use thiserror::Error;

#[derive(Debug, Error)]
/// Error conditions for building, evaluating and (de)serializing networks
pub enum NetworkError {
    /// Input vector length does not match the layer it feeds
    #[error("expected {expected} inputs, got {actual}")]
    Shape {
        /// Size of the feeding layer
        expected: usize,
        /// Length of the supplied vector
        actual: usize,
    },

    /// Layer index outside the non-input layers
    #[error("invalid layer index {index}: network has {layers} layers")]
    LayerIndex {
        /// Requested index
        index: usize,
        /// Number of layers, including the input layer
        layers: usize,
    },

    /// Neuron index outside its layer
    #[error("layer {layer} has no neuron {neuron}")]
    NeuronIndex {
        /// Layer index
        layer: usize,
        /// Requested neuron
        neuron: usize,
    },

    /// Activation name missing from the registry
    #[error("unknown activation function `{0}`")]
    UnknownActivation(String),

    /// Fewer than two layers, or an empty layer
    #[error("invalid layer sizes {0:?}")]
    InvalidSizes(Vec<usize>),

    /// Record does not describe a consistent network
    #[error("invalid network record: {0}")]
    InvalidRecord(String),

    /// Injected functions have no name and cannot be written to a record
    #[error("neuron {neuron} of layer {layer} uses an injected activation function")]
    DirectActivation {
        /// Layer index
        layer: usize,
        /// Neuron index
        neuron: usize,
    },

    /// Error when reading or writing json
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
