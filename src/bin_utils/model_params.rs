use ne_models::{NetworkDefaults, DEFAULT_ACTIVATION};

/// Shape and initial parameters of the evolved networks
#[derive(Clone, Debug, PartialEq)]
pub struct ModelParams {
    /// Hidden layer sizes, input and output layers excluded
    pub hidden_nodes: Vec<usize>,
    /// Activation name for every neuron
    pub activation: String,
    /// Fixed initial weight.  Random when unset.
    pub weight: Option<f32>,
    /// Fixed initial bias.  Random when unset.
    pub bias: Option<f32>,
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            hidden_nodes: vec![3],
            activation: DEFAULT_ACTIVATION.to_string(),
            weight: None,
            bias: None,
        }
    }
}

impl ModelParams {
    /// Network defaults described by these parameters
    pub fn defaults(&self) -> NetworkDefaults {
        NetworkDefaults {
            weight: self.weight,
            bias: self.bias,
            activation: self.activation.clone(),
        }
    }
}
