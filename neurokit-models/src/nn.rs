//! Defines a fully connected feed-forward network with per-neuron activations
use ne_core;
use rand;
use serde;
use serde_json;

use std::io::{Read, Write};

use self::ne_core::model::sampler::Mutation;
use self::ne_core::model::{Evaluator, Initializer, SerDe, WeightUpdater};

use self::rand::distributions::{Distribution, Uniform};
use self::rand::Rng;

use self::serde::{Deserializer, Serializer};

use crate::activation::{Activation, ActivationFn, DEFAULT_ACTIVATION};
use crate::error::NetworkError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
/// Parameter settings used when neurons are created
pub struct NetworkDefaults {
    /// Initial weight.  Drawn uniformly from [-1, 1] when unset.
    pub weight: Option<f32>,
    /// Initial bias.  Drawn uniformly from [-1, 1] when unset.
    pub bias: Option<f32>,
    /// Activation name for new neurons
    pub activation: String,
}

impl Default for NetworkDefaults {
    fn default() -> Self {
        NetworkDefaults {
            weight: None,
            bias: None,
            activation: DEFAULT_ACTIVATION.to_string(),
        }
    }
}

impl NetworkDefaults {
    /// Defaults where every weight and bias is fixed
    pub fn fixed(weight: f32, bias: f32, activation: &str) -> Self {
        NetworkDefaults {
            weight: Some(weight),
            bias: Some(bias),
            activation: activation.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
/// Plain data form of a network, used for persistence.  Index `l` of `biases`,
/// `weights` and `activations` describes layer `l + 1`.
pub struct NetworkRecord {
    /// Neuron count per layer, input layer first
    pub sizes: Vec<usize>,
    /// Per layer, per neuron bias
    pub biases: Vec<Vec<f32>>,
    /// Per layer, per neuron, per input weight
    pub weights: Vec<Vec<Vec<f32>>>,
    /// Per layer, per neuron activation name
    pub activations: Vec<Vec<String>>,
}

#[derive(Clone, Debug)]
/// Representation of a full network.  Layer 0 is the input layer and carries no
/// parameters.  Neuron `j` of layer `l` computes
/// `activation(dot(weights[l-1][j], inputs) + biases[l-1][j])`.
pub struct Network {
    sizes: Vec<usize>,
    biases: Vec<Vec<f32>>,
    weights: Vec<Vec<Vec<f32>>>,
    activations: Vec<Vec<Activation>>,
}

#[inline]
fn dot(x: &[f32], y: &[f32]) -> f32 {
    x.iter().zip(y.iter()).map(|(a, b)| a * b).sum()
}

fn initial<R: Rng + ?Sized>(fixed: Option<f32>, rng: &mut R) -> f32 {
    match fixed {
        Some(v) => v,
        None => Uniform::new_inclusive(-1f32, 1.).sample(rng),
    }
}

fn check_sizes(sizes: &[usize]) -> Result<(), NetworkError> {
    if sizes.len() < 2 || sizes.iter().any(|s| *s == 0) {
        return Err(NetworkError::InvalidSizes(sizes.to_vec()));
    }
    Ok(())
}

impl Network {
    /// Creates a network with the given layer sizes, the input layer first.  At least
    /// two layers are required and none may be empty.
    pub fn new<R: Rng + ?Sized>(
        sizes: &[usize],
        defaults: &NetworkDefaults,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        check_sizes(sizes)?;
        Ok(Network::assemble(sizes, defaults, rng))
    }

    // Sizes must already be checked
    fn assemble<R: Rng + ?Sized>(sizes: &[usize], defaults: &NetworkDefaults, rng: &mut R) -> Self {
        let mut network = Network {
            sizes: vec![sizes[0]],
            biases: Vec::with_capacity(sizes.len() - 1),
            weights: Vec::with_capacity(sizes.len() - 1),
            activations: Vec::with_capacity(sizes.len() - 1),
        };
        for size in &sizes[1..] {
            network.push_layer(*size, defaults, rng);
        }
        network
    }

    /// Appends a layer of `size` neurons fed by the current last layer
    pub fn add_layer<R: Rng + ?Sized>(
        &mut self,
        size: usize,
        defaults: &NetworkDefaults,
        rng: &mut R,
    ) -> Result<(), NetworkError> {
        if size == 0 {
            let mut sizes = self.sizes.clone();
            sizes.push(size);
            return Err(NetworkError::InvalidSizes(sizes));
        }
        self.push_layer(size, defaults, rng);
        Ok(())
    }

    fn push_layer<R: Rng + ?Sized>(&mut self, size: usize, defaults: &NetworkDefaults, rng: &mut R) {
        let inputs = self.sizes[self.sizes.len() - 1];
        let mut weights = Vec::with_capacity(size);
        let mut biases = Vec::with_capacity(size);
        for _ in 0..size {
            let row: Vec<f32> = (0..inputs).map(|_| initial(defaults.weight, rng)).collect();
            weights.push(row);
            biases.push(initial(defaults.bias, rng));
        }

        self.sizes.push(size);
        self.weights.push(weights);
        self.biases.push(biases);
        self.activations
            .push(vec![Activation::named(defaults.activation.as_str()); size]);
    }

    /// Neuron count per layer, input layer first
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Number of layers, including the input layer
    pub fn num_layers(&self) -> usize {
        self.sizes.len()
    }

    /// Number of inputs expected by `feed_forward`
    pub fn input_size(&self) -> usize {
        self.sizes[0]
    }

    /// Number of values produced by `feed_forward`
    pub fn output_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    /// Biases of every non-input layer
    pub fn biases(&self) -> &[Vec<f32>] {
        &self.biases
    }

    /// Weights of every non-input layer
    pub fn weights(&self) -> &[Vec<Vec<f32>>] {
        &self.weights
    }

    /// Activations of every non-input layer
    pub fn activations(&self) -> &[Vec<Activation>] {
        &self.activations
    }

    /// Computes the outputs of layer `layer_index` (1-based; layer 0 is the input)
    /// given the outputs of the layer before it.
    pub fn process_layer(&self, inputs: &[f32], layer_index: usize) -> Result<Vec<f32>, NetworkError> {
        if layer_index == 0 || layer_index >= self.sizes.len() {
            return Err(NetworkError::LayerIndex {
                index: layer_index,
                layers: self.sizes.len(),
            });
        }

        let expected = self.sizes[layer_index - 1];
        if inputs.len() != expected {
            return Err(NetworkError::Shape {
                expected: expected,
                actual: inputs.len(),
            });
        }

        let l = layer_index - 1;
        self.weights[l]
            .iter()
            .zip(self.biases[l].iter())
            .zip(self.activations[l].iter())
            .map(|((row, bias), activation)| -> Result<f32, NetworkError> {
                let f = activation.resolve()?;
                Ok(f(dot(row, inputs) + bias))
            })
            .collect()
    }

    /// Runs `inputs` through every layer in order
    pub fn feed_forward(&self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        if inputs.len() != self.sizes[0] {
            return Err(NetworkError::Shape {
                expected: self.sizes[0],
                actual: inputs.len(),
            });
        }

        let mut current = inputs.to_vec();
        for layer_index in 1..self.sizes.len() {
            current = self.process_layer(&current, layer_index)?;
        }
        Ok(current)
    }

    fn check_neuron(&self, layer: usize, neuron: usize) -> Result<(), NetworkError> {
        if layer >= self.activations.len() {
            return Err(NetworkError::LayerIndex {
                index: layer,
                layers: self.sizes.len(),
            });
        }
        if neuron >= self.activations[layer].len() {
            return Err(NetworkError::NeuronIndex {
                layer: layer,
                neuron: neuron,
            });
        }
        Ok(())
    }

    /// Activation function of `neuron` in non-input layer `layer` (0-based, so 0 is
    /// the first hidden layer)
    pub fn resolve_activation(&self, layer: usize, neuron: usize) -> Result<ActivationFn, NetworkError> {
        self.check_neuron(layer, neuron)?;
        self.activations[layer][neuron].resolve()
    }

    /// Replaces the activation of a single neuron.  Indexing matches
    /// `resolve_activation`.  Unknown names are accepted here and fail on use.
    pub fn set_activation<A: Into<Activation>>(
        &mut self,
        layer: usize,
        neuron: usize,
        activation: A,
    ) -> Result<(), NetworkError> {
        self.check_neuron(layer, neuron)?;
        self.activations[layer][neuron] = activation.into();
        Ok(())
    }

    /// Perturbs weights and biases in place.  Returns the number of parameters changed.
    pub fn mutate<R: Rng + ?Sized>(&mut self, learning_rate: f32, mutation_chance: f32, rng: &mut R) -> usize {
        Mutation::new(learning_rate, mutation_chance).apply(self, rng)
    }

    /// Returns a mutated deep copy, leaving this network untouched
    pub fn clone_and_mutate<R: Rng + ?Sized>(
        &self,
        learning_rate: f32,
        mutation_chance: f32,
        rng: &mut R,
    ) -> Network {
        let mut copy = self.clone();
        copy.mutate(learning_rate, mutation_chance, rng);
        copy
    }

    /// Plain data form.  Fails if any neuron uses an injected function.
    pub fn to_record(&self) -> Result<NetworkRecord, NetworkError> {
        let mut activations = Vec::with_capacity(self.activations.len());
        for (l, layer) in self.activations.iter().enumerate() {
            let mut names = Vec::with_capacity(layer.len());
            for (j, activation) in layer.iter().enumerate() {
                match activation.name() {
                    Some(name) => names.push(name.to_string()),
                    None => {
                        return Err(NetworkError::DirectActivation {
                            layer: l,
                            neuron: j,
                        })
                    }
                }
            }
            activations.push(names);
        }

        Ok(NetworkRecord {
            sizes: self.sizes.clone(),
            biases: self.biases.clone(),
            weights: self.weights.clone(),
            activations: activations,
        })
    }

    /// Rebuilds a network from its record, checking every shape.  Activation names are
    /// not resolved until evaluation.
    pub fn from_record(record: NetworkRecord) -> Result<Network, NetworkError> {
        check_sizes(&record.sizes)?;
        let layers = record.sizes.len() - 1;
        if record.biases.len() != layers || record.weights.len() != layers || record.activations.len() != layers {
            return Err(NetworkError::InvalidRecord(format!(
                "expected parameters for {} layers",
                layers
            )));
        }

        for l in 0..layers {
            let (inputs, size) = (record.sizes[l], record.sizes[l + 1]);
            if record.biases[l].len() != size || record.activations[l].len() != size {
                return Err(NetworkError::InvalidRecord(format!(
                    "layer {} should have {} neurons",
                    l + 1,
                    size
                )));
            }
            if record.weights[l].len() != size || record.weights[l].iter().any(|r| r.len() != inputs) {
                return Err(NetworkError::InvalidRecord(format!(
                    "layer {} should have {}x{} weights",
                    l + 1,
                    size,
                    inputs
                )));
            }
        }

        let activations = record
            .activations
            .into_iter()
            .map(|layer| layer.into_iter().map(Activation::Named).collect())
            .collect();

        Ok(Network {
            sizes: record.sizes,
            biases: record.biases,
            weights: record.weights,
            activations: activations,
        })
    }
}

impl serde::Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.to_record().map_err(serde::ser::Error::custom)?;
        serde::Serialize::serialize(&record, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = <NetworkRecord as serde::Deserialize>::deserialize(deserializer)?;
        Network::from_record(record).map_err(serde::de::Error::custom)
    }
}

impl Evaluator<[f32], Result<Vec<f32>, NetworkError>> for Network {
    fn evaluate(&self, payload: &[f32]) -> Result<Vec<f32>, NetworkError> {
        self.feed_forward(payload)
    }
}

impl WeightUpdater for Network {
    fn num_weights(&self) -> usize {
        self.weights
            .iter()
            .zip(self.biases.iter())
            .map(|(w, b)| w.iter().map(|r| r.len()).sum::<usize>() + b.len())
            .sum()
    }

    // Per layer: weights row by row, then biases
    fn update_weights<F>(&mut self, f: &mut F)
    where
        F: FnMut(f32) -> f32,
    {
        for (w, b) in self.weights.iter_mut().zip(self.biases.iter_mut()) {
            for row in w.iter_mut() {
                for x in row.iter_mut() {
                    *x = f(*x);
                }
            }
            for x in b.iter_mut() {
                *x = f(*x);
            }
        }
    }
}

impl SerDe for Network {
    type Error = NetworkError;

    fn save<A: Write>(&self, writer: &mut A) -> Result<(), Self::Error> {
        serde_json::to_writer(writer, &self.to_record()?)?;
        Ok(())
    }

    fn load<A: Read>(reader: &mut A) -> Result<Self, Self::Error> {
        let record: NetworkRecord = serde_json::from_reader(reader)?;
        Network::from_record(record)
    }
}

#[derive(Clone, Debug)]
/// Builds networks of a fixed shape for a population
pub struct NetworkBuilder {
    sizes: Vec<usize>,
    defaults: NetworkDefaults,
}

impl NetworkBuilder {
    /// Creates a builder, validating the layer sizes up front
    pub fn new(sizes: &[usize], defaults: NetworkDefaults) -> Result<Self, NetworkError> {
        check_sizes(sizes)?;
        Ok(NetworkBuilder {
            sizes: sizes.to_vec(),
            defaults: defaults,
        })
    }

    /// Layer sizes of built networks
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Parameter defaults of built networks
    pub fn defaults(&self) -> &NetworkDefaults {
        &self.defaults
    }
}

impl Initializer for NetworkBuilder {
    type Model = Network;

    fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Network {
        Network::assemble(&self.sizes, &self.defaults, rng)
    }
}
