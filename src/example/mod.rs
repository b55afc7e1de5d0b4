//! Example Environment
use ne_core::genome::{Environment, Evaluation, Scoreable};
use ne_models::{Network, NetworkBuilder, NetworkDefaults, NetworkError};

/// Inputs and expected output of exclusive or
pub const XOR_TABLE: [([f32; 2], f32); 4] = [
    ([0., 0.], 0.),
    ([0., 1.], 1.),
    ([1., 0.], 1.),
    ([1., 1.], 0.),
];

/// Builder for 2-input, 1-output networks with the given hidden layers
pub fn xor_builder(hidden: &[usize], defaults: NetworkDefaults) -> Result<NetworkBuilder, NetworkError> {
    let mut sizes = Vec::with_capacity(hidden.len() + 2);
    sizes.push(2);
    sizes.extend_from_slice(hidden);
    sizes.push(1);
    NetworkBuilder::new(&sizes, defaults)
}

/// Scores networks on the XOR truth table
pub struct XorEnvironment;

/// Evaluation handle for [`XorEnvironment`].  The score is the negated sum of squared
/// errors, so a perfect network scores zero.
pub struct XorEvaluation {
    score: Option<f32>,
}

impl Scoreable for XorEvaluation {
    fn score(&self) -> Option<f32> {
        self.score
    }
}

impl Evaluation<Network> for XorEvaluation {
    type Error = NetworkError;

    fn run_evaluation(&mut self, model: &Network, _generation: i64) -> Result<(), NetworkError> {
        if model.output_size() != 1 {
            return Err(NetworkError::Shape {
                expected: 1,
                actual: model.output_size(),
            });
        }

        let mut error = 0f32;
        for (inputs, target) in XOR_TABLE.iter() {
            let out = model.feed_forward(inputs)?;
            error += (out[0] - target).powi(2);
        }
        self.score = Some(-error);
        Ok(())
    }
}

impl Environment<Network> for XorEnvironment {
    type Handle = XorEvaluation;

    fn setup(&self) -> XorEvaluation {
        XorEvaluation { score: None }
    }
}
