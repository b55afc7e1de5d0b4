//! Activation functions are stored by name so that networks stay serializable.  The
//! registry is a fixed table and never changes at runtime, so it is safe to read from
//! any thread.
use std::f32::consts::E;
use std::fmt;

use crate::error::NetworkError;

/// Scalar activation function
pub type ActivationFn = fn(f32) -> f32;

/// Activation given to new neurons unless configured otherwise
pub const DEFAULT_ACTIVATION: &str = "relu";

fn identity(x: f32) -> f32 {
    x
}

fn binary_step(x: f32) -> f32 {
    if x >= 0. {
        1.
    } else {
        0.
    }
}

fn relu(x: f32) -> f32 {
    x.max(0.)
}

fn leaky_relu(x: f32) -> f32 {
    if x < 0. {
        0.01 * x
    } else {
        x
    }
}

fn tanh(x: f32) -> f32 {
    x.tanh()
}

fn sigmoid(x: f32) -> f32 {
    1. / (1. + E.powf(-x))
}

fn elu(x: f32) -> f32 {
    if x > 0. {
        x
    } else {
        x.exp() - 1.
    }
}

static REGISTRY: &[(&str, ActivationFn)] = &[
    ("identity", identity),
    ("binary_step", binary_step),
    ("relu", relu),
    ("leaky_relu", leaky_relu),
    ("tanh", tanh),
    ("sigmoid", sigmoid),
    ("elu", elu),
];

/// Looks up a registered function by name
pub fn lookup(name: &str) -> Option<ActivationFn> {
    REGISTRY.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

/// Registered names
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(n, _)| *n)
}

#[derive(Clone)]
/// Activation of a single neuron
pub enum Activation {
    /// Registry name, resolved when the neuron is evaluated
    Named(String),

    /// Function injected at runtime.  Never persisted.
    Direct(ActivationFn),
}

impl Activation {
    /// Activation referring to a registry name
    pub fn named<S: Into<String>>(name: S) -> Self {
        Activation::Named(name.into())
    }

    /// Resolves to a callable function
    pub fn resolve(&self) -> Result<ActivationFn, NetworkError> {
        match self {
            Activation::Named(name) => {
                lookup(name).ok_or_else(|| NetworkError::UnknownActivation(name.clone()))
            }
            Activation::Direct(f) => Ok(*f),
        }
    }

    /// Registry name, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Activation::Named(name) => Some(name),
            Activation::Direct(_) => None,
        }
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Activation::Named(name) => write!(f, "Named({:?})", name),
            Activation::Direct(_) => write!(f, "Direct(..)"),
        }
    }
}

impl<'a> From<&'a str> for Activation {
    fn from(name: &'a str) -> Self {
        Activation::named(name)
    }
}

impl From<ActivationFn> for Activation {
    fn from(f: ActivationFn) -> Self {
        Activation::Direct(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_values() {
        let eval = |name: &str, x: f32| lookup(name).unwrap()(x);
        assert_eq!(eval("identity", -3.5), -3.5);
        assert_eq!(eval("binary_step", 0.0), 1.0);
        assert_eq!(eval("binary_step", -0.1), 0.0);
        assert_eq!(eval("relu", -2.0), 0.0);
        assert_eq!(eval("relu", 2.0), 2.0);
        assert!((eval("leaky_relu", -2.0) + 0.02).abs() < 1e-7);
        assert!((eval("sigmoid", 0.0) - 0.5).abs() < 1e-6);
        assert!((eval("tanh", 1.0) - 1f32.tanh()).abs() < 1e-7);
        assert!((eval("elu", -1.0) - ((-1f32).exp() - 1.)).abs() < 1e-7);
        assert_eq!(names().count(), 7);
        assert!(lookup(DEFAULT_ACTIVATION).is_some());
    }

    #[test]
    fn test_resolve() {
        match Activation::named("swish").resolve() {
            Err(NetworkError::UnknownActivation(name)) => assert_eq!(name, "swish"),
            other => panic!("unexpected {:?}", other.map(|f| f(1.0))),
        }

        fn double(x: f32) -> f32 {
            2. * x
        }
        let direct = Activation::from(double as ActivationFn);
        assert_eq!(direct.resolve().unwrap()(4.0), 8.0);
        assert!(direct.name().is_none());
        assert_eq!(Activation::from("relu").name(), Some("relu"));
    }
}
