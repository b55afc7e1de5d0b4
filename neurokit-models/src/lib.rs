//! Library defining the models evolved by Neurokit
#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;

/// Defines the registry of activation functions
pub mod activation;
/// Errors raised by networks
pub mod error;
/// Defines feed-forward neural networks
pub mod nn;

pub use crate::activation::{Activation, ActivationFn, DEFAULT_ACTIVATION};
pub use crate::error::NetworkError;
pub use crate::nn::{Network, NetworkBuilder, NetworkDefaults, NetworkRecord};
