//! Defines methods shared by the Neurokit binaries

/// Methods for reading arguments
pub mod args;
/// Structs to capture model parameters
pub mod model_params;
