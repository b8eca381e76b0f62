pub mod artifact;
pub mod dataset;
pub mod error;
pub mod features;
pub mod metrics;
pub mod regressor;
pub mod synth;

pub use error::{MlErr, Result};
