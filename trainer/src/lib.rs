pub mod config;
pub mod error;
pub mod pipeline;

pub use config::TrainingConfig;
pub use error::{Result, TrainErr};
pub use pipeline::{Pipeline, TrainingReport};
