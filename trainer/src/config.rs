use std::{env, fmt::Display, num::NonZeroUsize, path::PathBuf, str::FromStr};

use machine_learning::{artifact::DEFAULT_MODEL_PATH, regressor::ForestConfig, synth::SynthConfig};

use crate::{Result, TrainErr};

const DEFAULT_TEST_SIZE: f64 = 0.2;
const DEFAULT_SEED: u64 = 42;

/// Everything a training run depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub synth: SynthConfig,
    /// The fraction of samples held out for evaluation.
    pub test_size: f64,
    pub split_seed: u64,
    pub forest: ForestConfig,
    pub model_path: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            synth: SynthConfig::default(),
            test_size: DEFAULT_TEST_SIZE,
            split_seed: DEFAULT_SEED,
            forest: ForestConfig::default(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl TrainingConfig {
    /// Builds the configuration from the process environment.
    ///
    /// Recognized variables are `TRAIN_SAMPLES`, `TRAIN_SEED` (used for the synthesis,
    /// the split and the forest), `FOREST_TREES`, `FOREST_MAX_DEPTH` and `MODEL_PATH`.
    /// Unset variables keep their defaults.
    ///
    /// # Returns
    /// The configuration or an error if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as `from_env`, reading the variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(samples) = parse_var::<NonZeroUsize, _>(&lookup, "TRAIN_SAMPLES")? {
            config.synth.samples = samples;
        }

        if let Some(seed) = parse_var::<u64, _>(&lookup, "TRAIN_SEED")? {
            config.synth.seed = seed;
            config.split_seed = seed;
            config.forest.seed = seed;
        }

        if let Some(trees) = parse_var::<NonZeroUsize, _>(&lookup, "FOREST_TREES")? {
            config.forest.n_estimators = trees;
        }

        if let Some(depth) = parse_var::<usize, _>(&lookup, "FOREST_MAX_DEPTH")? {
            config.forest.tree.max_depth = Some(depth);
        }

        if let Some(path) = lookup("MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };

    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| TrainErr::InvalidVar {
            var,
            reason: e.to_string(),
            value,
        })
}
