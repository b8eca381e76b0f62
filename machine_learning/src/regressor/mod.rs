mod forest;
mod linear;
mod mean;
mod tree;

use std::fmt;

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

pub use forest::{ForestConfig, RandomForest};
pub use linear::LinearRegression;
pub use mean::MeanRegressor;
pub use tree::{DecisionTree, TreeParams};

use crate::{MlErr, Result};

/// A model that maps feature rows into a continuous target.
pub trait Regressor {
    /// Fits the model to the given samples, replacing any previous fit.
    ///
    /// # Arguments
    /// * `x` - The feature matrix, one sample per row.
    /// * `y` - The targets, one per row of `x`.
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()>;

    /// Predicts one target per row of `x`.
    ///
    /// # Returns
    /// The predictions or an error if the model isn't fitted or `x` has a different
    /// amount of features than the fitted data.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>>;
}

/// Validates a pair of training inputs.
pub(crate) fn check_fit_inputs(x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(MlErr::SizeMismatch {
            what: "training targets",
            got: y.len(),
            expected: x.nrows(),
        });
    }

    if x.nrows() == 0 {
        return Err(MlErr::EmptyDataset);
    }

    Ok(())
}

/// Validates the amount of columns of a prediction input.
pub(crate) fn check_num_features(x: ArrayView2<f64>, expected: usize) -> Result<()> {
    if x.ncols() != expected {
        return Err(MlErr::SizeMismatch {
            what: "prediction features",
            got: x.ncols(),
            expected,
        });
    }

    Ok(())
}

/// The different kinds of models that can be trained, persisted and served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    Forest,
    Constant,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Linear => "Linear Regression",
            ModelKind::Forest => "Random Forest",
            ModelKind::Constant => "Constant Mean",
        };

        write!(f, "{name}")
    }
}

/// A fitted regressor of any of the supported kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum Model {
    Linear(LinearRegression),
    Forest(RandomForest),
    Constant(MeanRegressor),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Linear(_) => ModelKind::Linear,
            Model::Forest(_) => ModelKind::Forest,
            Model::Constant(_) => ModelKind::Constant,
        }
    }

    /// Checks that a deserialized model is fitted on `num_features` columns and
    /// can score rows without panicking.
    ///
    /// # Returns
    /// `MlErr::Artifact` if it can't.
    pub fn check_structure(&self, num_features: usize) -> Result<()> {
        match self {
            Model::Linear(m) => m.check_structure(num_features),
            Model::Forest(m) => m.check_structure(num_features),
            Model::Constant(m) => m.check_structure(num_features),
        }
    }
}

impl Regressor for Model {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        match self {
            Model::Linear(m) => m.fit(x, y),
            Model::Forest(m) => m.fit(x, y),
            Model::Constant(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        match self {
            Model::Linear(m) => m.predict(x),
            Model::Forest(m) => m.predict(x),
            Model::Constant(m) => m.predict(x),
        }
    }
}

impl From<LinearRegression> for Model {
    fn from(value: LinearRegression) -> Self {
        Self::Linear(value)
    }
}

impl From<RandomForest> for Model {
    fn from(value: RandomForest) -> Self {
        Self::Forest(value)
    }
}

impl From<MeanRegressor> for Model {
    fn from(value: MeanRegressor) -> Self {
        Self::Constant(value)
    }
}
