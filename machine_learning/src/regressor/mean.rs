use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{Regressor, check_fit_inputs, check_num_features};
use crate::{MlErr, Result};

/// A baseline that ignores its inputs and always predicts the training mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanRegressor {
    mean: Option<f64>,
    num_features: usize,
}

impl MeanRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean(&self) -> Option<f64> {
        self.mean
    }

    pub(crate) fn check_structure(&self, num_features: usize) -> Result<()> {
        if self.mean.is_none() || self.num_features != num_features {
            return Err(MlErr::Artifact(format!(
                "mean regressor fitted on {} features, expected {num_features}",
                self.num_features
            )));
        }

        Ok(())
    }
}

impl Regressor for MeanRegressor {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        check_fit_inputs(x, y)?;
        self.mean = y.mean();
        self.num_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let mean = self.mean.ok_or(MlErr::NotFitted {
            what: "mean regressor",
        })?;

        check_num_features(x, self.num_features)?;
        Ok(Array1::from_elem(x.nrows(), mean))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn predicts_the_training_mean_everywhere() {
        let mut model = MeanRegressor::new();
        model
            .fit(array![[1.0], [2.0], [3.0]].view(), array![1.0, 2.0, 6.0].view())
            .unwrap();

        assert_eq!(model.mean(), Some(3.0));
        let pred = model.predict(array![[-5.0], [100.0]].view()).unwrap();
        assert_eq!(pred, array![3.0, 3.0]);
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = MeanRegressor::new();
        assert!(matches!(
            model.predict(array![[1.0]].view()),
            Err(MlErr::NotFitted { .. })
        ));
    }
}
