use std::fmt;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// Regression quality of a set of predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl Metrics {
    /// Computes every metric of `y_pred` against `y_true`.
    ///
    /// # Returns
    /// The metrics or an error if the inputs are empty or of different lengths.
    pub fn evaluate(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;

        Ok(Self {
            rmse: rmse(y_true, y_pred),
            mae: mae(y_true, y_pred),
            r2: r2(y_true, y_pred),
        })
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE: {:.4}, MAE: {:.4}, R²: {:.4}",
            self.rmse, self.mae, self.r2
        )
    }
}

fn check_lengths(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(MlErr::SizeMismatch {
            what: "predictions",
            got: y_pred.len(),
            expected: y_true.len(),
        });
    }

    if y_true.is_empty() {
        return Err(MlErr::EmptyDataset);
    }

    Ok(())
}

/// Mean squared error.
pub fn mse(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    (&y_true - &y_pred).mapv(|e| e * e).mean().unwrap_or_default()
}

/// Root mean squared error.
pub fn rmse(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    mse(y_true, y_pred).sqrt()
}

/// Mean absolute error.
pub fn mae(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    (&y_true - &y_pred).mapv(f64::abs).mean().unwrap_or_default()
}

/// Coefficient of determination.
///
/// A constant `y_true` has no variance to explain: the score is 1 for exact
/// predictions and 0 otherwise.
pub fn r2(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    let mean = y_true.mean().unwrap_or_default();
    let ss_res: f64 = (&y_true - &y_pred).mapv(|e| e * e).sum();
    let ss_tot: f64 = y_true.mapv(|v| (v - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }

    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn perfect_predictions() {
        let y = array![1.0, 2.0, 3.0];
        let metrics = Metrics::evaluate(y.view(), y.view()).unwrap();
        assert_eq!(
            metrics,
            Metrics {
                rmse: 0.0,
                mae: 0.0,
                r2: 1.0
            }
        );
    }

    #[test]
    fn known_errors() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![2.0, 2.0, 3.0, 2.0];

        assert!((mse(y_true.view(), y_pred.view()) - 1.25).abs() < 1e-12);
        assert!((rmse(y_true.view(), y_pred.view()) - 1.25_f64.sqrt()).abs() < 1e-12);
        assert!((mae(y_true.view(), y_pred.view()) - 0.75).abs() < 1e-12);
        // ss_res = 5, ss_tot = 5
        assert!(r2(y_true.view(), y_pred.view()).abs() < 1e-12);
    }

    #[test]
    fn predicting_the_mean_scores_zero() {
        let y_true = array![1.0, 5.0, 9.0];
        let y_pred = array![5.0, 5.0, 5.0];
        assert_eq!(r2(y_true.view(), y_pred.view()), 0.0);
    }

    #[test]
    fn r2_can_be_negative() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![3.0, 2.0, 1.0];
        assert!(r2(y_true.view(), y_pred.view()) < 0.0);
    }

    #[test]
    fn r2_of_constant_targets() {
        let y_true = array![4.0, 4.0];
        assert_eq!(r2(y_true.view(), array![4.0, 4.0].view()), 1.0);
        assert_eq!(r2(y_true.view(), array![3.0, 5.0].view()), 0.0);
    }

    #[test]
    fn evaluate_rejects_bad_lengths() {
        let y_true = array![1.0, 2.0];
        let y_pred = array![1.0];
        assert!(matches!(
            Metrics::evaluate(y_true.view(), y_pred.view()),
            Err(MlErr::SizeMismatch { .. })
        ));

        let empty = ndarray::Array1::<f64>::zeros(0);
        assert!(matches!(
            Metrics::evaluate(empty.view(), empty.view()),
            Err(MlErr::EmptyDataset)
        ));
    }

    #[test]
    fn display_uses_four_decimals() {
        let metrics = Metrics {
            rmse: 1.0,
            mae: 0.5,
            r2: 0.98766,
        };
        assert_eq!(metrics.to_string(), "RMSE: 1.0000, MAE: 0.5000, R²: 0.9877");
    }
}
