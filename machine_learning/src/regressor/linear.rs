use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::{Regressor, check_fit_inputs, check_num_features};
use crate::{MlErr, Result};

const PIVOT_EPS: f64 = 1e-12;

/// Ordinary least squares linear regression with an intercept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegression {
    /// Returns a new unfitted `LinearRegression`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fitted weight of each feature, empty before fitting.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub(crate) fn check_structure(&self, num_features: usize) -> Result<()> {
        if self.coefficients.len() != num_features {
            return Err(MlErr::Artifact(format!(
                "linear regression has {} coefficients, expected {num_features}",
                self.coefficients.len()
            )));
        }

        Ok(())
    }
}

impl Regressor for LinearRegression {
    // normal equations over mean-centered data, the intercept comes back from the means
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        check_fit_inputs(x, y)?;

        let x_mean = x.mean_axis(Axis(0)).ok_or(MlErr::EmptyDataset)?;
        let y_mean = y.mean().ok_or(MlErr::EmptyDataset)?;

        let xc = &x - &x_mean;
        let yc = &y - y_mean;

        let xtx = xc.t().dot(&xc);
        let xty = xc.t().dot(&yc);
        let beta = solve(xtx, xty)?;

        self.intercept = y_mean - beta.dot(&x_mean);
        self.coefficients = beta.to_vec();
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if self.coefficients.is_empty() {
            return Err(MlErr::NotFitted {
                what: "linear regression",
            });
        }

        check_num_features(x, self.coefficients.len())?;
        let beta = ArrayView1::from(&self.coefficients);
        Ok(x.dot(&beta) + self.intercept)
    }
}

/// Solves the square system `a * v = b` by gaussian elimination with partial pivoting.
///
/// # Returns
/// The solution `v` or `MlErr::SingularMatrix` if `a` has no inverse.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return Err(MlErr::SingularMatrix);
    }

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);

        if a[[pivot, col]].abs() <= PIVOT_EPS * scale {
            return Err(MlErr::SingularMatrix);
        }

        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
            }
            b.swap(pivot, col);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }

            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut v = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * v[k]).sum();
        v[row] = (b[row] - tail) / a[[row, row]];
    }

    Ok(v)
}
