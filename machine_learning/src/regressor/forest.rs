use std::num::NonZeroUsize;

use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{DecisionTree, Regressor, TreeParams, check_fit_inputs};
use crate::{MlErr, Result};

const DEFAULT_TREES: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// Hyperparameters of a `RandomForest`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: NonZeroUsize,
    pub tree: TreeParams,
    /// The `i`-th tree draws its bootstrap sample with `seed + i`.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_TREES,
            tree: TreeParams::default(),
            seed: 42,
        }
    }
}

/// A bagging ensemble of regression trees, predicting the mean of its trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Returns a new unfitted `RandomForest`.
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Returns the impurity based importance of each feature.
    ///
    /// Each tree's squared error decrease per feature is normalized to sum 1, then
    /// averaged across trees. Empty before fitting.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Checks every tree of a forest that wasn't fitted here.
    pub(crate) fn check_structure(&self, num_features: usize) -> Result<()> {
        if self.trees.is_empty() {
            return Err(MlErr::Artifact("random forest has no trees".to_string()));
        }

        self.trees
            .iter()
            .try_for_each(|tree| tree.check_structure(num_features))
    }

    fn compute_importances(&mut self, num_features: usize) {
        let mut importances = vec![0.0; num_features];

        for tree in &self.trees {
            let decrease = tree.impurity_decrease();
            let total: f64 = decrease.iter().sum();
            if total <= 0.0 {
                continue;
            }

            for (acc, d) in importances.iter_mut().zip(decrease) {
                *acc += d / total;
            }
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        self.feature_importances = importances;
    }
}

/// Draws `n` row indices uniformly with replacement.
fn bootstrap_rows(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(0..n)).collect()
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        check_fit_inputs(x, y)?;

        let ForestConfig {
            n_estimators,
            tree: params,
            seed,
        } = self.config;
        let n = x.nrows();

        debug!(trees = n_estimators.get(), samples = n; "growing forest");

        self.trees = (0..n_estimators.get())
            .into_par_iter()
            .map(|i| {
                let mut rows = bootstrap_rows(n, seed.wrapping_add(i as u64));
                let mut tree = DecisionTree::new(params);
                tree.fit_rows(x, y, &mut rows)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.compute_importances(x.ncols());
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let Some(first) = self.trees.first() else {
            return Err(MlErr::NotFitted {
                what: "random forest",
            });
        };

        // every tree was fit on the same columns, the first one validates the input
        let mut sum = first.predict(x)?;
        for tree in &self.trees[1..] {
            sum += &tree.predict(x)?;
        }

        Ok(sum / self.trees.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Axis, array};

    use super::*;

    fn small_config(trees: usize, seed: u64) -> ForestConfig {
        ForestConfig {
            n_estimators: NonZeroUsize::new(trees).unwrap(),
            seed,
            ..ForestConfig::default()
        }
    }

    fn grid() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((100, 2), |(i, j)| match j {
            0 => (i % 10) as f64,
            _ => (i / 10) as f64,
        });
        let y = x.map_axis(Axis(1), |row| row[0] * row[1]);
        (x, y)
    }

    #[test]
    fn bootstrap_is_seeded_and_in_range() {
        let a = bootstrap_rows(50, 3);
        assert_eq!(a, bootstrap_rows(50, 3));
        assert_eq!(a.len(), 50);
        assert!(a.iter().all(|&r| r < 50));
        assert_ne!(a, bootstrap_rows(50, 4));
    }

    #[test]
    fn fit_grows_the_configured_amount_of_trees() {
        let (x, y) = grid();
        let mut forest = RandomForest::new(small_config(7, 1));
        forest.fit(x.view(), y.view()).unwrap();
        assert_eq!(forest.trees().len(), 7);
    }

    #[test]
    fn fit_is_deterministic() {
        let (x, y) = grid();
        let mut a = RandomForest::new(small_config(5, 11));
        let mut b = RandomForest::new(small_config(5, 11));
        a.fit(x.view(), y.view()).unwrap();
        b.fit(x.view(), y.view()).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
    }

    #[test]
    fn forest_fits_a_nonlinear_surface() {
        let (x, y) = grid();
        let mut forest = RandomForest::new(small_config(30, 42));
        forest.fit(x.view(), y.view()).unwrap();

        let pred = forest.predict(x.view()).unwrap();
        let mse = (&pred - &y).mapv(|e| e * e).mean().unwrap();
        let var = y.var(0.0);
        assert!(mse < 0.05 * var, "mse {mse} var {var}");
    }

    #[test]
    fn importances_sum_to_one_and_favor_used_features() {
        let x = Array2::from_shape_fn((60, 2), |(i, j)| match j {
            0 => i as f64,
            _ => ((i * 7) % 5) as f64,
        });
        let y = x.column(0).mapv(|v| if v < 30.0 { 0.0 } else { 10.0 });

        let mut forest = RandomForest::new(small_config(10, 0));
        forest.fit(x.view(), y.view()).unwrap();

        let importances = forest.feature_importances();
        assert_eq!(importances.len(), 2);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn predict_before_fit_fails() {
        let forest = RandomForest::new(ForestConfig::default());
        assert!(matches!(
            forest.predict(array![[1.0]].view()),
            Err(MlErr::NotFitted { .. })
        ));
    }

    #[test]
    fn predict_rejects_wrong_feature_count() {
        let (x, y) = grid();
        let mut forest = RandomForest::new(small_config(2, 0));
        forest.fit(x.view(), y.view()).unwrap();
        assert!(matches!(
            forest.predict(array![[1.0, 2.0, 3.0]].view()),
            Err(MlErr::SizeMismatch { .. })
        ));
    }
}
