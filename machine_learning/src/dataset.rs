use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{MlErr, Result};

/// An in-memory supervised dataset: one feature row per target.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `x` - The feature matrix, one sample per row.
    /// * `y` - The targets, one per row of `x`.
    ///
    /// # Returns
    /// A new `Dataset` or an error if the amount of rows and targets differ.
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(MlErr::SizeMismatch {
                what: "dataset targets",
                got: y.len(),
                expected: x.nrows(),
            });
        }

        Ok(Self { x, y })
    }

    /// Returns the amount of samples.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Returns the amount of features per sample.
    pub fn num_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    /// Builds a new dataset out of the given rows, in the given order.
    fn select(&self, rows: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(0), rows),
            y: self.y.select(Axis(0), rows),
        }
    }

    /// Shuffles the samples and splits them into a train and a test dataset.
    ///
    /// The test split gets `ceil(len * test_size)` samples, the train split the rest.
    ///
    /// # Arguments
    /// * `test_size` - The fraction of samples held out for testing, in `(0, 1)`.
    /// * `seed` - The seed of the shuffle.
    ///
    /// # Returns
    /// A tuple `(train, test)` or an error if either split would be empty.
    pub fn split(&self, test_size: f64, seed: u64) -> Result<(Self, Self)> {
        let samples = self.len();
        let invalid = MlErr::InvalidSplit { test_size, samples };

        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(invalid);
        }

        let n_test = (samples as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= samples {
            return Err(invalid);
        }

        let mut rows: Vec<usize> = (0..samples).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        rows.shuffle(&mut rng);

        let (train_rows, test_rows) = rows.split_at(samples - n_test);
        Ok((self.select(train_rows), self.select(test_rows)))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn ten_rows() -> Dataset {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_iter((0..10).map(|i| i as f64));
        Dataset::new(x, y).unwrap()
    }

    #[test]
    fn new_rejects_mismatched_targets() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![1.0];
        assert!(matches!(
            Dataset::new(x, y),
            Err(MlErr::SizeMismatch { got: 1, expected: 2, .. })
        ));
    }

    #[test]
    fn split_sizes_round_the_test_split_up() {
        let (train, test) = ten_rows().split(0.25, 42).unwrap();
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
    }

    #[test]
    fn split_keeps_rows_paired_with_targets() {
        let (train, test) = ten_rows().split(0.2, 7).unwrap();

        for ds in [&train, &test] {
            for (row, &target) in ds.x().rows().into_iter().zip(ds.y()) {
                assert_eq!(row[0], target * 2.0);
                assert_eq!(row[1], target * 2.0 + 1.0);
            }
        }
    }

    #[test]
    fn split_is_a_partition() {
        let (train, test) = ten_rows().split(0.2, 3).unwrap();
        let mut targets: Vec<f64> = train.y().iter().chain(test.y()).copied().collect();
        targets.sort_by(f64::total_cmp);
        assert_eq!(targets, (0..10).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_deterministic_per_seed() {
        let ds = ten_rows();
        assert_eq!(ds.split(0.2, 42).unwrap(), ds.split(0.2, 42).unwrap());
    }

    #[test]
    fn split_rejects_out_of_range_sizes() {
        let ds = ten_rows();
        for test_size in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                ds.split(test_size, 42),
                Err(MlErr::InvalidSplit { .. })
            ));
        }
    }

    #[test]
    fn split_rejects_a_single_sample() {
        let ds = Dataset::new(array![[1.0]], array![1.0]).unwrap();
        assert!(ds.split(0.2, 42).is_err());
    }
}
