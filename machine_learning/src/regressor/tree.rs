use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{Regressor, check_fit_inputs, check_num_features};
use crate::{MlErr, Result};

/// Node impurity (sum of squared errors) under which a node is considered pure.
const PURE_SSE: f64 = 1e-12;

/// Growth limits of a regression tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth, the root being at depth 0. `None` grows until the leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum amount of samples a node needs to be split.
    pub min_samples_split: usize,
    /// Minimum amount of samples on each side of a split.
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// A node of the tree arena. Children are indices into the same arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A CART regression tree using the squared error criterion.
///
/// Samples with `x[feature] <= threshold` go to the left child. Leaves predict the
/// mean target of the training samples that reached them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    params: TreeParams,
    num_features: usize,
    nodes: Vec<Node>,
    #[serde(skip)]
    impurity_decrease: Vec<f64>,
}

impl DecisionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Returns the amount of nodes, both splits and leaves.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the depth of the deepest leaf, 0 for a single leaf.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = Vec::from_iter((!self.nodes.is_empty()).then_some((0, 0)));

        while let Some((id, depth)) = stack.pop() {
            match self.nodes[id] {
                Node::Leaf { .. } => deepest = deepest.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }

        deepest
    }

    /// Returns the total squared error reduction achieved by the splits on each feature
    /// during the last fit. Empty for trees that were deserialized.
    pub fn impurity_decrease(&self) -> &[f64] {
        &self.impurity_decrease
    }

    /// Fits the tree over a subset of the rows of `x`, repetitions allowed.
    ///
    /// # Arguments
    /// * `x` - The feature matrix.
    /// * `y` - The targets.
    /// * `rows` - The rows to train with, reordered in place while growing.
    pub(crate) fn fit_rows(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        rows: &mut [usize],
    ) -> Result<()> {
        if rows.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        let mut grower = Grower {
            x,
            y,
            params: self.params,
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; x.ncols()],
        };
        grower.grow(rows, 0);

        self.num_features = x.ncols();
        self.nodes = grower.nodes;
        self.impurity_decrease = grower.impurity_decrease;
        Ok(())
    }

    /// Checks that the arena can be walked, for trees that weren't grown here.
    ///
    /// Every split must name an existing feature and point to children stored after
    /// it, so that every walk from the root ends in a leaf.
    ///
    /// # Returns
    /// `MlErr::Artifact` describing the first broken node, if any.
    pub(crate) fn check_structure(&self, num_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(MlErr::Artifact("decision tree has no nodes".to_string()));
        }

        if self.num_features != num_features {
            return Err(MlErr::Artifact(format!(
                "decision tree has {} features, expected {num_features}",
                self.num_features
            )));
        }

        for (id, node) in self.nodes.iter().enumerate() {
            let Node::Split {
                feature,
                left,
                right,
                ..
            } = *node
            else {
                continue;
            };

            if feature >= num_features {
                return Err(MlErr::Artifact(format!(
                    "node {id} splits on feature {feature}, expected less than {num_features}"
                )));
            }

            if [left, right]
                .iter()
                .any(|&child| child <= id || child >= self.nodes.len())
            {
                return Err(MlErr::Artifact(format!(
                    "node {id} has children {left} and {right}, expected within {}..{}",
                    id + 1,
                    self.nodes.len()
                )));
            }
        }

        Ok(())
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[feature] <= threshold { left } else { right },
            }
        }
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        check_fit_inputs(x, y)?;
        let mut rows: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &mut rows)
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if self.nodes.is_empty() {
            return Err(MlErr::NotFitted {
                what: "decision tree",
            });
        }

        check_num_features(x, self.num_features)?;
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }
}

/// The best split found for a node.
struct Split {
    feature: usize,
    threshold: f64,
    sse: f64,
}

/// Recursive tree builder over a borrowed training set.
struct Grower<'a> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    params: TreeParams,
    nodes: Vec<Node>,
    impurity_decrease: Vec<f64>,
}

impl Grower<'_> {
    /// Grows the subtree for `rows` and returns the index of its root.
    fn grow(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let n = rows.len();
        let mean = rows.iter().map(|&r| self.y[r]).sum::<f64>() / n as f64;
        let sse: f64 = rows.iter().map(|&r| (self.y[r] - mean).powi(2)).sum();

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let at_max_depth = self.params.max_depth.is_some_and(|max| depth >= max);
        if n < self.params.min_samples_split || at_max_depth || sse <= PURE_SSE {
            return id;
        }

        let Some(split) = self.best_split(rows, mean, sse) else {
            return id;
        };

        let mid = partition(rows, |r| self.x[[r, split.feature]] <= split.threshold);
        self.impurity_decrease[split.feature] += sse - split.sse;

        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    /// Scans every feature for the threshold minimizing the children's squared error.
    ///
    /// Rows are sorted by feature value and the children's errors are computed from
    /// running sums of the mean-centered targets.
    fn best_split(&self, rows: &[usize], mean: f64, sse: f64) -> Option<Split> {
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total: f64 = rows.iter().map(|&r| self.y[r] - mean).sum();
        let total_sq = sse;

        let mut best: Option<Split> = None;
        let mut order = rows.to_vec();

        for feature in 0..self.x.ncols() {
            let column = self.x.column(feature);
            order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

            let (mut left_sum, mut left_sq) = (0.0, 0.0);
            for i in 0..n - 1 {
                let yc = self.y[order[i]] - mean;
                left_sum += yc;
                left_sq += yc * yc;

                let (lo, hi) = (column[order[i]], column[order[i + 1]]);
                let (left_n, right_n) = (i + 1, n - i - 1);
                if lo == hi || left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let left_sse = (left_sq - left_sum * left_sum / left_n as f64).max(0.0);
                let right_sse = (right_sq - right_sum * right_sum / right_n as f64).max(0.0);
                let split_sse = left_sse + right_sse;

                if best.as_ref().is_none_or(|b| split_sse < b.sse) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }

                    best = Some(Split {
                        feature,
                        threshold,
                        sse: split_sse,
                    });
                }
            }
        }

        best.filter(|b| b.sse < sse)
    }
}

/// Moves the rows satisfying `pred` to the front, returning how many there are.
fn partition<F: Fn(usize) -> bool>(rows: &mut [usize], pred: F) -> usize {
    let mut mid = 0;
    for i in 0..rows.len() {
        if pred(rows[i]) {
            rows.swap(i, mid);
            mid += 1;
        }
    }
    mid
}
