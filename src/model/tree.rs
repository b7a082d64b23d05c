//! CART decision tree classifier

use faer::Mat;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use tracing::info;

use super::{check_feature_count, check_training_shapes, features_to_matrix, labels_to_vec, Model};
use crate::config::{Hyperparameters, ParamReader};
use crate::error::{PipelineError, Result};

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Gini,
    Entropy,
}

impl Criterion {
    fn impurity(&self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        match self {
            Criterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| (c as f64 / n).powi(2))
                    .sum::<f64>()
            }
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }
}

/// Hyperparameters for [`DecisionTreeModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    /// Maximum depth (`None` grows until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each child
    pub min_samples_leaf: usize,
    pub criterion: Criterion,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
        }
    }
}

impl TreeParams {
    /// Read and validate from the raw mapping; unknown keys are rejected
    pub fn from_params(params: &Hyperparameters) -> Result<Self> {
        let defaults = Self::default();
        let mut reader = ParamReader::new("decisiontree", params);

        let parsed = Self {
            max_depth: reader.optional_usize_at_least("max_depth", 1)?,
            min_samples_split: reader.usize_at_least("min_samples_split", defaults.min_samples_split, 2)?,
            min_samples_leaf: reader.usize_at_least("min_samples_leaf", defaults.min_samples_leaf, 1)?,
            criterion: match reader.choice("criterion", "gini", &["gini", "entropy"])? {
                "entropy" => Criterion::Entropy,
                _ => Criterion::Gini,
            },
        };
        reader.finish()?;
        Ok(parsed)
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        class: u32,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict_row(&self, x: &Mat<f64>, row: usize) -> u32 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[(row, *feature)] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.leaves() + right.leaves(),
        }
    }
}

/// Best split found for one node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree classifier wrapped in the [`Model`] capability
#[derive(Debug, Clone, Default)]
pub struct DecisionTreeModel {
    params: TreeParams,
    fitted: Option<(usize, TreeNode)>,
}

impl DecisionTreeModel {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Depth of the fitted tree
    pub fn depth(&self) -> Option<usize> {
        self.fitted.as_ref().map(|(_, root)| root.depth())
    }

    fn build(&self, x: &Mat<f64>, y: &[u32], n_classes: usize, indices: &[usize], depth: usize) -> TreeNode {
        let counts = class_counts(y, n_classes, indices);
        let majority = majority_class(&counts);

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let should_stop = pure
            || indices.len() < self.params.min_samples_split
            || self.params.max_depth.is_some_and(|d| depth >= d);
        if should_stop {
            return TreeNode::Leaf { class: majority };
        }

        let Some(best) = self.find_best_split(x, y, n_classes, indices, &counts) else {
            return TreeNode::Leaf { class: majority };
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[(i, best.feature)] <= best.threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return TreeNode::Leaf { class: majority };
        }

        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.build(x, y, n_classes, &left_idx, depth + 1)),
            right: Box::new(self.build(x, y, n_classes, &right_idx, depth + 1)),
        }
    }

    /// Scan every feature for the split with the largest impurity decrease.
    /// Ties go to the lower feature index and the lower threshold.
    fn find_best_split(
        &self,
        x: &Mat<f64>,
        y: &[u32],
        n_classes: usize,
        indices: &[usize],
        parent_counts: &[usize],
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let criterion = self.params.criterion;
        let min_leaf = self.params.min_samples_leaf;
        let parent_impurity = criterion.impurity(parent_counts, n);

        let per_feature: Vec<Option<SplitCandidate>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature| {
                let mut pairs: Vec<(f64, u32)> = indices.iter().map(|&i| (x[(i, feature)], y[i])).collect();
                pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let mut left = vec![0usize; n_classes];
                let mut right = parent_counts.to_vec();
                let mut best: Option<SplitCandidate> = None;

                for pos in 0..n - 1 {
                    let class = pairs[pos].1 as usize;
                    left[class] += 1;
                    right[class] -= 1;

                    if pairs[pos].0 == pairs[pos + 1].0 {
                        continue;
                    }
                    let n_left = pos + 1;
                    let n_right = n - n_left;
                    if n_left < min_leaf || n_right < min_leaf {
                        continue;
                    }

                    let weighted = (n_left as f64 * criterion.impurity(&left, n_left)
                        + n_right as f64 * criterion.impurity(&right, n_right))
                        / n as f64;
                    let gain = parent_impurity - weighted;

                    if gain > 0.0 && best.as_ref().map_or(true, |b| gain > b.gain) {
                        best = Some(SplitCandidate {
                            feature,
                            threshold: split_threshold(pairs[pos].0, pairs[pos + 1].0),
                            gain,
                        });
                    }
                }
                best
            })
            .collect();

        per_feature
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<SplitCandidate>, cand| match acc {
                Some(b) if b.gain >= cand.gain => Some(b),
                _ => Some(cand),
            })
    }
}

/// Midpoint between two adjacent sorted values. Falls back to `lo` when
/// rounding pushes the midpoint out of `[lo, hi)`, so `x <= t` always
/// separates the two sides.
fn split_threshold(lo: f64, hi: f64) -> f64 {
    let mid = lo / 2.0 + hi / 2.0;
    if mid.is_finite() && lo <= mid && mid < hi {
        mid
    } else {
        lo
    }
}

fn class_counts(y: &[u32], n_classes: usize, indices: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i] as usize] += 1;
    }
    counts
}

/// Most frequent class; ties go to the lowest class index
fn majority_class(counts: &[usize]) -> u32 {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best as u32
}

impl Model for DecisionTreeModel {
    fn train(&mut self, features: &DataFrame, labels: &DataFrame) -> Result<()> {
        let x = features_to_matrix(features)?;
        let y = labels_to_vec(labels)?;
        check_training_shapes(&x, &y)?;

        let n_classes = y.iter().copied().max().map_or(0, |m| m as usize + 1);
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let root = self.build(&x, &y, n_classes, &indices, 0);

        info!(
            rows = x.nrows(),
            features = x.ncols(),
            depth = root.depth(),
            leaves = root.leaves(),
            "trained decision tree"
        );
        self.fitted = Some((x.ncols(), root));
        Ok(())
    }

    fn predict(&self, features: &DataFrame) -> Result<Vec<u32>> {
        let (n_features, root) = self.fitted.as_ref().ok_or(PipelineError::NotTrained)?;
        let x = features_to_matrix(features)?;
        check_feature_count(*n_features, &x)?;

        Ok((0..x.nrows()).map(|row| root.predict_row(&x, row)).collect())
    }

    fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    fn describe(&self) -> String {
        let depth = self
            .params
            .max_depth
            .map_or_else(|| "none".to_string(), |d| d.to_string());
        format!(
            "decisiontree(max_depth={}, min_samples_split={}, min_samples_leaf={}, criterion={:?})",
            depth, self.params.min_samples_split, self.params.min_samples_leaf, self.params.criterion
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamValue;
    use polars::prelude::*;

    #[test]
    fn test_learns_threshold() {
        let features = df! {
            "x" => [1.0f64, 2.0, 3.0, 10.0, 11.0, 12.0],
        }
        .unwrap();
        let labels = df! { "target" => [0u32, 0, 0, 1, 1, 1] }.unwrap();

        let mut model = DecisionTreeModel::default();
        model.train(&features, &labels).unwrap();

        assert_eq!(model.depth(), Some(1));
        let points = df! { "x" => [0.0f64, 6.4, 6.6, 50.0] }.unwrap();
        assert_eq!(model.predict(&points).unwrap(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_xor_needs_two_levels() {
        let features = df! {
            "a" => [0.0f64, 0.0, 1.0, 1.0],
            "b" => [0.0f64, 1.0, 0.0, 1.0],
        }
        .unwrap();
        let labels = df! { "target" => [0u32, 1, 1, 0] }.unwrap();

        let mut model = DecisionTreeModel::new(TreeParams {
            criterion: Criterion::Entropy,
            ..Default::default()
        });
        model.train(&features, &labels).unwrap();

        // No single split lowers impurity on XOR, so the root stays a leaf
        assert_eq!(model.depth(), Some(0));
        assert_eq!(model.predict(&features).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let features = df! {
            "x" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        }
        .unwrap();
        let labels = df! { "target" => [0u32, 1, 0, 1, 0, 1, 0, 1] }.unwrap();

        let mut model = DecisionTreeModel::new(TreeParams {
            max_depth: Some(2),
            ..Default::default()
        });
        model.train(&features, &labels).unwrap();

        assert!(model.depth().unwrap() <= 2);
    }

    #[test]
    fn test_multiclass() {
        let features = df! {
            "x" => [1.0f64, 1.5, 5.0, 5.5, 9.0, 9.5],
        }
        .unwrap();
        let labels = df! { "target" => [0u32, 0, 1, 1, 2, 2] }.unwrap();

        let mut model = DecisionTreeModel::default();
        model.train(&features, &labels).unwrap();

        assert_eq!(model.predict(&features).unwrap(), vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_adjacent_floats_split_cleanly() {
        let lo = 1.0 + f64::EPSILON;
        let hi = 1.0 + 2.0 * f64::EPSILON;
        let features = df! { "x" => [lo, hi] }.unwrap();
        let labels = df! { "target" => [0u32, 1] }.unwrap();

        let mut model = DecisionTreeModel::default();
        model.train(&features, &labels).unwrap();

        assert_eq!(model.depth(), Some(1));
        assert_eq!(model.predict(&features).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_huge_values_split_cleanly() {
        let features = df! { "x" => [1e308f64, 1.7e308] }.unwrap();
        let labels = df! { "target" => [0u32, 1] }.unwrap();

        let mut model = DecisionTreeModel::default();
        model.train(&features, &labels).unwrap();

        assert_eq!(model.depth(), Some(1));
        assert_eq!(model.predict(&features).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_split_threshold_stays_below_upper_value() {
        assert_eq!(split_threshold(1.0, 3.0), 2.0);
        let lo = 1.0 + f64::EPSILON;
        let hi = 1.0 + 2.0 * f64::EPSILON;
        assert!(split_threshold(lo, hi) < hi);
        assert!(split_threshold(1e308, 1.7e308).is_finite());
        assert_eq!(split_threshold(1.0, f64::MAX), 1.0 / 2.0 + f64::MAX / 2.0);
    }

    #[test]
    fn test_majority_tie_goes_to_lowest_class() {
        assert_eq!(majority_class(&[2, 2, 1]), 0);
        assert_eq!(majority_class(&[1, 3, 3]), 1);
    }

    #[test]
    fn test_predict_before_train() {
        let features = df! { "x" => [1.0f64] }.unwrap();
        assert!(matches!(
            DecisionTreeModel::default().predict(&features),
            Err(PipelineError::NotTrained)
        ));
    }

    #[test]
    fn test_params_from_mapping() {
        let mut raw = Hyperparameters::new();
        raw.insert("max_depth".to_string(), ParamValue::Int(3));
        raw.insert("criterion".to_string(), ParamValue::Str("entropy".to_string()));

        let params = TreeParams::from_params(&raw).unwrap();
        assert_eq!(params.max_depth, Some(3));
        assert_eq!(params.criterion, Criterion::Entropy);

        raw.insert("min_samples_split".to_string(), ParamValue::Int(1));
        assert!(TreeParams::from_params(&raw).is_err());
    }
}
