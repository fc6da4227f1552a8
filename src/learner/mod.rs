//! Learner collaborator boundary.
//!
//! Fitting is delegated to external libraries. The core only sees:
//! - a fitted tree through the [`FittedClassifier`] capability, and
//! - an induced rule list as a list of rule strings ([`RuleListModel`]).
//!
//! [`python::PythonLearner`] is the production implementation.

pub mod harness;
pub mod python;

use anyhow::Result;
use ndarray::Array2;
use serde::Deserialize;

use crate::config::{Algorithm, CartParams, RuleListParams};
use crate::dataset::Dataset;

/// One node of a fitted binary tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeNode {
    /// Rows with `feature <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// `class_vote` is the weight of class 0 at this leaf.
    Leaf { class_vote: f64 },
}

/// Read access to a fitted binary decision tree rooted at node 0.
pub trait FittedClassifier {
    fn node_count(&self) -> usize;

    /// `None` for ids outside `0..node_count()`.
    fn node(&self, id: usize) -> Option<TreeNode>;

    fn leaf_count(&self) -> usize {
        (0..self.node_count())
            .filter(|&id| matches!(self.node(id), Some(TreeNode::Leaf { .. })))
            .count()
    }
}

/// Parallel-array tree layout (per-node children, feature, threshold and
/// class weights); leaves carry a negative left child.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// `value[node][class]`: class weights at the node.
    pub value: Vec<Vec<f64>>,
}

impl TreeArrays {
    pub fn leaf(class_vote: f64) -> Self {
        let mut tree = Self::default();
        tree.push_leaf(class_vote);
        tree
    }

    /// Append a leaf and return its id.
    pub fn push_leaf(&mut self, class_vote: f64) -> usize {
        self.children_left.push(-1);
        self.children_right.push(-1);
        self.feature.push(-2);
        self.threshold.push(-2.0);
        self.value.push(vec![class_vote]);
        self.children_left.len() - 1
    }

    /// Append a split whose children are filled in later with [`Self::link`].
    pub fn push_split(&mut self, feature: usize, threshold: f64) -> usize {
        self.children_left.push(0);
        self.children_right.push(0);
        self.feature.push(feature as i64);
        self.threshold.push(threshold);
        self.value.push(Vec::new());
        self.children_left.len() - 1
    }

    pub fn link(&mut self, split: usize, left: usize, right: usize) {
        self.children_left[split] = left as i64;
        self.children_right[split] = right as i64;
    }
}

impl FittedClassifier for TreeArrays {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn node(&self, id: usize) -> Option<TreeNode> {
        let left = *self.children_left.get(id)?;
        if left < 0 {
            let class_vote = self
                .value
                .get(id)
                .and_then(|v| v.first())
                .copied()
                .unwrap_or(0.0);
            return Some(TreeNode::Leaf { class_vote });
        }
        let right = *self.children_right.get(id)?;
        let feature = *self.feature.get(id)?;
        let threshold = *self.threshold.get(id)?;
        Some(TreeNode::Split {
            feature: usize::try_from(feature).ok()?,
            threshold,
            left: usize::try_from(left).ok()?,
            right: usize::try_from(right).ok()?,
        })
    }
}

/// Rules induced by a rule-list learner, each in the native form
/// `[cond ^ cond ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RuleListModel {
    pub rules: Vec<String>,
}

impl RuleListModel {
    pub fn new(rules: Vec<String>) -> Self {
        Self { rules }
    }

    /// The learner's printed layout: rules joined by ` V` and a newline, the
    /// whole list wrapped in brackets.
    pub fn native_text(&self) -> String {
        format!("[{}]", self.rules.join(" V\n"))
    }
}

/// Booleanized CART input.
#[derive(Debug, Clone)]
pub struct TreeTrainingSet {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub target: Vec<bool>,
}

/// Token-encoded rule-induction input; `table` holds the class column too.
#[derive(Debug, Clone)]
pub struct RuleListTrainingSet {
    pub table: Dataset,
    pub class_feature: String,
    pub positive_class: String,
}

/// External fitting service.
pub trait Learner {
    fn fit_tree(
        &self,
        training: &TreeTrainingSet,
        params: &CartParams,
    ) -> Result<Box<dyn FittedClassifier>>;

    fn fit_rule_list(
        &self,
        training: &RuleListTrainingSet,
        algorithm: Algorithm,
        params: &RuleListParams,
    ) -> Result<RuleListModel>;
}
