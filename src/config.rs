//! Run configuration: algorithm choice, learner hyperparameters, thresholds.
//!
//! Hyperparameters are handed to the learner as JSON without interpretation;
//! unset options serialize as `null` so the learner applies its own default.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Args;
use serde::Serialize;

use crate::conditioner::ClassDomain;
use crate::error::{ExtractError, Result};

/// Maximum share of missing values an attribute may carry.
pub const DEFAULT_MISSING_THRESHOLD: f64 = 0.1;

/// Identifier column added by the table producer; never a feature.
pub const DEFAULT_ID_COLUMN: &str = "__ID_piton__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Cart,
    Ripperk,
    Irep,
}

impl Algorithm {
    pub fn is_rule_list(&self) -> bool {
        matches!(self, Algorithm::Ripperk | Algorithm::Irep)
    }

    /// Class value handed to the rule inducer as its positive class.
    /// RIPPERk is fit against the negative slot and IREP against the positive
    /// one; the emitted rules name the positive slot either way.
    pub fn fit_positive_class<'a>(&self, domain: &'a ClassDomain) -> &'a str {
        match self {
            Algorithm::Ripperk => domain.negative(),
            _ => domain.positive(),
        }
    }
}

impl FromStr for Algorithm {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CART" => Ok(Algorithm::Cart),
            "RIPPERK" => Ok(Algorithm::Ripperk),
            "IREP" => Ok(Algorithm::Irep),
            _ => Err(ExtractError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Cart => "CART",
            Algorithm::Ripperk => "RIPPERk",
            Algorithm::Irep => "IREP",
        })
    }
}

/// Sample threshold given either as an absolute count or as a share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Quantity {
    Count(u64),
    Fraction(f64),
}

impl FromStr for Quantity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(count) = s.parse::<u64>() {
            return Ok(Quantity::Count(count));
        }
        s.parse::<f64>()
            .map(Quantity::Fraction)
            .map_err(|_| format!("expected a count or a fraction, got `{s}`"))
    }
}

/// Feature limit per split: count, share, or a named strategy (`sqrt`, `log2`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureLimit {
    Count(u64),
    Fraction(f64),
    Named(String),
}

impl FromStr for FeatureLimit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(count) = s.parse::<u64>() {
            Ok(FeatureLimit::Count(count))
        } else if let Ok(share) = s.parse::<f64>() {
            Ok(FeatureLimit::Fraction(share))
        } else if s.is_empty() {
            Err("feature limit must not be empty".to_string())
        } else {
            Ok(FeatureLimit::Named(s.to_string()))
        }
    }
}

/// Decision-tree (CART) hyperparameters.
#[derive(Debug, Clone, PartialEq, Args, Serialize)]
pub struct CartParams {
    /// Split quality function (gini, entropy, log_loss)
    #[arg(long, default_value = "gini")]
    pub criterion: String,
    /// Split strategy at each node (best, random)
    #[arg(long, default_value = "best")]
    pub splitter: String,
    /// Maximum tree depth
    #[arg(long)]
    pub max_depth: Option<u64>,
    /// Minimum samples to split an internal node (count or fraction)
    #[arg(long, default_value = "2")]
    pub min_samples_split: Quantity,
    /// Minimum samples at a leaf (count or fraction)
    #[arg(long, default_value = "1")]
    pub min_samples_leaf: Quantity,
    /// Minimum weighted fraction of samples at a leaf
    #[arg(long, default_value_t = 0.0)]
    pub min_weight_fraction_leaf: f64,
    /// Features considered per split (count, fraction, sqrt, log2)
    #[arg(long)]
    pub max_features: Option<FeatureLimit>,
    /// Grow at most this many leaves, best-first
    #[arg(long)]
    pub max_leaf_nodes: Option<u64>,
    /// Minimum impurity decrease required to split
    #[arg(long, default_value_t = 0.0)]
    pub min_impurity_decrease: f64,
    /// Class weighting strategy (balanced)
    #[arg(long)]
    pub class_weight: Option<String>,
    /// Minimal cost-complexity pruning parameter
    #[arg(long, default_value_t = 0.0)]
    pub ccp_alpha: f64,
    #[arg(skip)]
    pub random_state: Option<u64>,
}

impl Default for CartParams {
    fn default() -> Self {
        Self {
            criterion: "gini".to_string(),
            splitter: "best".to_string(),
            max_depth: None,
            min_samples_split: Quantity::Count(2),
            min_samples_leaf: Quantity::Count(1),
            min_weight_fraction_leaf: 0.0,
            max_features: None,
            max_leaf_nodes: None,
            min_impurity_decrease: 0.0,
            class_weight: None,
            ccp_alpha: 0.0,
            random_state: None,
        }
    }
}

/// Rule-induction (RIPPERk / IREP) hyperparameters.
#[derive(Debug, Clone, PartialEq, Args, Serialize)]
pub struct RuleListParams {
    /// RIPPERk optimization iterations
    #[arg(long, default_value_t = 2)]
    pub k: u32,
    /// RIPPERk description length allowance
    #[arg(long, default_value_t = 64)]
    pub dl_allowance: u32,
    /// Share of the training set held out for pruning
    #[arg(long, default_value_t = 0.33)]
    pub prune_size: f64,
    /// Maximum bins when discretizing numeric attributes
    #[arg(long, default_value_t = 10)]
    pub n_discretize_bins: u32,
    /// Maximum number of rules
    #[arg(long)]
    pub max_rules: Option<u32>,
    /// Maximum conditions per rule
    #[arg(long)]
    pub max_rule_conds: Option<u32>,
    /// RIPPERk maximum conditions across the whole ruleset
    #[arg(long)]
    pub max_total_conds: Option<u32>,
    /// Progress output level of the rule inducer
    #[arg(long = "learner-verbosity", default_value_t = 0)]
    pub verbosity: u8,
    #[arg(skip)]
    pub random_state: Option<u64>,
}

impl Default for RuleListParams {
    fn default() -> Self {
        Self {
            k: 2,
            dl_allowance: 64,
            prune_size: 0.33,
            n_discretize_bins: 10,
            max_rules: None,
            max_rule_conds: None,
            max_total_conds: None,
            verbosity: 0,
            random_state: None,
        }
    }
}

impl RuleListParams {
    /// Keyword arguments for the given inducer; IREP takes no RIPPERk-only
    /// options.
    pub fn learner_kwargs(&self, algorithm: Algorithm) -> serde_json::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if algorithm == Algorithm::Irep
            && let Some(map) = value.as_object_mut()
        {
            for key in ["k", "dl_allowance", "max_total_conds"] {
                map.remove(key);
            }
        }
        Ok(value)
    }
}

/// Everything the pipeline needs besides the dataset itself.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub algorithm: Algorithm,
    pub missing_threshold: f64,
    pub class_attribute: Option<String>,
    pub id_column: String,
    pub cart: CartParams,
    pub rule_list: RuleListParams,
}

impl ExtractConfig {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            missing_threshold: DEFAULT_MISSING_THRESHOLD,
            class_attribute: None,
            id_column: DEFAULT_ID_COLUMN.to_string(),
            cart: CartParams::default(),
            rule_list: RuleListParams::default(),
        }
    }

    pub fn with_threshold(mut self, th: f64) -> Result<Self> {
        self.missing_threshold = validate_threshold(th)?;
        Ok(self)
    }

    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.cart.random_state = seed;
        self.rule_list.random_state = seed;
        self
    }
}

pub fn validate_threshold(th: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&th) {
        Ok(th)
    } else {
        Err(ExtractError::InvalidThreshold(th))
    }
}

/// Database file to read from; absent or non-existent paths are invalid
/// connection parameters.
pub fn database_path(path: Option<&Path>) -> Result<PathBuf> {
    let path = path.ok_or_else(|| ExtractError::InvalidConnection("database".to_string()))?;
    if path.as_os_str().is_empty() || !path.exists() {
        return Err(ExtractError::InvalidConnection(format!(
            "database ({})",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}
