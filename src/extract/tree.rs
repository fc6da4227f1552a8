//! Decision tree → ruleset.
//!
//! Depth-first, left before right; each leaf emits the antecedents collected
//! on its path. Leaves partition the input space, so there is no default rule.

use tracing::debug;

use crate::codec::DomainDecode;
use crate::conditioner::ClassDomain;
use crate::dataset::{AttributeKind, FeatureDescriptor};
use crate::error::{ExtractError, Result};
use crate::learner::{FittedClassifier, TreeNode};

use super::{Antecedent, Operator, Rule, Ruleset, format_float};

/// Emit one rule per leaf of `tree`.
///
/// A leaf whose class-0 vote is zero predicts `class_domain[1]`, any other
/// vote predicts `class_domain[0]`.
pub fn extract(
    tree: &dyn FittedClassifier,
    features: &[FeatureDescriptor],
    class_domain: &ClassDomain,
    domain_decode: &DomainDecode,
) -> Result<Ruleset> {
    if tree.node_count() == 0 {
        return Err(ExtractError::MalformedTree("tree has no nodes".to_string()));
    }
    let walker = Walker {
        tree,
        features,
        class_domain,
        domain_decode,
    };
    let rules = walker.walk()?;
    debug!(rules = rules.len(), "tree rules extracted");
    Ok(Ruleset::new(rules))
}

struct Walker<'a> {
    tree: &'a dyn FittedClassifier,
    features: &'a [FeatureDescriptor],
    class_domain: &'a ClassDomain,
    domain_decode: &'a DomainDecode,
}

impl Walker<'_> {
    /// Iterative pre-order walk. Each stack entry carries the path length of
    /// its parent and the condition that leads into it.
    fn walk(&self) -> Result<Vec<Rule>> {
        let mut rules = Vec::new();
        let mut path: Vec<Antecedent> = Vec::new();
        let mut visited = vec![false; self.tree.node_count()];
        let mut stack: Vec<(usize, usize, Option<Antecedent>)> = vec![(0, 0, None)];

        while let Some((node, depth, condition)) = stack.pop() {
            path.truncate(depth);
            path.extend(condition);
            self.mark(node, &mut visited)?;
            let Some(tree_node) = self.tree.node(node) else {
                return Err(ExtractError::MalformedTree(format!("node {node} unreadable")));
            };

            match tree_node {
                TreeNode::Leaf { class_vote } => {
                    let consequent = if class_vote != 0.0 {
                        self.class_domain.get(0)
                    } else {
                        self.class_domain.get(1)
                    };
                    rules.push(Rule::new(path.clone(), consequent));
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let (on_left, on_right) = self.split_antecedents(feature, threshold)?;
                    // Right first so the left subtree is emitted first.
                    stack.push((right, path.len(), Some(on_right)));
                    stack.push((left, path.len(), Some(on_left)));
                }
            }
        }
        Ok(rules)
    }

    fn mark(&self, node: usize, visited: &mut [bool]) -> Result<()> {
        match visited.get_mut(node) {
            Some(seen) if !*seen => {
                *seen = true;
                Ok(())
            }
            Some(_) => Err(ExtractError::MalformedTree(format!(
                "node {node} is reachable twice"
            ))),
            None => Err(ExtractError::MalformedTree(format!(
                "child index {node} out of range ({} nodes)",
                self.tree.node_count()
            ))),
        }
    }

    fn split_antecedents(&self, feature: usize, threshold: f64) -> Result<(Antecedent, Antecedent)> {
        let descriptor = self.features.get(feature).ok_or_else(|| {
            ExtractError::MalformedTree(format!(
                "feature index {feature} out of range ({} features)",
                self.features.len()
            ))
        })?;
        let name = descriptor.name.as_str();
        match descriptor.kind {
            AttributeKind::Numeric => {
                let bound = format_float(threshold);
                Ok((
                    Antecedent::new(name, Operator::Le, bound.clone()),
                    Antecedent::new(name, Operator::Gt, bound),
                ))
            }
            AttributeKind::Categorical => {
                let domain = self.domain_decode.get(name).ok_or_else(|| {
                    ExtractError::UnsupportedAttribute {
                        name: name.to_string(),
                        kind: "non-binary categorical".to_string(),
                    }
                })?;
                Ok((
                    Antecedent::new(name, Operator::Eq, domain.value(0)),
                    Antecedent::new(name, Operator::Eq, domain.value(1)),
                ))
            }
            kind => Err(ExtractError::UnsupportedAttribute {
                name: name.to_string(),
                kind: kind.to_string(),
            }),
        }
    }
}
