//! Ruleset model and the canonical rule grammar.
//!
//! # Submodules
//! - [`tree`]: one rule per leaf of a fitted decision tree
//! - [`rule_list`]: rewrite of an induced rule list's native text
//!
//! Canonical rule line: `(a <= 1.0) AND (b = x) => class`; a rule without
//! antecedents renders as `() => class`. The block handed to the consumer is
//! produced by the [`Ruleset`] `Display` impl.

pub mod rule_list;
pub mod tree;

use std::fmt;

use crate::dataset::{Dataset, Value};
use crate::error::{ExtractError, Result};

pub use rule_list::normalize;
pub use tree::extract;

/// Header line of the emitted block.
pub const MODEL_HEADER: &str = "extracted_rule_based_model: [";

const CONJUNCTION: &str = " AND ";
const IMPLICATION: &str = " => ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Le,
    Ge,
    Gt,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Gt => ">",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Antecedent {
    pub attribute: String,
    pub operator: Operator,
    pub value: String,
}

impl Antecedent {
    pub fn new(attribute: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    /// Parse one condition body such as `age >= 5.0` (no parentheses). The
    /// earliest space-delimited operator splits attribute from value.
    pub fn parse(condition: &str) -> Option<Self> {
        const OPERATORS: [(&str, Operator); 4] = [
            (" <= ", Operator::Le),
            (" >= ", Operator::Ge),
            (" > ", Operator::Gt),
            (" = ", Operator::Eq),
        ];
        let (at, token, operator) = OPERATORS
            .iter()
            .filter_map(|&(token, op)| condition.find(token).map(|at| (at, token, op)))
            .min_by_key(|(at, _, _)| *at)?;
        Some(Self::new(
            &condition[..at],
            operator,
            &condition[at + token.len()..],
        ))
    }

    /// Whether `value` satisfies this condition. Numeric operators compare as
    /// numbers; equality compares text, or numbers against a bin label such as
    /// `<5.1` / `>=7`.
    pub fn holds(&self, value: &Value) -> bool {
        let number = match value {
            Value::Missing => return false,
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        };
        let bound = self.value.parse::<f64>().ok();
        match (self.operator, number, bound) {
            (Operator::Le, Some(x), Some(b)) => x <= b,
            (Operator::Ge, Some(x), Some(b)) => x >= b,
            (Operator::Gt, Some(x), Some(b)) => x > b,
            (Operator::Eq, Some(x), Some(b)) => x == b,
            (Operator::Eq, Some(x), None) => holds_bin(&self.value, x),
            (Operator::Eq, None, _) => value.as_text().as_deref() == Some(self.value.as_str()),
            _ => false,
        }
    }
}

fn holds_bin(label: &str, x: f64) -> bool {
    let parse = |s: &str| s.parse::<f64>().ok();
    if let Some(b) = label.strip_prefix("<=").and_then(parse) {
        x <= b
    } else if let Some(b) = label.strip_prefix(">=").and_then(parse) {
        x >= b
    } else if let Some(b) = label.strip_prefix('<').and_then(parse) {
        x < b
    } else if let Some(b) = label.strip_prefix('>').and_then(parse) {
        x > b
    } else {
        false
    }
}

impl fmt::Display for Antecedent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.attribute, self.operator, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub antecedents: Vec<Antecedent>,
    pub consequent: String,
}

impl Rule {
    pub fn new(antecedents: Vec<Antecedent>, consequent: impl Into<String>) -> Self {
        Self {
            antecedents,
            consequent: consequent.into(),
        }
    }

    /// Parse the antecedent half of a canonical line: `()` or
    /// `(a = b) AND (c >= 1)`.
    pub fn parse_antecedents(text: &str) -> Result<Vec<Antecedent>> {
        let malformed = |reason: &str| ExtractError::MalformedRule {
            line: text.to_string(),
            reason: reason.to_string(),
        };
        let body = text
            .trim()
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(|| malformed("antecedents must be parenthesized"))?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        body.split(") AND (")
            .map(|cond| Antecedent::parse(cond).ok_or_else(|| malformed("condition has no operator")))
            .collect()
    }

    /// True when every antecedent holds for `row` of `dataset`.
    pub fn covers(&self, dataset: &Dataset, row: usize) -> bool {
        self.antecedents.iter().all(|a| {
            dataset
                .value(row, &a.attribute)
                .is_some_and(|v| a.holds(v))
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.antecedents.is_empty() {
            f.write_str("()")?;
        }
        for (i, antecedent) in self.antecedents.iter().enumerate() {
            if i > 0 {
                f.write_str(CONJUNCTION)?;
            }
            write!(f, "{antecedent}")?;
        }
        write!(f, "{IMPLICATION}{}", self.consequent)
    }
}

/// Ordered rules plus an optional default consequent (the `()` rule).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ruleset {
    pub rules: Vec<Rule>,
    pub default_consequent: Option<String>,
}

impl Ruleset {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            default_consequent: None,
        }
    }

    pub fn with_default(mut self, consequent: impl Into<String>) -> Self {
        self.default_consequent = Some(consequent.into());
        self
    }

    /// Number of emitted rule lines, default rule included.
    pub fn len(&self) -> usize {
        self.rules.len() + usize::from(self.default_consequent.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consequent of the first rule covering `row`, else the default.
    pub fn predict(&self, dataset: &Dataset, row: usize) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.covers(dataset, row))
            .map(|r| r.consequent.as_str())
            .or(self.default_consequent.as_deref())
    }

    /// Share of rows whose `class_attribute` value matches the prediction.
    pub fn accuracy(&self, dataset: &Dataset, class_attribute: &str) -> Option<f64> {
        let rows = dataset.row_count();
        if rows == 0 {
            return None;
        }
        let hits = (0..rows)
            .filter(|&r| {
                let actual = dataset.value(r, class_attribute).and_then(Value::as_text);
                actual.is_some() && self.predict(dataset, r) == actual.as_deref()
            })
            .count();
        Some(hits as f64 / rows as f64)
    }
}

impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{MODEL_HEADER}")?;
        writeln!(f)?;
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        if let Some(default) = &self.default_consequent {
            writeln!(f, "(){IMPLICATION}{default}")?;
        }
        writeln!(f)?;
        f.write_str("]")
    }
}

/// Render a double the way the learner's host language prints it: shortest
/// round-trip digits, `.0` on integral values, exponent form outside
/// `[1e-4, 1e16)`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => formatted,
        };
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
