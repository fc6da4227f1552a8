//! Induced rule list → ruleset.
//!
//! Each native line goes through three rewrites: token substitution
//! (attribute/structural table, then domain table), range splitting, and a
//! cosmetic operator fix. The result is parsed back into [`Rule`]s so the
//! printed block always comes from one renderer.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::codec::DecodeTable;
use crate::conditioner::ClassDomain;
use crate::error::{ExtractError, Result};

use super::{IMPLICATION, Rule, Ruleset};

/// `(attr = low-high)` opening a line or following `AND `; the attribute may
/// hold parentheses but no `=`, and the right bound is the number right
/// before `)`.
static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|AND )\(([^=]*)=\s(-?\d+\.?\d*)-(-?\d+\.?\d*)\)")
        .expect("Invalid range regex")
});

/// Rewrite the native rule-list text into a ruleset: every induced rule
/// predicts the positive class, and a trailing default rule predicts the
/// negative one.
pub fn normalize(
    raw: &str,
    attribute_decode: &DecodeTable,
    domain_decode: &DecodeTable,
    class_domain: &ClassDomain,
) -> Result<Ruleset> {
    if !class_domain.is_distinct() {
        return Err(ExtractError::ClassDomain {
            attribute: "class".to_string(),
            found: 1,
        });
    }

    let body = raw.trim();
    let mut rules = Vec::new();
    // An empty list yields only the default rule, not a `() => <positive>`
    // rule ahead of it.
    if !body.is_empty() && body != "[]" {
        let terminal = format!("{IMPLICATION}{}", class_domain.positive());
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let rewritten = rewrite_line(line, attribute_decode, domain_decode);
            let antecedents = rewritten
                .strip_suffix(terminal.as_str())
                .unwrap_or(rewritten.as_str());
            debug!(native = line, canonical = %rewritten, "rule rewritten");
            rules.push(Rule::new(
                Rule::parse_antecedents(antecedents)?,
                class_domain.positive(),
            ));
        }
    }

    Ok(Ruleset::new(rules).with_default(class_domain.negative()))
}

/// Rewrite one native line into canonical form. Canonical input comes back
/// unchanged.
pub fn rewrite_line(line: &str, attribute_decode: &DecodeTable, domain_decode: &DecodeTable) -> String {
    let decoded = domain_decode.apply(&attribute_decode.apply(line.trim()));
    split_ranges(&decoded)
        .replace("< =", "<=")
        .replace("> =", ">=")
}

/// `(age = -5.0-10.0)` → `(age >= -5.0) AND (age <= 10.0)`.
pub fn split_ranges(text: &str) -> String {
    RANGE
        .replace_all(text, |caps: &Captures| {
            let attribute = caps[2].trim();
            format!(
                "{}({attribute} >= {}) AND ({attribute} <= {})",
                &caps[1], &caps[3], &caps[4]
            )
        })
        .into_owned()
}
