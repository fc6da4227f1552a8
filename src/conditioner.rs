//! Missing-value conditioning and class-domain resolution.
//!
//! Column pruning runs before row pruning so that a sparse numeric column is
//! dropped instead of taking otherwise complete rows down with it.

use tracing::info;

use crate::dataset::{AttributeKind, Column, Dataset};
use crate::error::{ExtractError, Result};

/// Class values carrying this prefix always take the negative slot.
pub const NEGATIVE_PREFIX: &str = "NO_";

/// Drop columns with too many missing values, then drop every row that is
/// missing a value in a remaining numeric column.
///
/// A column survives when its non-missing count reaches
/// `ceil((1 - max_missing_fraction) * rows)`.
pub fn condition(dataset: &Dataset, max_missing_fraction: f64) -> Dataset {
    let rows = dataset.row_count();
    let required = ((1.0 - max_missing_fraction) * rows as f64).ceil() as usize;
    info!(
        max_missing = rows.saturating_sub(required),
        "removing columns with too many missing values"
    );

    let mut kept = Vec::with_capacity(dataset.column_count());
    let mut removed = 0usize;
    for column in &dataset.columns {
        let present = rows - column.missing_count();
        if present < required {
            info!(column = %column.name, missing = column.missing_count(), "column removed");
            removed += 1;
        } else {
            kept.push(column.clone());
        }
    }
    info!(removed, kept = kept.len(), "column pruning done");

    let mut cleaned = Dataset::new(kept);
    let numeric: Vec<String> = cleaned
        .columns
        .iter()
        .filter(|c| c.kind == AttributeKind::Numeric)
        .map(|c| c.name.clone())
        .collect();
    for name in numeric {
        let Some(column) = cleaned.column(&name) else {
            continue;
        };
        let missing = column.missing_count();
        if missing == 0 {
            continue;
        }
        let mask: Vec<bool> = column.values.iter().map(|v| !v.is_missing()).collect();
        cleaned = cleaned.retain_rows(|r| mask[r]);
        info!(column = %name, rows = missing, "rows removed, missing value in numeric attribute");
    }

    cleaned
}

/// True when the column holds at most two distinct values. A constant column
/// counts as binary.
pub fn is_binary(column: &Column) -> bool {
    column.distinct_values().len() <= 2
}

/// Drop every attribute except `keep` that has fewer than two distinct
/// observed values.
pub fn drop_uninformative(dataset: &Dataset, keep: &str) -> Dataset {
    let columns = dataset
        .columns
        .iter()
        .filter(|c| {
            let informative = c.name == keep || c.distinct_values().len() >= 2;
            if !informative {
                info!(column = %c.name, "column removed, fewer than two distinct values");
            }
            informative
        })
        .cloned()
        .collect();
    Dataset::new(columns)
}

/// The two class values, ordered (negative, positive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDomain {
    negative: String,
    positive: String,
}

impl ClassDomain {
    pub fn new(negative: impl Into<String>, positive: impl Into<String>) -> Self {
        Self {
            negative: negative.into(),
            positive: positive.into(),
        }
    }

    /// Build the domain from values in encounter order. The first value is
    /// negative unless the second carries [`NEGATIVE_PREFIX`] and the first
    /// does not.
    pub fn from_observed(attribute: &str, values: &[String]) -> Result<Self> {
        let [first, second] = values else {
            return Err(ExtractError::ClassDomain {
                attribute: attribute.to_string(),
                found: values.len(),
            });
        };
        if second.starts_with(NEGATIVE_PREFIX) && !first.starts_with(NEGATIVE_PREFIX) {
            Ok(Self::new(second.clone(), first.clone()))
        } else {
            Ok(Self::new(first.clone(), second.clone()))
        }
    }

    pub fn negative(&self) -> &str {
        &self.negative
    }

    pub fn positive(&self) -> &str {
        &self.positive
    }

    pub fn is_distinct(&self) -> bool {
        self.negative != self.positive
    }

    /// Value by slot: 0 is negative, 1 is positive.
    pub fn get(&self, slot: usize) -> &str {
        if slot == 0 {
            &self.negative
        } else {
            &self.positive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn sample() -> Dataset {
        // 10 rows; `sparse` is 30% missing, `gappy` 10%, `label` categorical 10%.
        let mut sparse = vec![num(1.0); 10];
        for v in sparse.iter_mut().take(3) {
            *v = Value::Missing;
        }
        let mut gappy: Vec<Value> = (0..10).map(|i| num(i as f64)).collect();
        gappy[9] = Value::Missing;
        let mut label = vec![text("a"); 10];
        label[4] = Value::Missing;
        Dataset::new(vec![
            Column::inferred("sparse", sparse),
            Column::inferred("gappy", gappy),
            Column::inferred("label", label),
        ])
    }

    #[test]
    fn test_condition_prunes_columns_before_rows() {
        let cleaned = condition(&sample(), 0.1);
        assert_eq!(cleaned.names(), vec!["gappy", "label"]);
        // Only the row missing `gappy` goes; `sparse` did not take 3 rows with it.
        assert_eq!(cleaned.row_count(), 9);
        // Categorical gaps are tolerated.
        assert_eq!(cleaned.column("label").unwrap().missing_count(), 1);
    }

    #[test]
    fn test_condition_invariants() {
        let ds = sample();
        for th in [0.0, 0.1, 0.3, 0.5, 1.0] {
            let cleaned = condition(&ds, th);
            let required = ((1.0 - th) * ds.row_count() as f64).ceil() as usize;
            for column in &ds.columns {
                if let Some(kept) = cleaned.column(&column.name) {
                    assert!(ds.row_count() - column.missing_count() >= required);
                    if kept.kind == AttributeKind::Numeric {
                        assert_eq!(kept.missing_count(), 0, "th={th}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_condition_can_empty_the_dataset() {
        let ds = Dataset::new(vec![Column::inferred(
            "x",
            vec![Value::Missing, Value::Missing],
        )]);
        let cleaned = condition(&ds, 0.1);
        assert_eq!(cleaned.column_count(), 0);
        assert!(cleaned.is_empty());

        // With th = 1 the column stays and every row is dropped.
        let cleaned = condition(&ds, 1.0);
        assert_eq!(cleaned.column_count(), 1);
        assert_eq!(cleaned.row_count(), 0);
    }

    #[test]
    fn test_is_binary() {
        assert!(is_binary(&Column::inferred("c", vec![text("a"), text("a")])));
        assert!(is_binary(&Column::inferred("c", vec![text("a"), text("b")])));
        assert!(!is_binary(&Column::inferred(
            "c",
            vec![text("a"), text("b"), text("c")]
        )));
    }

    #[test]
    fn test_drop_uninformative_keeps_class() {
        let ds = Dataset::new(vec![
            Column::inferred("const", vec![text("a"), text("a")]),
            Column::inferred("x", vec![num(1.0), num(2.0)]),
            Column::inferred("class", vec![text("yes"), text("yes")]),
        ]);
        assert_eq!(drop_uninformative(&ds, "class").names(), vec!["x", "class"]);
    }

    #[test]
    fn test_class_domain_negative_prefix_wins() {
        let domain =
            ClassDomain::from_observed("loan", &["paid".into(), "NO_default".into()]).unwrap();
        assert_eq!(domain.negative(), "NO_default");
        assert_eq!(domain.positive(), "paid");

        let domain =
            ClassDomain::from_observed("loan", &["NO_default".into(), "paid".into()]).unwrap();
        assert_eq!(domain.negative(), "NO_default");
        assert_eq!(domain.positive(), "paid");
    }

    #[test]
    fn test_class_domain_keeps_encounter_order_without_prefix() {
        let domain =
            ClassDomain::from_observed("species", &["setosa".into(), "versicolor".into()])
                .unwrap();
        assert_eq!(domain.get(0), "setosa");
        assert_eq!(domain.get(1), "versicolor");
    }

    #[test]
    fn test_class_domain_needs_two_values() {
        let err = ClassDomain::from_observed("class", &["only".into()]).unwrap_err();
        assert!(err.is_configuration());
        assert!(
            ClassDomain::from_observed("class", &["a".into(), "b".into(), "c".into()]).is_err()
        );
    }
}
