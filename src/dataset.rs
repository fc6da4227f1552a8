//! In-memory tabular dataset.
//!
//! A dataset is an ordered list of equally long columns. Each column carries
//! its semantic kind, inferred once at load time from the stored values.

use std::fmt;

use ndarray::Array2;

use crate::error::{ExtractError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text form used for categorical comparison; numbers print as in the store.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Number(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Numeric,
    Categorical,
    /// Anything the store hands back that is neither a number nor text.
    Opaque,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Numeric => write!(f, "numeric"),
            AttributeKind::Categorical => write!(f, "categorical"),
            AttributeKind::Opaque => write!(f, "opaque"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: AttributeKind,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: AttributeKind, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Build a column and infer its kind: any text makes it categorical,
    /// all-numeric (or all-missing) columns are numeric.
    pub fn inferred(name: impl Into<String>, values: Vec<Value>) -> Self {
        let kind = if values.iter().any(|v| matches!(v, Value::Text(_))) {
            AttributeKind::Categorical
        } else {
            AttributeKind::Numeric
        };
        let values = match kind {
            AttributeKind::Categorical => values
                .into_iter()
                .map(|v| match v {
                    Value::Number(n) => Value::Text(n.to_string()),
                    other => other,
                })
                .collect(),
            _ => values,
        };
        Self::new(name, kind, values)
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Distinct non-missing values in encounter order.
    pub fn distinct_values(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for value in self.values.iter().filter_map(Value::as_text) {
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
        seen
    }
}

/// Name and semantic kind of a feature column, in the column order the
/// learner saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDescriptor {
    pub name: String,
    pub kind: AttributeKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Self {
        debug_assert!(
            columns
                .windows(2)
                .all(|w| w[0].values.len() == w[1].values.len()),
            "columns must have equal length"
        );
        Self { columns }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.row_count() == 0
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name).and_then(|c| c.values.get(row))
    }

    /// Copy of the dataset without the named column (unchanged if absent).
    pub fn without_column(&self, name: &str) -> Dataset {
        Dataset {
            columns: self
                .columns
                .iter()
                .filter(|c| c.name != name)
                .cloned()
                .collect(),
        }
    }

    /// Copy keeping only the rows for which `keep(row)` is true.
    pub fn retain_rows(&self, keep: impl Fn(usize) -> bool) -> Dataset {
        let rows: Vec<usize> = (0..self.row_count()).filter(|&r| keep(r)).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                values: rows.iter().map(|&r| c.values[r].clone()).collect(),
            })
            .collect();
        Dataset { columns }
    }

    /// Numeric matrix over the named columns. Numeric columns copy their
    /// values; categorical columns go through `encode`, which must return the
    /// numeric code for a cell.
    pub fn to_feature_matrix(
        &self,
        names: &[String],
        encode: impl Fn(&Column, &Value) -> Result<f64>,
    ) -> Result<Array2<f64>> {
        let columns = names
            .iter()
            .map(|n| {
                self.column(n)
                    .ok_or_else(|| ExtractError::MissingAttribute(n.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut matrix = Array2::<f64>::zeros((self.row_count(), columns.len()));
        for (j, column) in columns.iter().enumerate() {
            for (i, value) in column.values.iter().enumerate() {
                matrix[[i, j]] = match (column.kind, value) {
                    (AttributeKind::Numeric, Value::Number(n)) => *n,
                    (AttributeKind::Numeric, _) => f64::NAN,
                    (AttributeKind::Categorical, v) => encode(column, v)?,
                    (AttributeKind::Opaque, _) => {
                        return Err(ExtractError::UnsupportedAttribute {
                            name: column.name.clone(),
                            kind: column.kind.to_string(),
                        });
                    }
                };
            }
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_inferred_kinds() {
        let numeric = Column::inferred("a", vec![num(1.0), Value::Missing, num(2.5)]);
        assert_eq!(numeric.kind, AttributeKind::Numeric);

        let mixed = Column::inferred("b", vec![num(1.0), text("x")]);
        assert_eq!(mixed.kind, AttributeKind::Categorical);
        assert_eq!(mixed.values[0], text("1"));
    }

    #[test]
    fn test_distinct_values_keep_encounter_order() {
        let col = Column::inferred(
            "c",
            vec![text("paid"), Value::Missing, text("NO_default"), text("paid")],
        );
        assert_eq!(col.distinct_values(), vec!["paid", "NO_default"]);
        assert_eq!(col.missing_count(), 1);
    }

    #[test]
    fn test_retain_rows_and_without_column() {
        let ds = Dataset::new(vec![
            Column::inferred("a", vec![num(1.0), num(2.0), num(3.0)]),
            Column::inferred("b", vec![text("x"), text("y"), text("z")]),
        ]);
        let kept = ds.retain_rows(|r| r != 1);
        assert_eq!(kept.row_count(), 2);
        assert_eq!(kept.value(1, "b"), Some(&text("z")));
        assert_eq!(ds.row_count(), 3, "input is not mutated");

        let dropped = ds.without_column("a");
        assert_eq!(dropped.names(), vec!["b"]);
        assert!(Dataset::default().is_empty());
    }

    #[test]
    fn test_feature_matrix_encodes_categoricals() {
        let ds = Dataset::new(vec![
            Column::inferred("len", vec![num(4.9), num(6.1)]),
            Column::inferred("color", vec![text("red"), text("blue")]),
        ]);
        let names = vec!["len".to_string(), "color".to_string()];
        let matrix = ds
            .to_feature_matrix(&names, |_, v| {
                Ok(if v == &text("blue") { 1.0 } else { 0.0 })
            })
            .unwrap();
        assert_eq!(matrix.shape(), &[2, 2]);
        assert_eq!(matrix[[0, 0]], 4.9);
        assert_eq!(matrix[[1, 1]], 1.0);
    }

    #[test]
    fn test_feature_matrix_rejects_opaque() {
        let ds = Dataset::new(vec![Column::new(
            "blob",
            AttributeKind::Opaque,
            vec![Value::Missing],
        )]);
        let err = ds
            .to_feature_matrix(&["blob".to_string()], |_, _| Ok(0.0))
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
