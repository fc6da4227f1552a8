//! Raw table → ruleset.
//!
//! Strips the identifier column, conditions the data, resolves the class
//! domain, then hands the prepared training set to the learner and converts
//! whatever comes back into the canonical ruleset.

use anyhow::Result;
use tracing::{info, warn};

use crate::codec::{BinaryDomain, Codec, DomainDecode};
use crate::conditioner::{self, ClassDomain};
use crate::config::{Algorithm, ExtractConfig};
use crate::dataset::{AttributeKind, Column, Dataset, FeatureDescriptor, Value};
use crate::error::ExtractError;
use crate::extract::{self, Ruleset};
use crate::learner::{Learner, RuleListTrainingSet, TreeTrainingSet};

/// Run the whole extraction for one table snapshot.
pub fn extract_ruleset(
    raw: &Dataset,
    config: &ExtractConfig,
    learner: &dyn Learner,
) -> Result<Ruleset> {
    let dataset = if raw.position(&config.id_column).is_some() {
        raw.without_column(&config.id_column)
    } else {
        warn!(id_column = %config.id_column, "identifier column not found; using every column");
        raw.clone()
    };
    let class = class_attribute(&dataset, config.class_attribute.as_deref())?;
    info!(algorithm = %config.algorithm, %class, rows = dataset.row_count(), "starting extraction");

    let conditioned = conditioner::condition(&dataset, config.missing_threshold);
    let Some(class_column) = conditioned.column(&class) else {
        return Err(ExtractError::MissingAttribute(class).into());
    };
    let labelled: Vec<bool> = class_column.values.iter().map(|v| !v.is_missing()).collect();
    let prepared = conditioned.retain_rows(|r| labelled[r]);
    if prepared.row_count() == 0 {
        return Err(ExtractError::EmptyDataset {
            rows: 0,
            columns: prepared.column_count().saturating_sub(1),
        }
        .into());
    }

    let class_values = prepared
        .column(&class)
        .map(Column::distinct_values)
        .unwrap_or_default();
    let domain = ClassDomain::from_observed(&class, &class_values)?;
    info!(negative = domain.negative(), positive = domain.positive(), "class domain");

    let prepared = conditioner::drop_uninformative(&prepared, &class);
    let features: Vec<&Column> = prepared.columns.iter().filter(|c| c.name != class).collect();
    if features.is_empty() {
        return Err(ExtractError::EmptyDataset {
            rows: prepared.row_count(),
            columns: 0,
        }
        .into());
    }

    let ruleset = match config.algorithm {
        Algorithm::Cart => extract_tree(&prepared, &features, &class, &domain, config, learner)?,
        algorithm => {
            extract_rule_list(&prepared, &features, &class, &domain, algorithm, config, learner)?
        }
    };

    let accuracy = ruleset.accuracy(&prepared, &class).unwrap_or_default();
    info!(rules = ruleset.len(), accuracy, "ruleset extracted");
    Ok(ruleset)
}

/// Configured class attribute, or the last column.
pub fn class_attribute(dataset: &Dataset, configured: Option<&str>) -> Result<String, ExtractError> {
    match configured {
        Some(name) if dataset.position(name).is_some() => Ok(name.to_string()),
        Some(name) => Err(ExtractError::MissingAttribute(name.to_string())),
        None => dataset
            .columns
            .last()
            .map(|c| c.name.clone())
            .ok_or(ExtractError::EmptyDataset {
                rows: 0,
                columns: 0,
            }),
    }
}

/// Binary domain of a categorical feature; anything wider is unsupported.
fn binary_domain(column: &Column) -> Result<BinaryDomain, ExtractError> {
    match column.kind {
        AttributeKind::Categorical => conditioner::is_binary(column)
            .then(|| BinaryDomain::from_values(&column.distinct_values()))
            .flatten()
            .ok_or_else(|| ExtractError::UnsupportedAttribute {
                name: column.name.clone(),
                kind: "non-binary categorical".to_string(),
            }),
        kind => Err(ExtractError::UnsupportedAttribute {
            name: column.name.clone(),
            kind: kind.to_string(),
        }),
    }
}

fn extract_tree(
    prepared: &Dataset,
    features: &[&Column],
    class: &str,
    domain: &ClassDomain,
    config: &ExtractConfig,
    learner: &dyn Learner,
) -> Result<Ruleset> {
    let mut decode = DomainDecode::new();
    let mut descriptors = Vec::with_capacity(features.len());
    for column in features {
        if column.kind != AttributeKind::Numeric {
            decode.insert(column.name.clone(), binary_domain(column)?);
        }
        descriptors.push(FeatureDescriptor {
            name: column.name.clone(),
            kind: column.kind,
        });
    }

    let feature_names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
    let matrix = prepared.to_feature_matrix(&feature_names, |column, value| {
        decode
            .get(&column.name)
            .map(|d| f64::from(d.code_of(value.as_text().as_deref())))
            .ok_or_else(|| ExtractError::UnsupportedAttribute {
                name: column.name.clone(),
                kind: column.kind.to_string(),
            })
    })?;
    let target: Vec<bool> = prepared
        .column(class)
        .map(|c| {
            c.values
                .iter()
                .map(|v| v.as_text().as_deref() == Some(domain.positive()))
                .collect()
        })
        .unwrap_or_default();

    let training = TreeTrainingSet {
        feature_names,
        features: matrix,
        target,
    };
    let tree = learner.fit_tree(&training, &config.cart)?;
    Ok(extract::extract(tree.as_ref(), &descriptors, domain, &decode)?)
}

fn extract_rule_list(
    prepared: &Dataset,
    features: &[&Column],
    class: &str,
    domain: &ClassDomain,
    algorithm: Algorithm,
    config: &ExtractConfig,
    learner: &dyn Learner,
) -> Result<Ruleset> {
    let mut codec = Codec::new();
    codec.encode_attributes(&prepared.names());
    for column in features {
        if column.kind != AttributeKind::Numeric {
            let binary = binary_domain(column)?;
            codec.encode_domain(&column.name, binary);
        }
    }

    let mut columns = Vec::with_capacity(prepared.column_count());
    for column in &prepared.columns {
        let token = codec.encode(&column.name).unwrap_or(column.name.as_str()).to_string();
        let encoded = if column.name == class {
            let values = column
                .values
                .iter()
                .map(|v| v.as_text().map_or(Value::Missing, Value::Text))
                .collect();
            Column::new(token, AttributeKind::Categorical, values)
        } else if column.kind == AttributeKind::Numeric {
            Column::new(token, AttributeKind::Numeric, column.values.clone())
        } else {
            let values = column
                .values
                .iter()
                .map(|v| {
                    let cell = codec.encode_value(&column.name, v.as_text().as_deref());
                    cell.map_or(Value::Missing, |t| Value::Text(t.to_string()))
                })
                .collect();
            Column::new(token, AttributeKind::Categorical, values)
        };
        columns.push(encoded);
    }

    let training = RuleListTrainingSet {
        table: Dataset::new(columns),
        class_feature: codec.encode(class).unwrap_or(class).to_string(),
        positive_class: algorithm.fit_positive_class(domain).to_string(),
    };
    let model = learner.fit_rule_list(&training, algorithm, &config.rule_list)?;
    Ok(extract::normalize(
        &model.native_text(),
        &codec.attribute_decode(domain),
        &codec.domain_decode(),
        domain,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_attribute_defaults_to_last_column() {
        let ds = Dataset::new(vec![
            Column::inferred("x", vec![Value::Number(1.0)]),
            Column::inferred("label", vec![Value::Text("a".into())]),
        ]);
        assert_eq!(class_attribute(&ds, None).unwrap(), "label");
        assert_eq!(class_attribute(&ds, Some("x")).unwrap(), "x");
        assert!(class_attribute(&ds, Some("y")).unwrap_err().is_configuration());
        assert!(class_attribute(&Dataset::default(), None).is_err());
    }

    #[test]
    fn test_binary_domain_rejects_wide_categoricals() {
        let wide = Column::inferred(
            "grade",
            vec![Value::Text("a".into()), Value::Text("b".into()), Value::Text("c".into())],
        );
        let err = binary_domain(&wide).unwrap_err();
        assert!(err.to_string().contains("grade"));
        let pair = Column::inferred("flag", vec![Value::Text("y".into()), Value::Text("n".into())]);
        assert_eq!(binary_domain(&pair).unwrap(), BinaryDomain::new("y", "n"));
    }
}
