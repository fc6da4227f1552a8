use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde_json::json;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::harness;
use super::{FittedClassifier, Learner, RuleListModel, RuleListTrainingSet, TreeArrays, TreeTrainingSet};
use crate::config::{Algorithm, CartParams, RuleListParams};
use crate::dataset::{Dataset, Value};

/// Overrides interpreter detection when set.
pub const PYTHON_ENV: &str = "RULE_EXTRACT_PYTHON";

/// Header of the target column in the tree training CSV.
const TARGET_COLUMN: &str = "__target__";

/// Detect the Python executable name available on this system.
/// Honors `RULE_EXTRACT_PYTHON`, then tries `python3`, then `python`.
pub fn detect_python() -> Result<String> {
    if let Ok(python) = std::env::var(PYTHON_ENV)
        && !python.trim().is_empty()
    {
        return Ok(python);
    }
    for candidate in &["python3", "python"] {
        if let Ok(output) = Command::new(candidate).arg("--version").output()
            && output.status.success()
        {
            return Ok(candidate.to_string());
        }
    }
    Err(anyhow!(
        "Python not found on PATH. Install Python 3 or set {PYTHON_ENV}."
    ))
}

/// Learner backed by scikit-learn (CART) and wittgenstein (RIPPERk, IREP),
/// each fit in a short-lived Python child process.
#[derive(Debug, Clone)]
pub struct PythonLearner {
    python: String,
}

impl PythonLearner {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    pub fn detect() -> Result<Self> {
        detect_python().map(Self::new)
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    /// Check that the harness imports resolve. Warns (does not error); the
    /// fit itself reports the real failure.
    pub fn check_modules(&self, algorithm: Algorithm) -> bool {
        let modules = harness::required_modules(algorithm);
        let script = format!("import {}", modules.join(", "));
        match Command::new(&self.python).args(["-c", &script]).output() {
            Ok(out) if out.status.success() => {
                info!(python = %self.python, modules = ?modules, "learner modules available");
                true
            }
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                warn!(python = %self.python, err = %stderr.trim(), "learner modules missing");
                false
            }
            Err(e) => {
                warn!(python = %self.python, err = %e, "could not run module check");
                false
            }
        }
    }

    /// Run `script` against the request and the CSV written by `write_train`,
    /// all placed in a temp dir that lives for the duration of the call.
    fn run<T: DeserializeOwned>(
        &self,
        script: &str,
        request: &serde_json::Value,
        write_train: impl FnOnce(&Path) -> Result<()>,
    ) -> Result<T> {
        let tmpdir = TempDir::new().context("failed to create temp dir for learner")?;
        let script_path = tmpdir.path().join("harness.py");
        let request_path = tmpdir.path().join("request.json");
        let train_path = tmpdir.path().join("train.csv");

        fs::write(&script_path, script).context("failed to write learner harness")?;
        fs::write(&request_path, serde_json::to_vec_pretty(request)?)
            .context("failed to write learner request")?;
        write_train(&train_path)?;

        debug!(python = %self.python, dir = %tmpdir.path().display(), "running learner");
        let output = Command::new(&self.python)
            .arg(&script_path)
            .arg(&request_path)
            .arg(&train_path)
            .output()
            .with_context(|| format!("failed to run {} for fitting", self.python))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("learner failed: {}", stderr.trim());
            return Err(anyhow!("learner failed: {}", stderr.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let payload = stdout
            .lines()
            .rev()
            .find(|l| l.trim_start().starts_with('{'))
            .ok_or_else(|| anyhow!("learner printed no JSON result"))?;
        serde_json::from_str(payload).context("failed to parse learner output")
    }
}

impl Learner for PythonLearner {
    fn fit_tree(
        &self,
        training: &TreeTrainingSet,
        params: &CartParams,
    ) -> Result<Box<dyn FittedClassifier>> {
        let params =
            serde_json::to_value(params).context("failed to serialize tree parameters")?;
        let request = json!({
            "algorithm": Algorithm::Cart.to_string(),
            "params": params,
        });
        let tree: TreeArrays = self.run(&harness::render_tree_harness(), &request, |path| {
            write_tree_csv(path, training)
        })?;
        info!(nodes = tree.children_left.len(), "decision tree fitted");
        Ok(Box::new(tree))
    }

    fn fit_rule_list(
        &self,
        training: &RuleListTrainingSet,
        algorithm: Algorithm,
        params: &RuleListParams,
    ) -> Result<RuleListModel> {
        let kwargs = params
            .learner_kwargs(algorithm)
            .context("failed to serialize rule-list parameters")?;
        let request = json!({
            "algorithm": algorithm.to_string(),
            "params": kwargs,
            "class_feature": training.class_feature,
            "positive_class": training.positive_class,
        });
        let model: RuleListModel = self.run(
            &harness::render_rule_list_harness(algorithm),
            &request,
            |path| write_table_csv(path, &training.table),
        )?;
        info!(rules = model.rules.len(), %algorithm, "rule list induced");
        Ok(model)
    }
}

/// Feature columns followed by the 0/1 target.
pub fn write_tree_csv(path: &Path, training: &TreeTrainingSet) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut header = training.feature_names.clone();
    header.push(TARGET_COLUMN.to_string());
    wtr.write_record(&header)?;
    for (row, &target) in training.features.rows().into_iter().zip(&training.target) {
        let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        record.push(u8::from(target).to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// The table as is; missing cells are left empty.
pub fn write_table_csv(path: &Path, table: &Dataset) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    wtr.write_record(table.names())?;
    for row in 0..table.row_count() {
        let record = table.columns.iter().map(|c| match &c.values[row] {
            Value::Missing => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
        });
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(())
}
