//! Python harness scripts run by [`super::python::PythonLearner`].
//!
//! Both scripts take `request.json` and `train.csv` as arguments and print a
//! single JSON object on stdout. Unset (`null`) hyperparameters are dropped so
//! the library applies its own defaults.

use crate::config::Algorithm;

/// Python modules each harness imports.
pub fn required_modules(algorithm: Algorithm) -> &'static [&'static str] {
    if algorithm.is_rule_list() {
        &["pandas", "wittgenstein"]
    } else {
        &["numpy", "sklearn"]
    }
}

/// Fits a scikit-learn `DecisionTreeClassifier` on a numeric CSV whose last
/// column is the 0/1 target, and prints the tree's parallel arrays.
pub fn render_tree_harness() -> String {
    format!(
        r#"import json, sys
import numpy as np
from sklearn.tree import DecisionTreeClassifier

{load_request}
data = np.loadtxt(sys.argv[2], delimiter=",", skiprows=1, ndmin=2)
X, y = data[:, :-1], data[:, -1].astype(int)
clf = DecisionTreeClassifier(**params)
clf.fit(X, y)
t = clf.tree_
print(json.dumps({{
    "children_left": t.children_left.tolist(),
    "children_right": t.children_right.tolist(),
    "feature": t.feature.tolist(),
    "threshold": t.threshold.tolist(),
    "value": [v[0].tolist() for v in t.value],
}}))
"#,
        load_request = LOAD_REQUEST
    )
}

/// Fits a wittgenstein rule inducer and prints its rules without spaces
/// except around the conjunction marker.
pub fn render_rule_list_harness(algorithm: Algorithm) -> String {
    let estimator = match algorithm {
        Algorithm::Irep => "IREP",
        _ => "RIPPER",
    };
    format!(
        r#"import json, sys
import pandas as pd
import wittgenstein as lw

{load_request}
class_feature = request["class_feature"]
frame = pd.read_csv(sys.argv[2], dtype={{class_feature: str}})
clf = lw.{estimator}(**params)
clf.fit(frame, class_feat=class_feature, pos_class=request["positive_class"])
rules = [str(r).replace(" ", "").replace("^", " ^ ") for r in clf.ruleset_.rules]
print(json.dumps({{"rules": rules}}))
"#,
        load_request = LOAD_REQUEST
    )
}

const LOAD_REQUEST: &str = r#"with open(sys.argv[1]) as fh:
    request = json.load(fh)
params = {k: v for k, v in request["params"].items() if v is not None}"#;
