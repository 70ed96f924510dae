//! Analytics reports.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A report payload.
///
/// Report shapes differ per report and change often, so the fields are kept
/// as a JSON object with typed accessors for the common counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    pub fields: Map<String, Value>,
}

impl Report {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Integer field, if present and numeric.
    pub fn count(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }
}

/// Bucket size of the analysis report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisInterval {
    Daily,
    Weekly,
    Monthly,
}

impl AnalysisInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisInterval::Daily => "daily",
            AnalysisInterval::Weekly => "weekly",
            AnalysisInterval::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for AnalysisInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
