use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::reporting::projection::RateExclusions;

/// Settings for a reporting session. Every field has a default, so an empty
/// file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub expected_transaction_types: Vec<String>,
    /// Items hidden from the displayed item and transaction tables.
    pub report_exclusions: BTreeSet<String>,
    /// Log leaves dropped during flattening at warn instead of debug.
    pub warn_on_dropped_rows: bool,
    pub projection: RateExclusions,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            expected_transaction_types: vec!["Check".to_string(), "Expense".to_string(), "Deposit".to_string()],
            report_exclusions: BTreeSet::new(),
            warn_on_dropped_rows: false,
            projection: RateExclusions::default(),
        }
    }
}

impl ReportConfig {
    pub fn from_yaml(text: &str) -> Result<ReportConfig, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(ReportConfig::default());
        }

        serde_yaml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<ReportConfig> {
        let text = fs::read_to_string(path).with_context(|| format!("could not read config {}", path.display()))?;

        ReportConfig::from_yaml(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}
