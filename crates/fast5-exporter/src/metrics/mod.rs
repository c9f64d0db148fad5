//! Metric vocabulary shared by the exporter and the encoders.

use std::collections::BTreeMap;

use serde::Serialize;

pub mod encoders;

pub const TOTAL_SIZE: &str = "fast5_total_size";
pub const AMOUNT_READS: &str = "fast5_amount_reads";
pub const MAX_RAW_DATA_LENGTH: &str = "fast5_max_raw_data_length";
pub const RAW_DATA_LENGTH: &str = "fast5_raw_data_length";
/// Constant `1` carrying the running build in its `version` label.
pub const BUILD_INFO: &str = "fast5_exporter_build_info";

/// Variable label carried by every per-channel series.
pub const CHANNEL_LABEL: &str = "channel";
pub const VERSION_LABEL: &str = "version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    #[display("gauge")]
    Gauge,
}

/// Declaration of one metric series, known before any value is collected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSchema {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    /// Labels whose value differs per sample, in declaration order.
    pub variable_labels: Vec<String>,
    /// Deployment labels attached to every sample of the series.
    pub const_labels: BTreeMap<String, String>,
}

impl SeriesSchema {
    pub fn gauge(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind: MetricKind::Gauge,
            variable_labels: Vec::new(),
            const_labels: BTreeMap::new(),
        }
    }

    pub fn with_variable_label(mut self, label: &str) -> Self {
        self.variable_labels.push(label.to_string());
        self
    }

    pub fn with_const_labels(mut self, labels: &BTreeMap<String, String>) -> Self {
        self.const_labels = labels.clone();
        self
    }
}

/// One collected value. `labels` holds the variable labels only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl Sample {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            labels: BTreeMap::new(),
            value,
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }
}

/// Whether `name` is usable as a label name: `[a-zA-Z_][a-zA-Z0-9_]*`, not
/// starting with the reserved `__` prefix.
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with("__")
}
