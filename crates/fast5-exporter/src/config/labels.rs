use std::collections::BTreeMap;

use error_stack::bail;
use error_stack::Report;

use super::ConfigError;
use crate::metrics::is_valid_label_name;
use crate::metrics::CHANNEL_LABEL;

/// Parses static labels given as `key=value` pairs separated by commas.
///
/// Empty segments are skipped and a repeated key keeps its last value.
///
/// # Errors
///
/// - [`ConfigError::InvalidLabel`] for a segment without `=`, with an empty or
///   malformed key, or using the reserved `channel` key
pub fn parse_labels(spec: &str) -> Result<BTreeMap<String, String>, Report<ConfigError>> {
    let mut labels = BTreeMap::new();

    for segment in spec.split(',').map(str::trim) {
        if segment.is_empty() {
            continue;
        }
        let invalid = |reason: &str| ConfigError::InvalidLabel {
            segment: segment.to_string(),
            reason: reason.to_string(),
        };

        let Some((key, value)) = segment.split_once('=') else {
            bail!(invalid("expected key=value"));
        };
        let key = key.trim();
        if key.is_empty() {
            bail!(invalid("empty key"));
        }
        if !is_valid_label_name(key) {
            bail!(invalid("key is not a valid label name"));
        }
        if key == CHANNEL_LABEL {
            bail!(invalid("key is reserved"));
        }

        labels.insert(key.to_string(), value.trim().to_string());
    }

    Ok(labels)
}
