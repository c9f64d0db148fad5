//! Boundary to the external statistics extractor.

use std::path::Path;

use async_trait::async_trait;
use error_stack::Report;

use super::error::ExtractionError;

/// Statistics of one read extracted from a data file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedStat {
    pub raw_data_length: i64,
    pub channel: String,
    pub provenance: Provenance,
}

/// Acquisition metadata reported alongside a read. Carried for diagnostics
/// only, never aggregated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    pub file_size: Option<u64>,
    pub digitisation: Option<f64>,
    pub offset: Option<f64>,
    pub range: Option<f64>,
    pub sampling_rate: Option<f64>,
}

impl ExtractedStat {
    pub fn new(channel: impl Into<String>, raw_data_length: i64) -> Self {
        Self {
            raw_data_length,
            channel: channel.into(),
            provenance: Provenance::default(),
        }
    }
}

/// Turns one data file into its per-read statistics.
///
/// Implementations must be a pure function of the file contents at call time.
/// Callers bound the latency with a timeout and drop the future when it
/// expires, so implementations must release their resources on drop.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// # Errors
    ///
    /// - [`ExtractionError`] if the file could not be turned into statistics
    async fn extract(&self, path: &Path) -> Result<Vec<ExtractedStat>, Report<ExtractionError>>;
}
