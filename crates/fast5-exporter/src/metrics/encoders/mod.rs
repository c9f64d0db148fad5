use core::error::Error;

use error_stack::Report;

use super::Sample;
use super::SeriesSchema;

pub mod json;
pub mod prometheus;

#[derive(Debug, derive_more::Display)]
pub enum EncodeError {
    #[display("Invalid metric series {name}")]
    InvalidSeries { name: String },
    #[display("Sample for undeclared series {name}")]
    UndeclaredSeries { name: String },
    #[display("Failed to serialize metrics")]
    Serialization,
}

impl Error for EncodeError {}

/// Trait for rendering collected samples into an exposition format
pub trait MetricsEncoder: Send + Sync {
    /// Content type of the rendered document
    fn content_type(&self) -> &'static str;

    /// Encode `samples` against their declared `schemas`
    ///
    /// # Errors
    ///
    /// - [`EncodeError::UndeclaredSeries`] if a sample names no schema
    /// - [`EncodeError::InvalidSeries`] if a schema is rejected by the format
    /// - [`EncodeError::Serialization`] if the document cannot be written
    fn encode(
        &self,
        schemas: &[SeriesSchema],
        samples: &[Sample],
    ) -> Result<String, Report<EncodeError>>;
}

/// Factory function to create encoders based on format string
pub fn create_encoder(format: &str) -> Option<Box<dyn MetricsEncoder>> {
    match format.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonEncoder::new())),
        "prometheus" | "text" => Some(Box::new(prometheus::PrometheusEncoder::new())),
        _ => None,
    }
}
