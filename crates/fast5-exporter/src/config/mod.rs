use core::error::Error;

pub mod cli;
pub mod exporter;
pub mod labels;

pub use cli::*;
pub use exporter::*;
pub use labels::parse_labels;

/// Invalid startup configuration.
#[derive(Debug, derive_more::Display)]
pub enum ConfigError {
    #[display("Invalid label `{segment}`: {reason}")]
    InvalidLabel { segment: String, reason: String },
    #[display("Unknown metrics format `{format}`, expected `prometheus` or `json`")]
    UnknownMetricsFormat { format: String },
    #[display("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
    #[display("Watched root is unusable")]
    WatchedRoot,
}

impl Error for ConfigError {}
