use core::error::Error;
use std::path::PathBuf;

/// Failures while enumerating the watched directory.
#[derive(Debug, Clone, derive_more::Display)]
pub enum ScanError {
    #[display("Watched root {} is unavailable: {message}", path.display())]
    RootUnavailable { path: PathBuf, message: String },
    #[display("Failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl Error for ScanError {}

/// Failures of the external statistics extractor for a single file.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ExtractionError {
    #[display("Failed to start extractor: {message}")]
    Spawn { message: String },
    #[display("Extractor exited with {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },
    #[display("Malformed extractor output: {message}")]
    MalformedOutput { message: String },
    #[display("Extraction timed out after {millis}ms")]
    Timeout { millis: u64 },
    #[display("Extractor panicked: {message}")]
    Panicked { message: String },
}

impl Error for ExtractionError {}

/// A record rejected by the aggregate store instead of being merged.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MergeInvariantViolation {
    #[display("Negative raw data length {length} for channel {channel}")]
    NegativeLength { channel: String, length: i64 },
    #[display("Counter overflow for channel {channel}")]
    Overflow { channel: String },
}

impl Error for MergeInvariantViolation {}

/// Failure of a collect call as a whole.
#[derive(Debug, Clone, derive_more::Display)]
pub enum CollectError {
    #[display("Scan pass aborted: {message}")]
    PassAborted { message: String },
}

impl Error for CollectError {}
