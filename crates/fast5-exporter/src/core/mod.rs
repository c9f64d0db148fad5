//! The incremental scan-and-aggregate engine.

pub mod aggregate;
pub mod error;
pub mod exporter;
pub mod extraction;
pub mod tracker;

pub use aggregate::AggregateStore;
pub use aggregate::ChannelAggregate;
pub use aggregate::MergeReport;
pub use error::CollectError;
pub use error::ExtractionError;
pub use error::MergeInvariantViolation;
pub use error::ScanError;
pub use exporter::ErrorCounts;
pub use exporter::ExporterConfig;
pub use exporter::Fast5Exporter;
pub use exporter::ScanReport;
pub use exporter::Snapshot;
pub use extraction::ExtractedStat;
pub use extraction::Extractor;
pub use extraction::Provenance;
pub use tracker::FileChange;
pub use tracker::FileStateTracker;
