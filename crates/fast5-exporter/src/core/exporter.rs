//! Scan passes and the two-phase collector surface.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use error_stack::Report;
use futures::stream;
use futures::FutureExt;
use futures::StreamExt;
use serde::Serialize;
use tokio::time::Instant;
use utils::version;

use super::aggregate::AggregateStore;
use super::aggregate::ChannelAggregate;
use super::aggregate::MergeReport;
use super::error::CollectError;
use super::error::ExtractionError;
use super::extraction::Extractor;
use super::tracker::FileChange;
use super::tracker::FileStateTracker;
use super::tracker::ScanOutcome;
use crate::metrics::Sample;
use crate::metrics::SeriesSchema;
use crate::metrics::AMOUNT_READS;
use crate::metrics::BUILD_INFO;
use crate::metrics::CHANNEL_LABEL;
use crate::metrics::MAX_RAW_DATA_LENGTH;
use crate::metrics::RAW_DATA_LENGTH;
use crate::metrics::TOTAL_SIZE;
use crate::metrics::VERSION_LABEL;
use crate::util::panic_message;
use crate::util::SingleFlight;

#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Directory watched for data files, walked recursively.
    pub root: PathBuf,
    pub extension: String,
    /// Static deployment labels attached to every series.
    pub labels: BTreeMap<String, String>,
    /// Upper bound for a single extractor invocation.
    pub extraction_timeout: Duration,
    /// Upper bound for a whole pass; unreached files are retried next pass.
    pub scan_timeout: Duration,
    pub extraction_workers: usize,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/tmp/fast5"),
            extension: ".fast5".to_string(),
            labels: BTreeMap::new(),
            extraction_timeout: Duration::from_secs(60),
            scan_timeout: Duration::from_secs(300),
            extraction_workers: 4,
        }
    }
}

/// Summary of one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub files_seen: usize,
    pub changed: usize,
    pub extracted: usize,
    pub failed: usize,
    /// Changes rolled back because the pass ran out of time.
    pub deferred: usize,
    pub scan_errors: usize,
    pub records_merged: usize,
    pub records_dropped: usize,
    pub duration: Duration,
}

/// State of the aggregates as of the end of one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Increases by one with every completed pass.
    pub generation: u64,
    pub total_size: u64,
    pub channels: Vec<ChannelAggregate>,
    pub report: ScanReport,
}

/// Cumulative failure counts since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ErrorCounts {
    pub scan_errors: u64,
    pub extraction_failures: u64,
    pub dropped_records: u64,
}

#[derive(Debug, Default)]
struct ErrorCounters {
    scan_errors: AtomicU64,
    extraction_failures: AtomicU64,
    dropped_records: AtomicU64,
}

impl ErrorCounters {
    fn record(&self, report: &ScanReport) {
        self.scan_errors
            .fetch_add(report.scan_errors as u64, Ordering::Relaxed);
        self.extraction_failures
            .fetch_add(report.failed as u64, Ordering::Relaxed);
        self.dropped_records
            .fetch_add(report.records_dropped as u64, Ordering::Relaxed);
    }

    fn counts(&self) -> ErrorCounts {
        ErrorCounts {
            scan_errors: self.scan_errors.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            dropped_records: self.dropped_records.load(Ordering::Relaxed),
        }
    }
}

enum FileOutcome {
    Merged(MergeReport),
    Failed,
    Deferred,
}

struct Engine {
    config: ExporterConfig,
    tracker: FileStateTracker,
    store: AggregateStore,
    extractor: Arc<dyn Extractor>,
    generation: AtomicU64,
    errors: ErrorCounters,
}

impl Engine {
    async fn pass(self: Arc<Self>) -> Arc<Snapshot> {
        let started = Instant::now();
        let deadline = started + self.config.scan_timeout;

        let engine = self.clone();
        let outcome =
            match tokio::task::spawn_blocking(move || engine.tracker.scan(&engine.config.root))
                .await
            {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    tracing::warn!(error = %e, "directory scan was cancelled");
                    ScanOutcome::default()
                }
            };

        let mut report = ScanReport {
            files_seen: outcome.files_seen,
            changed: outcome.changes.len(),
            scan_errors: outcome.errors.len(),
            ..Default::default()
        };

        let outcomes: Vec<FileOutcome> = stream::iter(outcome.changes)
            .map(|change| self.process_isolated(change, deadline))
            .buffer_unordered(self.config.extraction_workers.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                FileOutcome::Merged(merge) => {
                    report.extracted += 1;
                    report.records_merged += merge.merged;
                    report.records_dropped += merge.dropped;
                }
                FileOutcome::Failed => report.failed += 1,
                FileOutcome::Deferred => report.deferred += 1,
            }
        }
        report.duration = started.elapsed();
        self.errors.record(&report);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            generation,
            files_seen = report.files_seen,
            changed = report.changed,
            extracted = report.extracted,
            failed = report.failed,
            deferred = report.deferred,
            records_merged = report.records_merged,
            records_dropped = report.records_dropped,
            duration_ms = report.duration.as_millis() as u64,
            "scan pass finished"
        );

        Arc::new(Snapshot {
            generation,
            total_size: self.tracker.total_size(),
            channels: self.store.snapshot(),
            report,
        })
    }

    /// Like [`process`](Self::process), but a panicking extractor fails only
    /// its own file. The file keeps its new size.
    async fn process_isolated(&self, change: FileChange, deadline: Instant) -> FileOutcome {
        let path = change.path.display().to_string();
        match AssertUnwindSafe(self.process(change, deadline))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                let error = ExtractionError::Panicked {
                    message: panic_message(payload.as_ref()),
                };
                tracing::error!(%path, error = %error, "extraction failed");
                FileOutcome::Failed
            }
        }
    }

    async fn process(&self, change: FileChange, deadline: Instant) -> FileOutcome {
        let path = change.path.display().to_string();
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            self.tracker.revert(&change);
            tracing::debug!(%path, "scan budget exhausted, deferring file");
            return FileOutcome::Deferred;
        }

        let limit = self.config.extraction_timeout.min(remaining);
        match tokio::time::timeout(limit, self.extractor.extract(&change.path)).await {
            Ok(Ok(stats)) => {
                let merge = self.store.merge(&stats);
                tracing::debug!(
                    %path,
                    size = change.size,
                    previous = ?change.previous,
                    merged = merge.merged,
                    dropped = merge.dropped,
                    "merged file statistics"
                );
                FileOutcome::Merged(merge)
            }
            Ok(Err(report)) => {
                tracing::warn!(%path, error = ?report, "extraction failed");
                FileOutcome::Failed
            }
            Err(_) if limit < self.config.extraction_timeout => {
                self.tracker.revert(&change);
                tracing::warn!(%path, "scan budget exhausted during extraction, deferring file");
                FileOutcome::Deferred
            }
            Err(_) => {
                let error = ExtractionError::Timeout {
                    millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                };
                tracing::warn!(%path, error = %error, "extraction failed");
                FileOutcome::Failed
            }
        }
    }
}

/// Pull collector over the watched directory.
///
/// Every [`collect`](Self::collect) runs a scan pass, or joins the pass
/// already in flight, and renders the aggregates as of its end.
pub struct Fast5Exporter {
    engine: Arc<Engine>,
    flight: SingleFlight<Arc<Snapshot>>,
}

impl Fast5Exporter {
    pub fn new(config: ExporterConfig, extractor: Arc<dyn Extractor>) -> Self {
        let tracker = FileStateTracker::new(&config.extension);
        Self {
            engine: Arc::new(Engine {
                config,
                tracker,
                store: AggregateStore::new(),
                extractor,
                generation: AtomicU64::new(0),
                errors: ErrorCounters::default(),
            }),
            flight: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> &ExporterConfig {
        &self.engine.config
    }

    /// The fixed set of series this exporter produces: the four fast5 gauges
    /// followed by the build info.
    pub fn describe(&self) -> Vec<SeriesSchema> {
        let labels = &self.engine.config.labels;
        vec![
            SeriesSchema::gauge(TOTAL_SIZE, "Total size in bytes of all tracked data files")
                .with_const_labels(labels),
            SeriesSchema::gauge(AMOUNT_READS, "Number of reads per channel")
                .with_variable_label(CHANNEL_LABEL)
                .with_const_labels(labels),
            SeriesSchema::gauge(
                MAX_RAW_DATA_LENGTH,
                "Maximum raw data length of a single read per channel",
            )
            .with_variable_label(CHANNEL_LABEL)
            .with_const_labels(labels),
            SeriesSchema::gauge(RAW_DATA_LENGTH, "Summed raw data length of all reads per channel")
                .with_variable_label(CHANNEL_LABEL)
                .with_const_labels(labels),
            SeriesSchema::gauge(BUILD_INFO, "Build information of the running exporter")
                .with_variable_label(VERSION_LABEL)
                .with_const_labels(labels),
        ]
    }

    /// Runs or joins a scan pass and returns its snapshot.
    ///
    /// # Errors
    ///
    /// - [`CollectError::PassAborted`] if the pass panicked or was cancelled
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, Report<CollectError>> {
        let engine = self.engine.clone();
        self.flight.run(engine.pass()).await.map_err(|e| {
            Report::new(CollectError::PassAborted {
                message: e.to_string(),
            })
        })
    }

    /// Runs or joins a scan pass and renders its snapshot as samples.
    ///
    /// # Errors
    ///
    /// - [`CollectError::PassAborted`] if the pass panicked or was cancelled
    pub async fn collect(&self) -> Result<Vec<Sample>, Report<CollectError>> {
        let snapshot = self.snapshot().await?;
        Ok(render(&snapshot))
    }

    pub fn error_counts(&self) -> ErrorCounts {
        self.engine.errors.counts()
    }
}

/// Renders the total first, then reads, max and sum for every channel in
/// channel order, and the build info last.
pub fn render(snapshot: &Snapshot) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(2 + snapshot.channels.len() * 3);
    samples.push(Sample::new(TOTAL_SIZE, snapshot.total_size as f64));
    for channel in &snapshot.channels {
        let name = channel.channel.as_str();
        samples.push(
            Sample::new(AMOUNT_READS, channel.read_count as f64).with_label(CHANNEL_LABEL, name),
        );
        samples.push(
            Sample::new(MAX_RAW_DATA_LENGTH, channel.raw_data_length_max as f64)
                .with_label(CHANNEL_LABEL, name),
        );
        samples.push(
            Sample::new(RAW_DATA_LENGTH, channel.raw_data_length_sum as f64)
                .with_label(CHANNEL_LABEL, name),
        );
    }
    samples.push(Sample::new(BUILD_INFO, 1.0).with_label(VERSION_LABEL, &version::VERSION));
    samples
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use similar_asserts::assert_eq;
    use tempfile::TempDir;
    use test_log::test;

    use super::*;
    use crate::core::extraction::ExtractedStat;

    #[derive(Clone)]
    enum Step {
        Records(Vec<ExtractedStat>),
        Fail(ExtractionError),
        Panic,
    }

    #[derive(Clone)]
    struct Scripted {
        step: Step,
        delay: Duration,
    }

    /// Replays scripted results per file name. The last step of a script
    /// repeats once the earlier ones are used up.
    #[derive(Default)]
    struct ScriptedExtractor {
        scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl ScriptedExtractor {
        fn push(&self, file: &str, step: Step, delay: Duration) {
            self.scripts
                .lock()
                .unwrap()
                .entry(file.to_string())
                .or_default()
                .push_back(Scripted { step, delay });
        }

        fn records(&self, file: &str, records: &[(&str, i64)]) {
            let stats = records
                .iter()
                .map(|(channel, length)| ExtractedStat::new(*channel, *length))
                .collect();
            self.push(file, Step::Records(stats), Duration::ZERO);
        }

        fn calls(&self, file: &str) -> usize {
            self.calls.lock().unwrap().get(file).copied().unwrap_or(0)
        }

        fn next(&self, file: &str) -> Option<Scripted> {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.get_mut(file)?;
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        }
    }

    #[async_trait]
    impl Extractor for ScriptedExtractor {
        async fn extract(
            &self,
            path: &Path,
        ) -> Result<Vec<ExtractedStat>, Report<ExtractionError>> {
            let file = path.file_name().unwrap().to_string_lossy().to_string();
            *self.calls.lock().unwrap().entry(file.clone()).or_default() += 1;

            let Some(scripted) = self.next(&file) else {
                return Ok(Vec::new());
            };
            tokio::time::sleep(scripted.delay).await;
            match scripted.step {
                Step::Records(stats) => Ok(stats),
                Step::Fail(error) => Err(Report::new(error)),
                Step::Panic => panic!("extractor blew up on {file}"),
            }
        }
    }

    fn write(dir: &TempDir, name: &str, size: usize) {
        std::fs::write(dir.path().join(name), vec![0u8; size]).unwrap();
    }

    fn exporter(dir: &TempDir, extractor: Arc<ScriptedExtractor>) -> Fast5Exporter {
        exporter_with(dir, extractor, |_| {})
    }

    fn exporter_with(
        dir: &TempDir,
        extractor: Arc<ScriptedExtractor>,
        adjust: impl FnOnce(&mut ExporterConfig),
    ) -> Fast5Exporter {
        let mut config = ExporterConfig {
            root: dir.path().to_path_buf(),
            extraction_timeout: Duration::from_secs(5),
            scan_timeout: Duration::from_secs(30),
            ..Default::default()
        };
        adjust(&mut config);
        Fast5Exporter::new(config, extractor)
    }

    fn channel(name: &str, reads: u64, sum: u64, max: u64) -> ChannelAggregate {
        ChannelAggregate {
            channel: name.to_string(),
            read_count: reads,
            raw_data_length_sum: sum,
            raw_data_length_max: max,
        }
    }

    #[test(tokio::test)]
    async fn growth_is_merged_additively() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        extractor.records("ch1.fast5", &[("1", 500)]);
        extractor.records("ch1.fast5", &[("1", 500), ("1", 700)]);
        extractor.records("ch2.fast5", &[("2", 300)]);
        write(&dir, "ch1.fast5", 100);
        write(&dir, "ch2.fast5", 200);
        let exporter = exporter(&dir, extractor.clone());

        let first = exporter.snapshot().await.unwrap();
        assert_eq!(first.total_size, 300);
        assert_eq!(
            first.channels,
            vec![channel("1", 1, 500, 500), channel("2", 1, 300, 300)]
        );

        write(&dir, "ch1.fast5", 150);
        let second = exporter.snapshot().await.unwrap();
        assert_eq!(second.total_size, 350);
        assert_eq!(
            second.channels,
            vec![channel("1", 3, 1700, 700), channel("2", 1, 300, 300)]
        );
        assert_eq!(second.report.changed, 1);
        assert_eq!(extractor.calls("ch2.fast5"), 1);
    }

    #[test(tokio::test)]
    async fn timed_out_file_keeps_previous_contribution() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        extractor.records("ch1.fast5", &[("1", 500)]);
        extractor.records("ch1.fast5", &[("1", 500), ("1", 700)]);
        extractor.records("ch2.fast5", &[("2", 300)]);
        extractor.push(
            "ch2.fast5",
            Step::Records(vec![ExtractedStat::new("2", 900)]),
            Duration::from_secs(2),
        );
        write(&dir, "ch1.fast5", 100);
        write(&dir, "ch2.fast5", 200);
        let exporter = exporter_with(&dir, extractor.clone(), |config| {
            config.extraction_timeout = Duration::from_millis(100);
        });

        exporter.snapshot().await.unwrap();
        write(&dir, "ch1.fast5", 150);
        write(&dir, "ch2.fast5", 250);
        let second = exporter.snapshot().await.unwrap();

        assert_eq!(
            second.channels,
            vec![channel("1", 3, 1700, 700), channel("2", 1, 300, 300)]
        );
        assert_eq!(second.report.failed, 1);
        assert_eq!(second.total_size, 400);
        assert_eq!(exporter.error_counts().extraction_failures, 1);

        // The timed out change is not retried.
        exporter.snapshot().await.unwrap();
        assert_eq!(extractor.calls("ch2.fast5"), 2);
    }

    #[test(tokio::test)]
    async fn failed_file_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        extractor.push(
            "a.fast5",
            Step::Fail(ExtractionError::NonZeroExit {
                status: "exit status: 1".to_string(),
                stderr: "corrupt".to_string(),
            }),
            Duration::ZERO,
        );
        extractor.records("b.fast5", &[("7", 42)]);
        write(&dir, "a.fast5", 10);
        write(&dir, "b.fast5", 20);
        let exporter = exporter(&dir, extractor.clone());

        let snapshot = exporter.snapshot().await.unwrap();

        assert_eq!(snapshot.channels, vec![channel("7", 1, 42, 42)]);
        assert_eq!(snapshot.report.failed, 1);
        assert_eq!(snapshot.report.extracted, 1);
        assert_eq!(snapshot.total_size, 30);
    }

    #[test(tokio::test)]
    async fn rescanning_unchanged_directory_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        extractor.records("ch1.fast5", &[("1", 500), ("3", 20)]);
        write(&dir, "ch1.fast5", 100);
        write(&dir, "notes.txt", 5);
        let exporter = exporter(&dir, extractor.clone());

        let first = exporter.snapshot().await.unwrap();
        let second = exporter.snapshot().await.unwrap();
        let third = exporter.snapshot().await.unwrap();

        assert_eq!(first.channels, third.channels);
        assert_eq!(first.total_size, third.total_size);
        assert_eq!(second.report.changed, 0);
        assert_eq!(third.generation, first.generation + 2);
        assert_eq!(extractor.calls("ch1.fast5"), 1);
    }

    #[test(tokio::test)]
    async fn concurrent_collects_share_one_pass() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        extractor.push(
            "ch1.fast5",
            Step::Records(vec![ExtractedStat::new("1", 500)]),
            Duration::from_millis(200),
        );
        write(&dir, "ch1.fast5", 100);
        let exporter = Arc::new(exporter(&dir, extractor.clone()));

        let mut scrapes = Vec::new();
        for _ in 0..8 {
            let exporter = exporter.clone();
            scrapes.push(tokio::spawn(async move { exporter.snapshot().await }));
        }
        let mut snapshots = Vec::new();
        for scrape in scrapes {
            snapshots.push(scrape.await.unwrap().unwrap());
        }

        let generation = snapshots[0].generation;
        for snapshot in &snapshots {
            assert_eq!(snapshot.generation, generation);
            assert_eq!(snapshot.channels, vec![channel("1", 1, 500, 500)]);
        }
        assert_eq!(extractor.calls("ch1.fast5"), 1);
    }

    #[test(tokio::test)]
    async fn pass_deadline_defers_unreached_files() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        for file in ["a.fast5", "b.fast5"] {
            extractor.push(
                file,
                Step::Records(vec![ExtractedStat::new("1", 10)]),
                Duration::from_millis(200),
            );
        }
        write(&dir, "a.fast5", 10);
        write(&dir, "b.fast5", 20);
        let exporter = exporter_with(&dir, extractor.clone(), |config| {
            config.scan_timeout = Duration::from_millis(300);
            config.extraction_workers = 1;
        });

        let first = exporter.snapshot().await.unwrap();
        assert_eq!(first.report.extracted, 1);
        assert_eq!(first.report.deferred, 1);
        assert_eq!(first.total_size, 10);
        assert_eq!(first.channels, vec![channel("1", 1, 10, 10)]);
        assert_eq!(exporter.error_counts().extraction_failures, 0);

        let second = exporter.snapshot().await.unwrap();
        assert_eq!(second.report.changed, 1);
        assert_eq!(second.report.extracted, 1);
        assert_eq!(second.total_size, 30);
        assert_eq!(second.channels, vec![channel("1", 2, 20, 10)]);
    }

    #[test(tokio::test)]
    async fn invalid_records_are_dropped_and_counted() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        extractor.records("ch1.fast5", &[("1", -1), ("1", 64)]);
        write(&dir, "ch1.fast5", 100);
        let exporter = exporter(&dir, extractor);

        let snapshot = exporter.snapshot().await.unwrap();

        assert_eq!(snapshot.channels, vec![channel("1", 1, 64, 64)]);
        assert_eq!(snapshot.report.records_dropped, 1);
        assert_eq!(exporter.error_counts().dropped_records, 1);
    }

    #[test(tokio::test)]
    async fn missing_root_yields_empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        let exporter = exporter_with(&dir, extractor, |config| {
            config.root = config.root.join("gone");
        });

        let snapshot = exporter.snapshot().await.unwrap();

        assert_eq!(snapshot.total_size, 0);
        assert!(snapshot.channels.is_empty());
        assert_eq!(exporter.error_counts().scan_errors, 1);
    }

    #[test(tokio::test)]
    async fn panicking_extractor_fails_only_its_file() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        extractor.push("ch1.fast5", Step::Panic, Duration::ZERO);
        write(&dir, "ch1.fast5", 100);
        let exporter = exporter(&dir, extractor.clone());

        let samples = exporter.collect().await.unwrap();
        assert_eq!(samples[0], Sample::new(TOTAL_SIZE, 100.0));
        assert_eq!(exporter.error_counts().extraction_failures, 1);

        // Like a timeout, the panicked change is not retried.
        let snapshot = exporter.snapshot().await.unwrap();
        assert_eq!(snapshot.report.changed, 0);
        assert_eq!(extractor.calls("ch1.fast5"), 1);
    }

    #[test(tokio::test)]
    async fn panic_does_not_discard_concurrent_extractions() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(ScriptedExtractor::default());
        extractor.push("a.fast5", Step::Panic, Duration::from_millis(10));
        extractor.push(
            "b.fast5",
            Step::Records(vec![ExtractedStat::new("7", 42)]),
            Duration::from_millis(300),
        );
        write(&dir, "a.fast5", 10);
        write(&dir, "b.fast5", 20);
        let exporter = exporter(&dir, extractor.clone());

        let snapshot = exporter.snapshot().await.unwrap();

        assert_eq!(snapshot.channels, vec![channel("7", 1, 42, 42)]);
        assert_eq!(snapshot.report.extracted, 1);
        assert_eq!(snapshot.report.failed, 1);
        assert_eq!(snapshot.total_size, 30);
        assert_eq!(extractor.calls("b.fast5"), 1);
    }

    #[test]
    fn describe_declares_gauges_and_build_info() {
        let dir = TempDir::new().unwrap();
        let exporter = exporter_with(&dir, Arc::default(), |config| {
            config.labels = BTreeMap::from([("site".to_string(), "lab".to_string())]);
        });

        let schemas = exporter.describe();

        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                TOTAL_SIZE,
                AMOUNT_READS,
                MAX_RAW_DATA_LENGTH,
                RAW_DATA_LENGTH,
                BUILD_INFO
            ]
        );
        assert!(schemas[0].variable_labels.is_empty());
        for schema in &schemas[1..4] {
            assert_eq!(schema.variable_labels, vec![CHANNEL_LABEL.to_string()]);
        }
        assert_eq!(schemas[4].variable_labels, vec![VERSION_LABEL.to_string()]);
        for schema in &schemas {
            assert_eq!(schema.const_labels["site"], "lab");
        }
    }

    #[test]
    fn render_orders_total_then_channels() {
        let snapshot = Snapshot {
            generation: 1,
            total_size: 300,
            channels: vec![channel("1", 1, 500, 500), channel("2", 2, 300, 200)],
            report: ScanReport::default(),
        };

        let samples = render(&snapshot);

        assert_eq!(
            samples,
            vec![
                Sample::new(TOTAL_SIZE, 300.0),
                Sample::new(AMOUNT_READS, 1.0).with_label(CHANNEL_LABEL, "1"),
                Sample::new(MAX_RAW_DATA_LENGTH, 500.0).with_label(CHANNEL_LABEL, "1"),
                Sample::new(RAW_DATA_LENGTH, 500.0).with_label(CHANNEL_LABEL, "1"),
                Sample::new(AMOUNT_READS, 2.0).with_label(CHANNEL_LABEL, "2"),
                Sample::new(MAX_RAW_DATA_LENGTH, 200.0).with_label(CHANNEL_LABEL, "2"),
                Sample::new(RAW_DATA_LENGTH, 300.0).with_label(CHANNEL_LABEL, "2"),
                Sample::new(BUILD_INFO, 1.0).with_label(VERSION_LABEL, &version::VERSION),
            ]
        );
    }
}
