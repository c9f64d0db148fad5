use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use error_stack::bail;
use error_stack::Report;

use super::labels::parse_labels;
use super::ConfigError;
use crate::core::ExporterConfig;

/// Options shared by every command that scans the watched directory.
#[derive(Args, Clone, Debug)]
pub struct ExporterArgs {
    #[arg(
        long,
        env = "FAST5_DIR_PATH",
        value_hint = clap::ValueHint::DirPath,
        default_value = "/tmp/fast5",
        help = "Directory watched recursively for data files"
    )]
    pub fast5_dir_path: PathBuf,

    #[arg(
        long,
        env = "FAST5_EXTENSION",
        default_value = ".fast5",
        help = "File name extension of data files"
    )]
    pub extension: String,

    #[arg(
        long,
        env = "FAST5_LABELS",
        help = "Static labels added to every metric, e.g. site=lab,cluster=a"
    )]
    pub labels: Option<String>,

    #[arg(
        long,
        env = "FAST5_EXTRACTOR_PROGRAM",
        default_value = "python3",
        help = "Program invoked once per changed data file"
    )]
    pub extractor_program: String,

    #[arg(
        long,
        env = "FAST5_EXTRACTOR_ARGS",
        value_delimiter = ' ',
        allow_hyphen_values = true,
        default_value = "python/parse_fast5_file.py",
        help = "Arguments passed to the extractor before `--path <file>`"
    )]
    pub extractor_args: Vec<String>,

    #[arg(
        long,
        env = "FAST5_EXTRACTION_TIMEOUT_SECS",
        default_value = "60",
        help = "Timeout for a single extractor invocation, in seconds"
    )]
    pub extraction_timeout_secs: u64,

    #[arg(
        long,
        env = "FAST5_SCAN_TIMEOUT_SECS",
        default_value = "300",
        help = "Timeout for a whole scan pass, in seconds"
    )]
    pub scan_timeout_secs: u64,

    #[arg(
        long,
        env = "FAST5_EXTRACTION_WORKERS",
        default_value = "4",
        help = "Maximum number of concurrent extractor invocations"
    )]
    pub extraction_workers: usize,

    #[arg(
        long,
        env = "FAST5_METRICS_FORMAT",
        default_value = "prometheus",
        help = "Metrics format, either 'prometheus' or 'json'"
    )]
    pub metrics_format: String,

    #[arg(
        long,
        env = "FAST5_LOG_DIR",
        value_hint = clap::ValueHint::DirPath,
        help = "Directory for daily rotated log files, logs go to stderr only when unset"
    )]
    pub log_dir: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub exporter: ExporterArgs,

    #[arg(
        long = "web.listen-address",
        env = "FAST5_LISTEN_ADDR",
        default_value = "0.0.0.0:9307",
        help = "Address to listen on for web interface and telemetry"
    )]
    pub listen_address: String,

    #[arg(
        long = "web.telemetry-path",
        env = "FAST5_TELEMETRY_PATH",
        default_value = "/metrics",
        help = "Path under which to expose metrics"
    )]
    pub telemetry_path: String,
}

impl ExporterArgs {
    /// Validates the options and turns them into the engine configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidLabel`] if the static labels cannot be parsed
    /// - [`ConfigError::InvalidValue`] if a timeout or the worker count is zero
    pub fn to_config(&self) -> Result<ExporterConfig, Report<ConfigError>> {
        let labels = match &self.labels {
            Some(spec) => parse_labels(spec)?,
            None => Default::default(),
        };

        Ok(ExporterConfig {
            root: self.fast5_dir_path.clone(),
            extension: self.extension.clone(),
            labels,
            extraction_timeout: Duration::from_secs(non_zero(
                "--extraction-timeout-secs",
                self.extraction_timeout_secs,
            )?),
            scan_timeout: Duration::from_secs(non_zero(
                "--scan-timeout-secs",
                self.scan_timeout_secs,
            )?),
            extraction_workers: non_zero("--extraction-workers", self.extraction_workers)?,
        })
    }
}

impl ServeArgs {
    /// The telemetry path, checked not to shadow the other routes.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidValue`] if the path is relative, `/` or `/healthz`
    pub fn validated_telemetry_path(&self) -> Result<&str, Report<ConfigError>> {
        let path = self.telemetry_path.as_str();
        if !path.starts_with('/') || path == "/" || path == "/healthz" {
            bail!(ConfigError::InvalidValue {
                name: "--web.telemetry-path".to_string(),
                reason: format!("`{path}` must be an absolute path other than / and /healthz"),
            });
        }
        Ok(path)
    }
}

fn non_zero<T: PartialEq + Default>(name: &str, value: T) -> Result<T, Report<ConfigError>> {
    if value == T::default() {
        bail!(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
