use std::sync::Arc;

use anyhow::Result;
use error_stack::bail;
use error_stack::Report;
use error_stack::ResultExt;

use crate::api::MetricsState;
use crate::app::Application;
use crate::app::ApplicationServices;
use crate::config::ConfigError;
use crate::config::ExporterArgs;
use crate::config::ServeArgs;
use crate::core::tracker::check_root;
use crate::core::Fast5Exporter;
use crate::metrics::encoders::create_encoder;
use crate::metrics::encoders::MetricsEncoder;
use crate::platform::extractor::CommandExtractor;

/// Application builder
pub struct ApplicationBuilder {
    serve_args: ServeArgs,
}

impl ApplicationBuilder {
    /// Create new application builder
    pub fn new(serve_args: ServeArgs) -> Self {
        Self { serve_args }
    }

    /// Build complete application
    pub fn build(self) -> Result<Application> {
        tracing::info!("Building application components...");

        let services = self
            .create_services()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {e:?}"))?;

        Ok(Application::new(services, self.serve_args))
    }

    fn create_services(&self) -> Result<ApplicationServices, Report<ConfigError>> {
        let telemetry_path = self.serve_args.validated_telemetry_path()?.to_string();
        let encoder = select_encoder(&self.serve_args.exporter.metrics_format)?;
        let exporter = create_exporter(&self.serve_args.exporter)?;

        let metrics = Arc::new(MetricsState {
            exporter: exporter.clone(),
            encoder,
            telemetry_path,
        });

        Ok(ApplicationServices { exporter, metrics })
    }
}

/// Validates the exporter options and the watched root, then wires the
/// exporter to the command-backed extractor.
///
/// # Errors
///
/// - [`ConfigError::InvalidLabel`] or [`ConfigError::InvalidValue`] for bad options
/// - [`ConfigError::WatchedRoot`] if the watched directory cannot be listed
pub fn create_exporter(args: &ExporterArgs) -> Result<Arc<Fast5Exporter>, Report<ConfigError>> {
    let config = args.to_config()?;
    check_root(&config.root).change_context(ConfigError::WatchedRoot)?;

    let extractor = Arc::new(CommandExtractor::new(
        args.extractor_program.clone(),
        args.extractor_args.clone(),
    ));

    tracing::info!(
        root = %config.root.display(),
        extension = %config.extension,
        extractor = %args.extractor_program,
        extractor_args = ?args.extractor_args,
        labels = ?config.labels,
        extraction_timeout = ?config.extraction_timeout,
        scan_timeout = ?config.scan_timeout,
        extraction_workers = config.extraction_workers,
        "Exporter configured"
    );

    Ok(Arc::new(Fast5Exporter::new(config, extractor)))
}

/// # Errors
///
/// - [`ConfigError::UnknownMetricsFormat`] if no encoder handles `format`
pub fn select_encoder(format: &str) -> Result<Box<dyn MetricsEncoder>, Report<ConfigError>> {
    let Some(encoder) = create_encoder(format) else {
        bail!(ConfigError::UnknownMetricsFormat {
            format: format.to_string(),
        });
    };
    Ok(encoder)
}
