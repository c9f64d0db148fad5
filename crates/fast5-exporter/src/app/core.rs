use anyhow::Result;

use crate::app::services::ApplicationServices;
use crate::app::tasks::Tasks;
use crate::config::ServeArgs;

/// Application core structure with explicit dependencies
pub struct Application {
    services: ApplicationServices,
    serve_args: ServeArgs,
}

impl Application {
    /// Create new application with explicit service dependencies
    pub fn new(services: ApplicationServices, serve_args: ServeArgs) -> Self {
        Self {
            services,
            serve_args,
        }
    }

    /// Get access to services
    pub fn services(&self) -> &ApplicationServices {
        &self.services
    }

    pub fn serve_args(&self) -> &ServeArgs {
        &self.serve_args
    }

    /// Run application, start all tasks and wait for completion
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting all application tasks...");

        let mut tasks = Tasks::new();
        tasks.spawn_all_tasks(self);

        if let Err(e) = tasks.wait_for_completion().await {
            tracing::error!("Error during task execution: {}", e);
            return Err(e);
        }

        tracing::info!("Application run completed");
        Ok(())
    }

    /// Gracefully shutdown application
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down application...");

        let errors = self.services.exporter.error_counts();
        tracing::info!(
            scan_errors = errors.scan_errors,
            extraction_failures = errors.extraction_failures,
            dropped_records = errors.dropped_records,
            "Application shutdown completed"
        );
        Ok(())
    }
}
