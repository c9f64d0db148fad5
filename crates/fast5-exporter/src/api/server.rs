use std::sync::Arc;
use std::time::Duration;

use error_stack::Report;
use poem::get;
use poem::listener::TcpListener;
use poem::middleware::Tracing;
use poem::Endpoint;
use poem::EndpointExt;
use poem::Route;
use poem::Server;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

use super::errors::ApiError;
use super::handlers::get_metrics;
use super::handlers::healthz;
use super::handlers::index;
use super::handlers::MetricsState;

/// Time given to in-flight scrapes once shutdown is requested
const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the endpoint serving `state`
pub fn routes(state: Arc<MetricsState>) -> impl Endpoint {
    Route::new()
        .at(state.telemetry_path.clone(), get(get_metrics))
        .at("/healthz", get(healthz))
        .at("/", get(index))
        .data(state)
        .with(Tracing)
}

/// HTTP server exposing the metrics endpoint
pub struct ApiServer {
    state: Arc<MetricsState>,
    listen_addr: String,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: Arc<MetricsState>, listen_addr: String) -> Self {
        Self { state, listen_addr }
    }

    /// Serve until `cancellation` fires
    ///
    /// # Errors
    ///
    /// - [`ApiError::ServerError`] if the server fails to start or bind to the address
    pub async fn run(self, cancellation: CancellationToken) -> Result<(), Report<ApiError>> {
        info!(
            listen_addr = %self.listen_addr,
            telemetry_path = %self.state.telemetry_path,
            "Starting HTTP server"
        );

        let app = routes(self.state);
        let listener = TcpListener::bind(&self.listen_addr);
        let server = Server::new(listener);

        match server
            .run_with_graceful_shutdown(
                app,
                cancellation.cancelled_owned(),
                Some(GRACEFUL_SHUTDOWN_TIMEOUT),
            )
            .await
        {
            Ok(()) => {
                info!("HTTP server stopped");
                Ok(())
            }
            Err(e) => {
                error!("HTTP server failed: {e}");
                Err(Report::new(ApiError::ServerError {
                    message: format!("Server failed: {e}"),
                })
                .attach_printable(format!("listen address: {}", self.listen_addr)))
            }
        }
    }
}
