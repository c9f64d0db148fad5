use std::sync::Arc;

use poem::handler;
use poem::http::StatusCode;
use poem::web::Data;
use poem::web::Html;
use poem::Response;
use tracing::error;

use crate::core::Fast5Exporter;
use crate::metrics::encoders::MetricsEncoder;

/// Shared state of the HTTP handlers
pub struct MetricsState {
    pub exporter: Arc<Fast5Exporter>,
    pub encoder: Box<dyn MetricsEncoder>,
    pub telemetry_path: String,
}

/// Scrape endpoint
#[handler]
pub async fn get_metrics(state: Data<&Arc<MetricsState>>) -> poem::Result<Response> {
    let samples = state.exporter.collect().await.map_err(|report| {
        error!(error = ?report, "Failed to collect metrics");
        poem::Error::from_string(report.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
    })?;

    let body = state
        .encoder
        .encode(&state.exporter.describe(), &samples)
        .map_err(|report| {
            error!(error = ?report, "Failed to encode metrics");
            poem::Error::from_string(report.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        })?;

    Ok(Response::builder()
        .content_type(state.encoder.content_type())
        .body(body))
}

#[handler]
pub fn healthz() -> &'static str {
    "ok"
}

#[handler]
pub fn index(state: Data<&Arc<MetricsState>>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Fast5 Exporter</title></head>\n\
         <body>\n\
         <h1>Fast5 Exporter</h1>\n\
         <p><a href='{path}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        path = state.telemetry_path
    ))
}
