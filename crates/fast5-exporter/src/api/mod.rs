//! HTTP surface for metric scrapers
//!
//! # Endpoints
//!
//! - `GET <telemetry path>` - run or join a scan pass and render all series
//! - `GET /healthz` - liveness, independent of scan state
//! - `GET /` - landing page linking to the telemetry path

pub mod errors;
pub mod handlers;
pub mod server;

pub use errors::ApiError;
pub use handlers::MetricsState;
pub use server::routes;
pub use server::ApiServer;
