use std::sync::Arc;

use crate::api::MetricsState;
use crate::core::Fast5Exporter;

/// Application dependencies - simple struct with Arc-wrapped services
pub struct ApplicationServices {
    pub exporter: Arc<Fast5Exporter>,
    pub metrics: Arc<MetricsState>,
}
