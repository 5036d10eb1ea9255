//! HTTP handlers.
//!
//! - page: the interactive quote form (`GET /`, `POST /`)
//! - quote: JSON quote endpoint (`POST /api/v1/quote`)
//! - health: liveness and readiness probes
//! - metrics_handler: Prometheus exposition

pub mod health;
pub mod metrics_handler;
pub mod page;
pub mod quote;

use crate::pipeline::QuotePipeline;

/// State shared by all quote handlers.
///
/// The pipeline holds the artifacts behind an `Arc`; cloning is cheap and
/// every request reads the same immutable instance.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: QuotePipeline,
}

impl AppState {
    pub fn new(pipeline: QuotePipeline) -> Self {
        Self { pipeline }
    }
}
