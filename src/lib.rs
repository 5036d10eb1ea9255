pub mod artifacts;
pub mod config;
pub mod error;
pub mod form;
pub mod format;
pub mod handlers;
pub mod metrics;
pub mod page;
pub mod pipeline;
pub mod quote;
pub mod row;
pub mod server;
pub mod signals;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, ServerConfig};

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over `server.log_level`. Can only be called once.
pub fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    match server.log_format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }
}
