//! Logging and tracing initialisation.
//!
//! The library itself only emits `tracing` events; a host application (or a test) calls
//! [`init_logging`] once to print them.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::skychart_errors::SkyChartError;

/// Install a compact stdout subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. A second call is a no-op: the global
/// subscriber is only installed once.
///
/// Arguments
/// ---------
/// * `default_filter`: directive used when `RUST_LOG` is absent, e.g. `"skychart=debug"`
///
/// Return
/// ------
/// * [`SkyChartError::Logging`] when the filter directive cannot be parsed
pub fn init_logging(default_filter: &str) -> Result<(), SkyChartError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| SkyChartError::Logging(format!("Failed to create log filter: {e}")))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .compact();

    // already installed by a previous call or by the host
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    Ok(())
}
