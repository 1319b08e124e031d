//! # Observability & Tracing
//!
//! Structured logging for every robot shop service, built on `tracing` and
//! `tracing-subscriber`.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the configured default
//! directive. Three output formats are available:
//!
//! - **compact** (default): one line per event, spans inline, no module paths.
//! - **pretty**: multi-line, for reading a single flow by eye.
//! - **json**: one JSON object per event, for log shippers.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Default
//! RUST_LOG=info robotshop all
//!
//! # Every store request with its payload
//! RUST_LOG=debug robotshop all
//!
//! # Only the factory floor
//! RUST_LOG=robotshop::factory=debug robotshop factory
//! ```
//!
//! ## Workflow Trace Example
//!
//! With `RUST_LOG=info` a single order reads roughly like this:
//!
//! ```text
//! INFO fulfillment{order_id="7" trace_id="4bf9..."}: Customer validated customer_id="1"
//! INFO fulfillment{order_id="7" trace_id="4bf9..."}: Build started serial_number="12" robot_type_id="T-800"
//! INFO production{serial_number="12"}: Robot completed
//! INFO fulfillment{order_id="7" trace_id="4bf9..."}: Order realized robots=3
//! ```
//!
//! Fields such as `order_id`, `serial_number`, `customer_id` and `trace_id` are recorded as
//! structured fields so they survive the json format intact.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Installs the global subscriber.
///
/// Safe to call more than once: later calls leave the first subscriber in place, which lets
/// tests call it freely.
pub fn setup_tracing(format: LogFormat, default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_ok() {
        tracing::debug!(?format, "Tracing initialized");
    }
}
