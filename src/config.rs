//! # Configuration
//!
//! Layered with the `config` crate, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`ShopConfig::default`]).
//! 2. An optional TOML file.
//! 3. Environment variables prefixed `ROBOTSHOP__`, with `__` between path segments, for
//!    example `ROBOTSHOP__FACTORY__PRODUCTION_LINES=8`.
//! 4. `CUSTOMER_SERVICE_LOCATION` and `FACTORY_SERVICE_LOCATION`, which point the order
//!    service at its collaborators.
//!
//! ```toml
//! [factory]
//! production_lines = 8
//! queue_depth = 64
//!
//! [orders.poll]
//! interval_ms = 500
//!
//! [logging]
//! format = "json"
//! ```

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use shop_kernel::tracing::LogFormat;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const CUSTOMER_SERVICE_LOCATION: &str = "CUSTOMER_SERVICE_LOCATION";
pub const FACTORY_SERVICE_LOCATION: &str = "FACTORY_SERVICE_LOCATION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub customers: CustomerServiceConfig,
    pub factory: FactoryConfig,
    pub orders: OrderServiceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerServiceConfig {
    pub bind: String,
}

impl Default for CustomerServiceConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8081".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    pub bind: String,
    pub production_lines: usize,
    pub queue_depth: usize,
    pub chassis_ms: u64,
    pub roll_over_ms: u64,
    pub painting_ms: u64,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8082".into(),
            production_lines: 50,
            queue_depth: 500,
            chassis_ms: 50,
            roll_over_ms: 10,
            painting_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderServiceConfig {
    pub bind: String,
    /// Fulfillment jobs running at once.
    pub dispatchers: usize,
    /// Fulfillment jobs waiting for a dispatcher.
    pub queue_depth: usize,
    pub customer_service_url: String,
    pub factory_service_url: String,
    /// Deadline of every outbound HTTP request.
    pub request_timeout_ms: u64,
    /// Deadline of a whole fulfillment job, from validation to the last robot.
    pub order_deadline_ms: u64,
    pub poll: PollConfig,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".into(),
            dispatchers: 4,
            queue_depth: 500,
            customer_service_url: "http://localhost:8081".into(),
            factory_service_url: "http://localhost:8082".into(),
            request_timeout_ms: 5_000,
            order_deadline_ms: 300_000,
            poll: PollConfig::default(),
        }
    }
}

impl OrderServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn order_deadline(&self) -> Duration {
        Duration::from_millis(self.order_deadline_ms)
    }
}

/// Cadence and bounds of the completion pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
    pub max_attempts: u32,
    /// Consecutive transport failures a poller tolerates.
    pub max_transport_errors: u32,
    /// Pickup calls in flight at once, across all pollers.
    pub poller_slots: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 50,
            interval_ms: 9_000,
            max_attempts: 30,
            max_transport_errors: 3,
            poller_slots: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Compact,
        }
    }
}

impl ShopConfig {
    /// Loads defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&ShopConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let mut config: ShopConfig = builder
            .add_source(
                Environment::with_prefix("ROBOTSHOP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.apply_service_locations(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies `CUSTOMER_SERVICE_LOCATION` / `FACTORY_SERVICE_LOCATION` from `lookup`.
    pub fn apply_service_locations(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(CUSTOMER_SERVICE_LOCATION).filter(|u| !u.is_empty()) {
            self.orders.customer_service_url = url;
        }
        if let Some(url) = lookup(FACTORY_SERVICE_LOCATION).filter(|u| !u.is_empty()) {
            self.orders.factory_service_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.factory.production_lines == 0, "factory.production_lines must be at least 1"),
            (self.orders.dispatchers == 0, "orders.dispatchers must be at least 1"),
            (self.orders.poll.max_attempts == 0, "orders.poll.max_attempts must be at least 1"),
            (
                self.orders.poll.max_transport_errors == 0,
                "orders.poll.max_transport_errors must be at least 1",
            ),
            (self.orders.poll.poller_slots == 0, "orders.poll.poller_slots must be at least 1"),
            (self.orders.order_deadline_ms == 0, "orders.order_deadline_ms must be positive"),
        ];
        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(ConfigError::Invalid((*message).to_string())),
            None => Ok(()),
        }
    }
}
