//! Typed clients for each service: in-process store wrappers and HTTP gateways to the
//! remote services.

pub mod customer_client;
pub mod factory_client;
pub mod order_client;

pub use customer_client::*;
pub use factory_client::*;
pub use order_client::*;

use std::time::Duration;

/// Builds the HTTP client shared by every outbound gateway. Each request is bounded by
/// `timeout`.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
}
