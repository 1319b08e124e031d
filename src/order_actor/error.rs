//! Error types for the order service.

use crate::model::{Color, CustomerId, OrderId, SerialNumber};
use serde::{Deserialize, Serialize};
use shop_kernel::PoolError;
use thiserror::Error;

/// Errors returned by the order orchestrator and the order ledger.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The requested order was not found.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The order's fulfillment job is still running.
    #[error("Order {0} is still being fulfilled")]
    NotReady(OrderId),

    /// Every dispatcher is busy and the queue is full. Retry later.
    #[error("Order service overloaded: {0}")]
    Overloaded(PoolError),

    /// An order with this id is already in the ledger.
    #[error("Order {0} already exists")]
    Duplicate(OrderId),

    /// The order was already completed once.
    #[error("Order {0} is already completed")]
    AlreadyCompleted(OrderId),

    /// The order request itself is unusable.
    #[error("Order validation error: {0}")]
    Validation(String),

    #[error("Order store error: {0}")]
    Store(String),
}

/// Why an order could not be fulfilled. Travels inside the realized order.
///
/// Serialized as `{"kind": "<variant>", ...fields}`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum FulfillmentError {
    #[error("Customer {customer_id} does not exist")]
    CustomerNotFound { customer_id: CustomerId },

    #[error("Customer service unavailable: {reason}")]
    CustomerServiceUnavailable { reason: String },

    #[error("Malformed response from the {service} service: {reason}")]
    MalformedResponse { service: String, reason: String },

    /// The factory refused the build request for lack of capacity.
    #[error("Factory overloaded, could not start {robot_type_id} ({color})")]
    FactoryOverloaded { robot_type_id: String, color: Color },

    /// The factory did not hand out a usable serial number.
    #[error("No serial number for {robot_type_id} ({color}): {reason}")]
    InvalidSerial {
        robot_type_id: String,
        color: Color,
        reason: String,
    },

    #[error("Production of robot {serial_number} failed: {reason}")]
    ProductionFailed {
        serial_number: SerialNumber,
        reason: String,
    },

    #[error("Lost contact with the factory while waiting for robot {serial_number}: {reason}")]
    TransportError {
        serial_number: SerialNumber,
        reason: String,
    },

    #[error("Timed out waiting for {waiting_for}")]
    Timeout { waiting_for: String },

    /// The robots delivered are not the ones ordered.
    #[error("Robots do not match the order: {reason}")]
    MismatchedRobots { reason: String },

    /// A line item task ended without an outcome.
    #[error("Fulfillment aborted: {reason}")]
    Aborted { reason: String },
}
