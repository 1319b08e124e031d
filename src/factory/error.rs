//! Error types for the factory floor.

use crate::model::SerialNumber;
use serde::{Deserialize, Serialize};
use shop_kernel::PoolError;
use thiserror::Error;

/// Why a production job ended without a robot. Recorded on the job itself.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProductionFailure {
    #[error("Unknown robot type: {robot_type_id}")]
    UnknownRobotType { robot_type_id: String },

    /// The production line failed while working on the job.
    #[error("Production aborted: {reason}")]
    Aborted { reason: String },
}

/// Errors that can occur during factory operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FactoryError {
    /// Every production line is busy and the queue is full.
    #[error("Factory at capacity: {0}")]
    CapacityExceeded(PoolError),

    #[error("Unknown serial number: {0}")]
    NotFound(SerialNumber),

    #[error("Robot {0} is still in production")]
    NotReady(SerialNumber),

    #[error("Production of {serial_number} failed: {failure}")]
    ProductionFailed {
        serial_number: SerialNumber,
        failure: ProductionFailure,
    },

    /// A stage change the job's state machine does not allow.
    #[error("Job {serial_number} cannot go from {from} to {to}")]
    InvalidTransition {
        serial_number: SerialNumber,
        from: &'static str,
        to: &'static str,
    },

    #[error("Unknown robot type: {0}")]
    UnknownRobotType(String),

    #[error("Factory store error: {0}")]
    Store(String),
}
