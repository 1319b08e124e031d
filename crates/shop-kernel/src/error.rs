//! # Kernel Errors
//!
//! Errors raised by the kernel itself, as opposed to the record-level errors each
//! [`StoreEntity`](crate::StoreEntity) defines. Store errors are generic over the record
//! error so callers can still match on it.

/// Errors returned by a [`StoreClient`](crate::StoreClient).
#[derive(Debug, thiserror::Error)]
pub enum StoreError<E: std::error::Error + 'static> {
    #[error("Store closed")]
    Closed,
    #[error("Store dropped response channel")]
    Dropped,
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Duplicate record id: {0}")]
    Duplicate(String),
    #[error(transparent)]
    Entity(E),
}

impl<E: std::error::Error + 'static> StoreError<E> {
    /// Returns the record-level error, if this is one.
    pub fn into_entity(self) -> Option<E> {
        match self {
            StoreError::Entity(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors returned by a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Every worker is busy and the queue is full. Callers should retry later.
    #[error("{pool} is saturated ({capacity} jobs admitted)")]
    Overloaded { pool: String, capacity: usize },
    #[error("{pool} is shut down")]
    Closed { pool: String },
}

/// Errors parsing a `traceparent` header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationError {
    #[error("Malformed traceparent: {0}")]
    Malformed(String),
    #[error("Unsupported traceparent version: {0}")]
    UnsupportedVersion(String),
}

