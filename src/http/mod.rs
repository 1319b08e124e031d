//! HTTP surfaces of the three services.
//!
//! Each router takes its service as axum state and maps domain errors to an [`ApiError`],
//! which renders as `{"error": "..."}` with the matching status code.

pub mod customers;
pub mod factory;
pub mod orders;

use crate::customer_actor::CustomerError;
use crate::factory::FactoryError;
use crate::order_actor::OrderError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use shop_kernel::{CorrelationContext, TRACEPARENT_HEADER};
use std::future::Future;
use std::str::FromStr;
use tokio::net::TcpListener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<CustomerError> for ApiError {
    fn from(e: CustomerError) -> Self {
        let status = match e {
            CustomerError::NotFound(_) => StatusCode::NOT_FOUND,
            CustomerError::Validation(_) => StatusCode::BAD_REQUEST,
            CustomerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<FactoryError> for ApiError {
    fn from(e: FactoryError) -> Self {
        let status = match e {
            FactoryError::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
            FactoryError::NotFound(_) | FactoryError::UnknownRobotType(_) => StatusCode::NOT_FOUND,
            FactoryError::NotReady(_) => StatusCode::NO_CONTENT,
            FactoryError::ProductionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            FactoryError::InvalidTransition { .. } | FactoryError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        let status = match e {
            // An order still being fulfilled cannot be picked up yet.
            OrderError::NotFound(_) | OrderError::NotReady(_) => StatusCode::NOT_FOUND,
            OrderError::Overloaded(_) => StatusCode::SERVICE_UNAVAILABLE,
            OrderError::Validation(_) => StatusCode::BAD_REQUEST,
            OrderError::Duplicate(_) | OrderError::AlreadyCompleted(_) | OrderError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

/// The inbound trace context, or a fresh root when the caller sent none.
pub fn correlation(headers: &HeaderMap) -> CorrelationContext {
    CorrelationContext::from_header_or_root(
        headers
            .get(TRACEPARENT_HEADER)
            .and_then(|value| value.to_str().ok()),
    )
}

/// Parses a required path or query value.
pub(crate) fn parse_param<T: FromStr>(name: &str, raw: Option<&str>) -> Result<T, ApiError> {
    let raw = raw
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing {name}")))?;
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid {name}: {raw:?}")))
}

/// Serves `router` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
