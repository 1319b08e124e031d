use crate::factory::{FactoryError, ProductionScheduler};
use crate::model::{Color, Robot, SerialNumber};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use shop_kernel::{CorrelationContext, TRACEPARENT_HEADER};
use thiserror::Error;
use tracing::{debug, instrument};

/// Body of a successful build request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReceipt {
    pub serial_number: SerialNumber,
}

/// What the factory says about a serial number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickupStatus {
    Ready(Robot),
    NotReady,
    /// The production job ended without a robot.
    Failed(String),
    /// The factory has never heard of this serial, or it was already picked up.
    Unknown,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Factory is at capacity")]
    Overloaded,
    #[error("Factory unreachable: {0}")]
    Transport(String),
    #[error("Malformed factory response: {0}")]
    Malformed(String),
    #[error("Factory answered {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// The factory as seen by the order service.
#[async_trait]
pub trait FactoryGateway: Send + Sync {
    async fn start_build(
        &self,
        robot_type_id: &str,
        color: Color,
        ctx: &CorrelationContext,
    ) -> Result<SerialNumber, GatewayError>;

    async fn pick_up(
        &self,
        serial_number: SerialNumber,
        ctx: &CorrelationContext,
    ) -> Result<PickupStatus, GatewayError>;
}

/// Calls a factory running in the same process.
#[async_trait]
impl FactoryGateway for ProductionScheduler {
    async fn start_build(
        &self,
        robot_type_id: &str,
        color: Color,
        ctx: &CorrelationContext,
    ) -> Result<SerialNumber, GatewayError> {
        self.start_building_robot(robot_type_id, color, ctx)
            .await
            .map_err(|e| match e {
                FactoryError::CapacityExceeded(_) => GatewayError::Overloaded,
                other => GatewayError::Transport(other.to_string()),
            })
    }

    async fn pick_up(
        &self,
        serial_number: SerialNumber,
        _ctx: &CorrelationContext,
    ) -> Result<PickupStatus, GatewayError> {
        match ProductionScheduler::pick_up(self, serial_number).await {
            Ok(robot) => Ok(PickupStatus::Ready(robot)),
            Err(FactoryError::NotReady(_)) => Ok(PickupStatus::NotReady),
            Err(FactoryError::NotFound(_)) => Ok(PickupStatus::Unknown),
            Err(FactoryError::ProductionFailed { failure, .. }) => {
                Ok(PickupStatus::Failed(failure.to_string()))
            }
            Err(other) => Err(GatewayError::Transport(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for a remote factory service.
#[derive(Clone)]
pub struct HttpFactoryGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFactoryGateway {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FactoryGateway for HttpFactoryGateway {
    #[instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    async fn start_build(
        &self,
        robot_type_id: &str,
        color: Color,
        ctx: &CorrelationContext,
    ) -> Result<SerialNumber, GatewayError> {
        debug!("Sending request");
        let response = self
            .http
            .post(format!("{}/factory/buildrobot", self.base_url))
            .query(&[("robotTypeId", robot_type_id), ("color", color.as_str())])
            .header(TRACEPARENT_HEADER, ctx.child().to_traceparent())
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        match response.status() {
            StatusCode::ACCEPTED | StatusCode::OK => {
                let receipt: BuildReceipt = response
                    .json()
                    .await
                    .map_err(|e| GatewayError::Malformed(e.to_string()))?;
                Ok(receipt.serial_number)
            }
            StatusCode::SERVICE_UNAVAILABLE => Err(GatewayError::Overloaded),
            status => Err(rejected(status, response).await),
        }
    }

    #[instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    async fn pick_up(
        &self,
        serial_number: SerialNumber,
        ctx: &CorrelationContext,
    ) -> Result<PickupStatus, GatewayError> {
        let response = self
            .http
            .get(format!("{}/factory/pickup", self.base_url))
            .query(&[("serialNumber", serial_number.to_string())])
            .header(TRACEPARENT_HEADER, ctx.child().to_traceparent())
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let robot: Robot = response
                    .json()
                    .await
                    .map_err(|e| GatewayError::Malformed(e.to_string()))?;
                if robot.serial_number != serial_number {
                    return Err(GatewayError::Malformed(format!(
                        "asked for robot {serial_number}, got {}",
                        robot.serial_number
                    )));
                }
                Ok(PickupStatus::Ready(robot))
            }
            StatusCode::NO_CONTENT => Ok(PickupStatus::NotReady),
            StatusCode::NOT_FOUND => Ok(PickupStatus::Unknown),
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body: ErrorBody = response
                    .json()
                    .await
                    .map_err(|e| GatewayError::Malformed(e.to_string()))?;
                Ok(PickupStatus::Failed(body.error))
            }
            status => Err(rejected(status, response).await),
        }
    }
}

async fn rejected(status: StatusCode, response: reqwest::Response) -> GatewayError {
    GatewayError::Rejected {
        status: status.as_u16(),
        body: response.text().await.unwrap_or_default(),
    }
}
