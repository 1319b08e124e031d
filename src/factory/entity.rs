//! Production jobs and their stage machine.
//!
//! ```text
//! Queued -> Chassis -> Painting -> Completed(robot)
//!    \________\___________\______> Failed(reason)
//! ```
//!
//! Terminal jobs are removed by pickup; a job that is not terminal refuses removal.

use super::error::{FactoryError, ProductionFailure};
use crate::model::{Color, Robot, SerialNumber};
use async_trait::async_trait;
use serde::Serialize;
use shop_kernel::StoreEntity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum JobStage {
    Queued,
    Chassis,
    Painting,
    Completed { robot: Robot },
    Failed { failure: ProductionFailure },
}

impl JobStage {
    pub fn name(&self) -> &'static str {
        match self {
            JobStage::Queued => "queued",
            JobStage::Chassis => "chassis",
            JobStage::Painting => "painting",
            JobStage::Completed { .. } => "completed",
            JobStage::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Completed { .. } | JobStage::Failed { .. })
    }
}

/// One robot on its way through a production line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionJob {
    pub serial_number: SerialNumber,
    pub robot_type_id: String,
    pub color: Color,
    pub stage: JobStage,
}

#[derive(Debug, Clone)]
pub struct JobCreate {
    pub robot_type_id: String,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub enum JobUpdate {
    StartChassis,
    StartPainting,
    Finish,
    Fail(ProductionFailure),
}

impl JobUpdate {
    fn target(&self) -> &'static str {
        match self {
            JobUpdate::StartChassis => "chassis",
            JobUpdate::StartPainting => "painting",
            JobUpdate::Finish => "completed",
            JobUpdate::Fail(_) => "failed",
        }
    }
}

#[async_trait]
impl StoreEntity for ProductionJob {
    type Id = SerialNumber;
    type Create = JobCreate;
    type Update = JobUpdate;
    type Context = ();
    type Error = FactoryError;

    fn from_create_params(id: SerialNumber, params: JobCreate) -> Result<Self, FactoryError> {
        Ok(Self {
            serial_number: id,
            robot_type_id: params.robot_type_id,
            color: params.color,
            stage: JobStage::Queued,
        })
    }

    async fn on_update(&mut self, update: JobUpdate, _ctx: &()) -> Result<(), FactoryError> {
        let to = update.target();
        self.stage = match (&self.stage, update) {
            (JobStage::Queued, JobUpdate::StartChassis) => JobStage::Chassis,
            (JobStage::Chassis, JobUpdate::StartPainting) => JobStage::Painting,
            (JobStage::Painting, JobUpdate::Finish) => JobStage::Completed {
                robot: Robot {
                    serial_number: self.serial_number,
                    robot_type_id: self.robot_type_id.clone(),
                    color: self.color,
                },
            },
            (stage, JobUpdate::Fail(failure)) if !stage.is_terminal() => {
                JobStage::Failed { failure }
            }
            (stage, _) => {
                return Err(FactoryError::InvalidTransition {
                    serial_number: self.serial_number,
                    from: stage.name(),
                    to,
                })
            }
        };
        Ok(())
    }

    async fn on_take(&self, _ctx: &()) -> Result<(), FactoryError> {
        if self.stage.is_terminal() {
            Ok(())
        } else {
            Err(FactoryError::NotReady(self.serial_number))
        }
    }
}
