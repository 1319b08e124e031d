//! # Production Scheduler
//!
//! Accepts build requests, runs each one on a production line and holds the finished robot
//! until it is picked up.
//!
//! Admission is reserved before a serial number is assigned, so a request rejected with
//! `CapacityExceeded` never creates a job. Every admitted job reaches a terminal stage,
//! including when its line panics.

use super::catalog::RobotCatalog;
use super::entity::{JobCreate, JobStage, JobUpdate, ProductionJob};
use super::error::{FactoryError, ProductionFailure};
use crate::config::FactoryConfig;
use crate::model::{Color, Robot, RobotType, SerialNumber};
use futures::FutureExt;
use shop_kernel::{CorrelationContext, RecordStore, StoreClient, StoreError, WorkerPool};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

/// Fixed latencies of each production stage.
#[derive(Debug, Clone, Copy)]
pub struct ProductionTimings {
    pub chassis: Duration,
    pub roll_over: Duration,
    pub painting: Duration,
}

impl From<&FactoryConfig> for ProductionTimings {
    fn from(config: &FactoryConfig) -> Self {
        Self {
            chassis: Duration::from_millis(config.chassis_ms),
            roll_over: Duration::from_millis(config.roll_over_ms),
            painting: Duration::from_millis(config.painting_ms),
        }
    }
}

pub struct ProductionScheduler {
    jobs: StoreClient<ProductionJob>,
    lines: WorkerPool,
    catalog: Arc<RobotCatalog>,
    timings: ProductionTimings,
}

impl ProductionScheduler {
    /// Creates the scheduler and the job store it depends on. The store must be spawned
    /// with `store.run(())`.
    pub fn new(
        config: &FactoryConfig,
        catalog: RobotCatalog,
    ) -> (RecordStore<ProductionJob>, ProductionScheduler) {
        let (store, jobs) = RecordStore::new(256);
        let scheduler = Self {
            jobs,
            lines: WorkerPool::new("production-lines", config.production_lines, config.queue_depth),
            catalog: Arc::new(catalog),
            timings: ProductionTimings::from(config),
        };
        (store, scheduler)
    }

    /// Admits a build request and returns the new job's serial number.
    #[instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn start_building_robot(
        &self,
        robot_type_id: &str,
        color: Color,
        ctx: &CorrelationContext,
    ) -> Result<SerialNumber, FactoryError> {
        let ticket = self.lines.try_reserve().map_err(|e| {
            warn!(error = %e, "Build request rejected");
            FactoryError::CapacityExceeded(e)
        })?;

        let serial_number = self
            .jobs
            .create(JobCreate {
                robot_type_id: robot_type_id.to_string(),
                color,
            })
            .await
            .map_err(map_store_error)?;

        let line = ProductionLine {
            jobs: self.jobs.clone(),
            catalog: Arc::clone(&self.catalog),
            timings: self.timings,
        };
        let span = info_span!(
            "production",
            serial_number = %serial_number,
            robot_type_id,
            %color,
            trace_id = %ctx.trace_id()
        );
        ticket
            .submit(line.produce(serial_number).instrument(span))
            .map_err(FactoryError::CapacityExceeded)?;

        info!(%serial_number, "Build started");
        Ok(serial_number)
    }

    /// Removes and returns a finished robot.
    #[instrument(skip(self))]
    pub async fn pick_up(&self, serial_number: SerialNumber) -> Result<Robot, FactoryError> {
        let job = self.jobs.take(serial_number).await.map_err(|e| match e {
            StoreError::NotFound(_) => FactoryError::NotFound(serial_number),
            other => map_store_error(other),
        })?;
        match job.stage {
            JobStage::Completed { robot } => {
                info!("Robot picked up");
                Ok(robot)
            }
            JobStage::Failed { failure } => Err(FactoryError::ProductionFailed {
                serial_number,
                failure,
            }),
            // Take only succeeds on terminal jobs.
            other => Err(FactoryError::Store(format!(
                "took job {serial_number} in stage {}",
                other.name()
            ))),
        }
    }

    /// Robots finished and waiting for pickup.
    pub async fn completed_robots(&self) -> Result<Vec<Robot>, FactoryError> {
        let mut robots: Vec<Robot> = self
            .jobs
            .list()
            .await
            .map_err(map_store_error)?
            .into_iter()
            .filter_map(|job| match job.stage {
                JobStage::Completed { robot } => Some(robot),
                _ => None,
            })
            .collect();
        robots.sort_by_key(|r| r.serial_number);
        Ok(robots)
    }

    /// Serial numbers of jobs not yet finished.
    pub async fn in_production(&self) -> Result<Vec<SerialNumber>, FactoryError> {
        let mut serials: Vec<SerialNumber> = self
            .jobs
            .list()
            .await
            .map_err(map_store_error)?
            .into_iter()
            .filter(|job| !job.stage.is_terminal())
            .map(|job| job.serial_number)
            .collect();
        serials.sort();
        Ok(serials)
    }

    pub fn robot_types(&self) -> Vec<RobotType> {
        self.catalog.robot_types()
    }

    pub fn robot_type(&self, robot_type_id: &str) -> Result<RobotType, FactoryError> {
        self.catalog
            .robot_type(robot_type_id)
            .cloned()
            .ok_or_else(|| FactoryError::UnknownRobotType(robot_type_id.to_string()))
    }

    /// Jobs admitted to the production lines and not yet finished.
    pub fn load(&self) -> usize {
        self.lines.in_flight()
    }

    /// Stops admitting work and waits for the lines to finish what they hold.
    pub async fn shutdown(&self) {
        self.lines.shutdown().await;
    }
}

fn map_store_error(e: StoreError<FactoryError>) -> FactoryError {
    match e {
        StoreError::Entity(e) => e,
        other => FactoryError::Store(other.to_string()),
    }
}

/// What one production line needs to build one robot.
struct ProductionLine {
    jobs: StoreClient<ProductionJob>,
    catalog: Arc<RobotCatalog>,
    timings: ProductionTimings,
}

impl ProductionLine {
    async fn produce(self, serial_number: SerialNumber) {
        let outcome = AssertUnwindSafe(self.build(serial_number))
            .catch_unwind()
            .await;
        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => ProductionFailure::Aborted {
                reason: e.to_string(),
            },
            Err(_) => ProductionFailure::Aborted {
                reason: "production line panicked".into(),
            },
        };
        error!(%failure, "Production failed");
        if let Err(e) = self.jobs.update(serial_number, JobUpdate::Fail(failure)).await {
            error!(error = %e, "Could not record production failure");
        }
    }

    async fn build(&self, serial_number: SerialNumber) -> Result<(), FactoryError> {
        let job = self
            .jobs
            .update(serial_number, JobUpdate::StartChassis)
            .await
            .map_err(map_store_error)?;

        if !self.catalog.contains(&job.robot_type_id) {
            warn!("Unknown robot type");
            let failure = ProductionFailure::UnknownRobotType {
                robot_type_id: job.robot_type_id,
            };
            self.jobs
                .update(serial_number, JobUpdate::Fail(failure))
                .await
                .map_err(map_store_error)?;
            return Ok(());
        }

        debug!("Building chassis");
        tokio::time::sleep(self.timings.chassis).await;
        tokio::time::sleep(self.timings.roll_over).await;

        self.jobs
            .update(serial_number, JobUpdate::StartPainting)
            .await
            .map_err(map_store_error)?;
        debug!("Painting");
        tokio::time::sleep(self.timings.painting).await;

        self.jobs
            .update(serial_number, JobUpdate::Finish)
            .await
            .map_err(map_store_error)?;
        info!("Robot completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(production_lines: usize, queue_depth: usize) -> FactoryConfig {
        FactoryConfig {
            production_lines,
            queue_depth,
            chassis_ms: 1,
            roll_over_ms: 0,
            painting_ms: 1,
            ..FactoryConfig::default()
        }
    }

    fn start(config: &FactoryConfig) -> Arc<ProductionScheduler> {
        let (store, scheduler) = ProductionScheduler::new(config, RobotCatalog::default());
        tokio::spawn(store.run(()));
        Arc::new(scheduler)
    }

    async fn wait_for_pickup(
        scheduler: &ProductionScheduler,
        serial: SerialNumber,
    ) -> Result<Robot, FactoryError> {
        for _ in 0..500 {
            match scheduler.pick_up(serial).await {
                Err(FactoryError::NotReady(_)) => {
                    tokio::time::sleep(Duration::from_millis(2)).await
                }
                other => return other,
            }
        }
        panic!("job {serial} never finished");
    }

    #[tokio::test]
    async fn builds_and_hands_over_a_robot_once() {
        let scheduler = start(&config(2, 4));
        let ctx = CorrelationContext::new_root();
        let serial = scheduler
            .start_building_robot("T-800", Color::Red, &ctx)
            .await
            .unwrap();

        let robot = wait_for_pickup(&scheduler, serial).await.unwrap();
        assert_eq!(robot.serial_number, serial);
        assert_eq!(robot.robot_type_id, "T-800");
        assert_eq!(robot.color, Color::Red);

        assert_eq!(
            scheduler.pick_up(serial).await,
            Err(FactoryError::NotFound(serial))
        );
    }

    #[tokio::test]
    async fn serial_numbers_are_unique_and_increasing_under_concurrency() {
        let scheduler = start(&config(8, 64));
        let ctx = CorrelationContext::new_root();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let scheduler = Arc::clone(&scheduler);
            handles.push(tokio::spawn(async move {
                scheduler
                    .start_building_robot("BB-8", Color::Blue, &ctx)
                    .await
                    .unwrap()
            }));
        }
        let mut serials = Vec::new();
        for handle in handles {
            serials.push(handle.await.unwrap());
        }
        serials.sort();
        serials.dedup();
        assert_eq!(serials.len(), 32);

        // Sequential callers see strictly increasing numbers.
        let a = scheduler
            .start_building_robot("BB-8", Color::Blue, &ctx)
            .await
            .unwrap();
        let b = scheduler
            .start_building_robot("BB-8", Color::Blue, &ctx)
            .await
            .unwrap();
        assert!(a < b);
        assert!(serials.iter().all(|s| *s < a));
    }

    #[tokio::test]
    async fn rejects_requests_beyond_lines_plus_queue() {
        let slow = FactoryConfig {
            chassis_ms: 5_000,
            ..config(1, 2)
        };
        let scheduler = start(&slow);
        let ctx = CorrelationContext::new_root();

        for _ in 0..3 {
            scheduler
                .start_building_robot("EVE", Color::Green, &ctx)
                .await
                .unwrap();
        }
        let err = scheduler
            .start_building_robot("EVE", Color::Green, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, FactoryError::CapacityExceeded(_)));
        // The rejected request never became a job.
        assert_eq!(scheduler.in_production().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_robot_type_fails_the_job() {
        let scheduler = start(&config(1, 1));
        let ctx = CorrelationContext::new_root();
        let serial = scheduler
            .start_building_robot("HAL-9000", Color::Black, &ctx)
            .await
            .unwrap();

        let err = wait_for_pickup(&scheduler, serial).await.unwrap_err();
        assert_eq!(
            err,
            FactoryError::ProductionFailed {
                serial_number: serial,
                failure: ProductionFailure::UnknownRobotType {
                    robot_type_id: "HAL-9000".into()
                }
            }
        );
    }

    #[tokio::test]
    async fn completed_robots_wait_for_pickup() {
        let scheduler = start(&config(2, 2));
        let ctx = CorrelationContext::new_root();
        let serial = scheduler
            .start_building_robot("Baymax", Color::White, &ctx)
            .await
            .unwrap();

        for _ in 0..500 {
            if scheduler.in_production().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        let waiting = scheduler.completed_robots().await.unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].serial_number, serial);
    }
}
