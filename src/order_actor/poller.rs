//! # Completion Poller
//!
//! Waits for one robot by polling the factory's pickup endpoint on a fixed cadence. The
//! poller owns its serial number for its whole life: it stops calling the factory as soon
//! as the robot is handed over or the job is known to have failed.
//!
//! Every pickup call, across all pollers of the service, first takes a slot from a shared
//! semaphore, so a burst of orders cannot flood the factory.

use super::FulfillmentError;
use crate::clients::{FactoryGateway, PickupStatus};
use crate::config::PollConfig;
use crate::model::{Robot, SerialNumber};
use shop_kernel::CorrelationContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_transport_errors: u32,
}

impl From<&PollConfig> for PollSettings {
    fn from(config: &PollConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
            max_transport_errors: config.max_transport_errors,
        }
    }
}

#[derive(Clone)]
pub struct CompletionPoller {
    factory: Arc<dyn FactoryGateway>,
    settings: PollSettings,
    slots: Arc<Semaphore>,
}

impl CompletionPoller {
    pub fn new(factory: Arc<dyn FactoryGateway>, settings: PollSettings, slots: usize) -> Self {
        Self {
            factory,
            settings,
            slots: Arc::new(Semaphore::new(slots)),
        }
    }

    /// Polls until the robot is ready, the job fails, or the attempts run out.
    #[instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn await_robot(
        &self,
        serial_number: SerialNumber,
        ctx: &CorrelationContext,
    ) -> Result<Robot, FulfillmentError> {
        tokio::time::sleep(self.settings.initial_delay).await;

        let mut transport_errors = 0;
        for attempt in 1..=self.settings.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.settings.interval).await;
            }

            let status = {
                let _slot = self.slots.acquire().await.map_err(|_| FulfillmentError::Aborted {
                    reason: "poller slots closed".into(),
                })?;
                self.factory.pick_up(serial_number, &ctx.child()).await
            };

            match status {
                Ok(PickupStatus::Ready(robot)) => {
                    info!(attempt, "Robot picked up");
                    return Ok(robot);
                }
                Ok(PickupStatus::NotReady) => {
                    debug!(attempt, "Robot not ready");
                    transport_errors = 0;
                }
                Ok(PickupStatus::Failed(reason)) => {
                    warn!(%reason, "Production failed");
                    return Err(FulfillmentError::ProductionFailed {
                        serial_number,
                        reason,
                    });
                }
                // The previous pickup may have handed the robot over on a reply that never
                // arrived.
                Ok(PickupStatus::Unknown) if transport_errors > 0 => {
                    warn!(transport_errors, "Serial unknown after a failed pickup");
                    return Err(FulfillmentError::TransportError {
                        serial_number,
                        reason: "pickup reply lost; the factory no longer holds the robot".into(),
                    });
                }
                Ok(PickupStatus::Unknown) => {
                    return Err(FulfillmentError::ProductionFailed {
                        serial_number,
                        reason: "factory does not know this serial number".into(),
                    });
                }
                Err(e) => {
                    transport_errors += 1;
                    warn!(attempt, transport_errors, error = %e, "Pickup failed");
                    if transport_errors >= self.settings.max_transport_errors {
                        return Err(FulfillmentError::TransportError {
                            serial_number,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        warn!(attempts = self.settings.max_attempts, "Gave up waiting for robot");
        Err(FulfillmentError::Timeout {
            waiting_for: format!("robot {serial_number}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::GatewayError;
    use crate::model::Color;
    use crate::order_actor::fakes::ScriptedFactory;

    fn settings(max_attempts: u32) -> PollSettings {
        PollSettings {
            initial_delay: Duration::ZERO,
            interval: Duration::from_millis(1),
            max_attempts,
            max_transport_errors: 3,
        }
    }

    async fn started(factory: &ScriptedFactory) -> SerialNumber {
        factory
            .start_build("Wall-E", Color::Yellow, &CorrelationContext::new_root())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn stops_polling_once_the_robot_is_ready() {
        let factory = Arc::new(ScriptedFactory::default());
        let serial = started(&factory).await;
        factory.script_pickups([Ok(PickupStatus::NotReady), Ok(PickupStatus::NotReady)]);

        let poller = CompletionPoller::new(factory.clone(), settings(10), 1);
        let robot = poller
            .await_robot(serial, &CorrelationContext::new_root())
            .await
            .unwrap();

        assert_eq!(robot.serial_number, serial);
        assert_eq!(robot.color, Color::Yellow);
        assert_eq!(factory.pickup_calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let factory = Arc::new(ScriptedFactory::default());
        let serial = started(&factory).await;
        factory.script_pickups(std::iter::repeat(Ok(PickupStatus::NotReady)).take(10));

        let poller = CompletionPoller::new(factory.clone(), settings(4), 1);
        let err = poller
            .await_robot(serial, &CorrelationContext::new_root())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FulfillmentError::Timeout {
                waiting_for: format!("robot {serial}")
            }
        );
        assert_eq!(factory.pickup_calls(), 4);
    }

    #[tokio::test]
    async fn only_consecutive_transport_errors_count() {
        let factory = Arc::new(ScriptedFactory::default());
        let serial = started(&factory).await;
        let down = || Err(GatewayError::Transport("connection reset".into()));
        factory.script_pickups([
            down(),
            down(),
            Ok(PickupStatus::NotReady),
            down(),
            down(),
            down(),
        ]);

        let poller = CompletionPoller::new(factory.clone(), settings(10), 1);
        let err = poller
            .await_robot(serial, &CorrelationContext::new_root())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FulfillmentError::TransportError { serial_number, .. } if serial_number == serial
        ));
        assert_eq!(factory.pickup_calls(), 6);
    }

    #[tokio::test]
    async fn unknown_serial_after_a_lost_reply_is_a_transport_error() {
        let factory = Arc::new(ScriptedFactory::default());
        let serial = started(&factory).await;
        factory.script_pickups([
            Err(GatewayError::Transport("reply timed out".into())),
            Ok(PickupStatus::Unknown),
        ]);

        let poller = CompletionPoller::new(factory.clone(), settings(10), 1);
        let err = poller
            .await_robot(serial, &CorrelationContext::new_root())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FulfillmentError::TransportError { serial_number, .. } if serial_number == serial
        ));
        assert_eq!(factory.pickup_calls(), 2);
    }

    #[tokio::test]
    async fn unknown_serial_is_a_production_failure() {
        let factory = Arc::new(ScriptedFactory::default());
        let serial = started(&factory).await;
        factory.script_pickups([Ok(PickupStatus::NotReady), Ok(PickupStatus::Unknown)]);

        let poller = CompletionPoller::new(factory.clone(), settings(10), 1);
        let err = poller
            .await_robot(serial, &CorrelationContext::new_root())
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::ProductionFailed { .. }));
    }

    #[tokio::test]
    async fn failed_production_resolves_immediately() {
        let factory = Arc::new(ScriptedFactory::default());
        let serial = started(&factory).await;
        factory.script_pickups([Ok(PickupStatus::Failed("paint shop on fire".into()))]);

        let poller = CompletionPoller::new(factory.clone(), settings(10), 1);
        let err = poller
            .await_robot(serial, &CorrelationContext::new_root())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FulfillmentError::ProductionFailed {
                serial_number: serial,
                reason: "paint shop on fire".into()
            }
        );
        assert_eq!(factory.pickup_calls(), 1);
    }
}
