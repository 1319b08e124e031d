//! A factory with scripted answers, for tests of the order side.

use crate::clients::{FactoryGateway, GatewayError, PickupStatus};
use crate::model::{Color, LineItem, Robot, SerialNumber};
use async_trait::async_trait;
use shop_kernel::CorrelationContext;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Builds instantly. Pickups return the scripted replies first, then the built robot.
#[derive(Default)]
pub(crate) struct ScriptedFactory {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_serial: u64,
    built: HashMap<SerialNumber, LineItem>,
    refused: HashMap<String, GatewayError>,
    pickups: VecDeque<Result<PickupStatus, GatewayError>>,
    pickup_calls: usize,
    swap_colors: bool,
}

impl ScriptedFactory {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Every build of `robot_type_id` fails with `error`.
    pub fn refuse(&self, robot_type_id: &str, error: GatewayError) {
        self.state().refused.insert(robot_type_id.to_string(), error);
    }

    pub fn script_pickups(
        &self,
        replies: impl IntoIterator<Item = Result<PickupStatus, GatewayError>>,
    ) {
        self.state().pickups.extend(replies);
    }

    /// Hands over robots painted in the wrong color.
    pub fn swap_colors(&self) {
        self.state().swap_colors = true;
    }

    pub fn pickup_calls(&self) -> usize {
        self.state().pickup_calls
    }
}

#[async_trait]
impl FactoryGateway for ScriptedFactory {
    async fn start_build(
        &self,
        robot_type_id: &str,
        color: Color,
        _ctx: &CorrelationContext,
    ) -> Result<SerialNumber, GatewayError> {
        let mut state = self.state();
        if let Some(error) = state.refused.get(robot_type_id) {
            return Err(error.clone());
        }
        state.next_serial += 1;
        let serial = SerialNumber(state.next_serial);
        state.built.insert(serial, LineItem::new(robot_type_id, color));
        Ok(serial)
    }

    async fn pick_up(
        &self,
        serial_number: SerialNumber,
        _ctx: &CorrelationContext,
    ) -> Result<PickupStatus, GatewayError> {
        let mut state = self.state();
        state.pickup_calls += 1;
        if let Some(reply) = state.pickups.pop_front() {
            return reply;
        }
        let swap = state.swap_colors;
        Ok(match state.built.remove(&serial_number) {
            Some(item) => PickupStatus::Ready(Robot {
                serial_number,
                robot_type_id: item.robot_type_id,
                color: if swap { Color::Pink } else { item.color },
            }),
            None => PickupStatus::Unknown,
        })
    }
}
