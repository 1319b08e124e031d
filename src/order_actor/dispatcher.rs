use super::poller::CompletionPoller;
use super::FulfillmentError;
use crate::clients::{FactoryGateway, GatewayError};
use crate::model::{LineItem, Order, Robot};
use shop_kernel::CorrelationContext;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info_span, warn, Instrument};

/// Fans an order out into one factory build per line item.
#[derive(Clone)]
pub struct LineItemDispatcher {
    factory: Arc<dyn FactoryGateway>,
    poller: CompletionPoller,
}

impl LineItemDispatcher {
    pub fn new(factory: Arc<dyn FactoryGateway>, poller: CompletionPoller) -> Self {
        Self { factory, poller }
    }

    /// Spawns one task per line item. Each task starts a build and then polls for the
    /// robot. Dropping the returned set cancels every task still running.
    pub fn dispatch(
        &self,
        order: &Order,
        ctx: &CorrelationContext,
    ) -> JoinSet<Result<Robot, FulfillmentError>> {
        let mut items = JoinSet::new();
        for (index, item) in order.line_items.iter().cloned().enumerate() {
            let span = info_span!(
                "line_item",
                order_id = %order.order_id,
                index,
                robot_type_id = %item.robot_type_id,
                color = %item.color,
            );
            items.spawn(
                fulfil_item(
                    Arc::clone(&self.factory),
                    self.poller.clone(),
                    item,
                    ctx.child(),
                )
                .instrument(span),
            );
        }
        items
    }
}

async fn fulfil_item(
    factory: Arc<dyn FactoryGateway>,
    poller: CompletionPoller,
    item: LineItem,
    ctx: CorrelationContext,
) -> Result<Robot, FulfillmentError> {
    let serial_number = factory
        .start_build(&item.robot_type_id, item.color, &ctx)
        .await
        .map_err(|e| {
            warn!(error = %e, "Build request failed");
            match e {
                GatewayError::Overloaded => FulfillmentError::FactoryOverloaded {
                    robot_type_id: item.robot_type_id.clone(),
                    color: item.color,
                },
                other => FulfillmentError::InvalidSerial {
                    robot_type_id: item.robot_type_id.clone(),
                    color: item.color,
                    reason: other.to_string(),
                },
            }
        })?;
    poller.await_robot(serial_number, &ctx).await
}
