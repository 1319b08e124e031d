use super::aggregator::ResultAggregator;
use super::dispatcher::LineItemDispatcher;
use super::validator::CustomerValidator;
use super::{FulfillmentError, OrderError};
use crate::clients::OrderClient;
use crate::model::{Customer, Order, Robot};
use shop_kernel::CorrelationContext;
use std::time::Duration;
use tracing::{error, info, warn};

/// One order's trip from validation to the completed table. Runs on a dispatcher worker.
pub(crate) struct FulfillmentJob {
    pub order: Order,
    pub ctx: CorrelationContext,
    pub validator: CustomerValidator,
    pub dispatcher: LineItemDispatcher,
    pub ledger: OrderClient,
    pub deadline: Duration,
}

impl FulfillmentJob {
    pub async fn run(self) {
        let outcome = match tokio::time::timeout(self.deadline, self.fulfil()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FulfillmentError::Timeout {
                waiting_for: format!("order {}", self.order.order_id),
            }),
        };

        match &outcome {
            Ok((_, robots)) => info!(robots = robots.len(), "Order fulfilled"),
            Err(e) => warn!(error = %e, "Order failed"),
        }

        let realized = ResultAggregator::realize(self.order, outcome);
        match self.ledger.complete(realized).await {
            Ok(()) => {}
            Err(e @ (OrderError::AlreadyCompleted(_)
            | OrderError::NotFound(_)
            | OrderError::Validation(_))) => {
                error!(error = %e, "Order ledger is inconsistent, aborting");
                std::process::abort();
            }
            Err(e) => error!(error = %e, "Could not record order outcome"),
        }
    }

    async fn fulfil(&self) -> Result<(Customer, Vec<Robot>), FulfillmentError> {
        let customer = self
            .validator
            .validate(self.order.customer_id, &self.ctx)
            .await?;
        let items = self.dispatcher.dispatch(&self.order, &self.ctx);
        let robots = ResultAggregator::join_all(items).await?;
        ResultAggregator::check_robots(&self.order, &robots)?;
        Ok((customer, robots))
    }
}
