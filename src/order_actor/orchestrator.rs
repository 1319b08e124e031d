//! # Order Orchestrator
//!
//! Creates orders, hands each one to a bounded pool of dispatcher workers and answers
//! questions about the ledger.
//!
//! A dispatcher slot is reserved before the order enters the ledger, so an order rejected
//! with `Overloaded` is never visible in either table.

use super::dispatcher::LineItemDispatcher;
use super::entity::OrderRecord;
use super::fulfillment::FulfillmentJob;
use super::poller::{CompletionPoller, PollSettings};
use super::validator::CustomerValidator;
use super::OrderError;
use crate::clients::{CustomerDirectory, FactoryGateway, OrderClient};
use crate::config::OrderServiceConfig;
use crate::model::{CustomerId, LineItem, Order, OrderId, RealizedOrder};
use chrono::Utc;
use shop_kernel::{CorrelationContext, RecordStore, WorkerPool};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, instrument, warn, Instrument};

pub struct OrderOrchestrator {
    next_order_id: AtomicU64,
    ledger: OrderClient,
    dispatchers: WorkerPool,
    validator: CustomerValidator,
    line_items: LineItemDispatcher,
    order_deadline: Duration,
}

impl OrderOrchestrator {
    /// Creates the orchestrator and its order ledger. The ledger must be spawned with
    /// `store.run(())`.
    pub fn new(
        config: &OrderServiceConfig,
        customers: Arc<dyn CustomerDirectory>,
        factory: Arc<dyn FactoryGateway>,
    ) -> (RecordStore<OrderRecord>, OrderOrchestrator) {
        let (store, ledger) = super::new();
        let poller = CompletionPoller::new(
            Arc::clone(&factory),
            PollSettings::from(&config.poll),
            config.poll.poller_slots,
        );
        let orchestrator = Self {
            next_order_id: AtomicU64::new(1),
            ledger,
            dispatchers: WorkerPool::new("order-dispatchers", config.dispatchers, config.queue_depth),
            validator: CustomerValidator::new(customers),
            line_items: LineItemDispatcher::new(factory, poller),
            order_deadline: config.order_deadline(),
        };
        (store, orchestrator)
    }

    /// Assigns a fresh id and placement time. Nothing is validated here.
    pub fn create_order(&self, customer_id: CustomerId, line_items: Vec<LineItem>) -> Order {
        let order_id = OrderId(self.next_order_id.fetch_add(1, Ordering::SeqCst));
        Order {
            order_id,
            customer_id,
            placement_time: Utc::now(),
            line_items,
        }
    }

    /// Queues the order's fulfillment job.
    #[instrument(skip(self, order, ctx), fields(order_id = %order.order_id, trace_id = %ctx.trace_id()))]
    pub async fn dispatch_order(
        &self,
        order: Order,
        ctx: &CorrelationContext,
    ) -> Result<(), OrderError> {
        let ticket = self.dispatchers.try_reserve().map_err(|e| {
            warn!(error = %e, "Order rejected");
            OrderError::Overloaded(e)
        })?;

        let order_id = order.order_id;
        match self.ledger.open(order.clone()).await {
            Ok(()) => {}
            Err(e @ OrderError::Duplicate(_)) => {
                error!(error = %e, "Order id assigned twice, aborting");
                std::process::abort();
            }
            Err(e) => return Err(e),
        }

        let span = info_span!(
            "fulfillment",
            %order_id,
            customer_id = %order.customer_id,
            trace_id = %ctx.trace_id()
        );
        let job = FulfillmentJob {
            order,
            ctx: ctx.child(),
            validator: self.validator.clone(),
            dispatcher: self.line_items.clone(),
            ledger: self.ledger.clone(),
            deadline: self.order_deadline,
        };
        // The ticket holds a reserved slot, so this only fails once the pool is closed.
        ticket
            .submit(job.run().instrument(span))
            .map_err(OrderError::Overloaded)?;

        info!("Order dispatched");
        Ok(())
    }

    /// Creates and dispatches an order in one step.
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        line_items: Vec<LineItem>,
        ctx: &CorrelationContext,
    ) -> Result<Order, OrderError> {
        let order = self.create_order(customer_id, line_items);
        self.dispatch_order(order.clone(), ctx).await?;
        Ok(order)
    }

    pub async fn active_orders(&self) -> Result<Vec<Order>, OrderError> {
        self.ledger.active_orders().await
    }

    pub async fn active_order(&self, id: OrderId) -> Result<Order, OrderError> {
        self.ledger.active_order(id).await
    }

    pub async fn completed_orders(&self) -> Result<Vec<RealizedOrder>, OrderError> {
        self.ledger.completed_orders().await
    }

    pub async fn completed_order(&self, id: OrderId) -> Result<RealizedOrder, OrderError> {
        self.ledger.completed_order(id).await
    }

    /// Removes and returns a realized order. Fails with `NotReady` while the order is
    /// still running and `NotFound` once it has been picked up.
    pub async fn pick_up(&self, id: OrderId) -> Result<RealizedOrder, OrderError> {
        self.ledger.pick_up(id).await
    }

    /// Fulfillment jobs admitted and not yet finished.
    pub fn load(&self) -> usize {
        self.dispatchers.in_flight()
    }

    /// Stops admitting orders and waits for the running jobs to finish.
    pub async fn shutdown(&self) {
        self.dispatchers.shutdown().await;
    }
}
