//! The order ledger record.
//!
//! Each order id maps to one record that is either `Active` (its fulfillment job is
//! running) or `Completed` (holding the realized order until pickup). Completion replaces
//! the state of that single record, so an order can never sit in both tables.

use super::OrderError;
use crate::model::{Order, OrderId, RealizedOrder};
use async_trait::async_trait;
use shop_kernel::StoreEntity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRecord {
    Active(Order),
    Completed(RealizedOrder),
}

impl OrderRecord {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderRecord::Active(order) => order.order_id,
            OrderRecord::Completed(realized) => realized.order_id(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum OrderTransition {
    Complete(RealizedOrder),
}

#[async_trait]
impl StoreEntity for OrderRecord {
    type Id = OrderId;
    type Create = Order;
    type Update = OrderTransition;
    type Context = ();
    type Error = OrderError;

    /// Ids come from the orchestrator, so records enter through `insert`; `create` keeps
    /// the order's own id.
    fn from_create_params(_id: OrderId, order: Order) -> Result<Self, OrderError> {
        Ok(OrderRecord::Active(order))
    }

    async fn on_update(&mut self, update: OrderTransition, _ctx: &()) -> Result<(), OrderError> {
        let OrderTransition::Complete(realized) = update;
        match self {
            OrderRecord::Completed(done) => Err(OrderError::AlreadyCompleted(done.order_id())),
            OrderRecord::Active(order) if order.order_id != realized.order_id() => {
                Err(OrderError::Validation(format!(
                    "realized order {} does not belong to order {}",
                    realized.order_id(),
                    order.order_id
                )))
            }
            OrderRecord::Active(_) => {
                *self = OrderRecord::Completed(realized);
                Ok(())
            }
        }
    }

    async fn on_take(&self, _ctx: &()) -> Result<(), OrderError> {
        match self {
            OrderRecord::Active(order) => Err(OrderError::NotReady(order.order_id)),
            OrderRecord::Completed(_) => Ok(()),
        }
    }
}
