use crate::model::{Order, OrderId, RealizedOrder};
use crate::order_actor::{OrderError, OrderRecord, OrderTransition};
use async_trait::async_trait;
use shop_kernel::{RecordClient, StoreClient, StoreError};
use tracing::{debug, instrument};

/// Client for the order ledger.
///
/// The ledger keeps one record per order id; the active and completed tables are views
/// over that record's state.
#[derive(Clone)]
pub struct OrderClient {
    inner: StoreClient<OrderRecord>,
}

impl OrderClient {
    pub fn new(inner: StoreClient<OrderRecord>) -> Self {
        Self { inner }
    }

    /// Adds a freshly dispatched order to the active table.
    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    pub async fn open(&self, order: Order) -> Result<(), OrderError> {
        debug!("Sending request");
        let order_id = order.order_id;
        self.inner
            .insert(order_id, OrderRecord::Active(order))
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => OrderError::Duplicate(order_id),
                other => Self::map_error(other),
            })
    }

    /// Moves an order from the active to the completed table.
    #[instrument(skip(self, realized), fields(order_id = %realized.order_id()))]
    pub async fn complete(&self, realized: RealizedOrder) -> Result<(), OrderError> {
        debug!("Sending request");
        let order_id = realized.order_id();
        self.inner
            .update(order_id, OrderTransition::Complete(realized))
            .await
            .map(|_| ())
            .map_err(|e| Self::not_found_as(e, order_id))
    }

    pub async fn active_orders(&self) -> Result<Vec<Order>, OrderError> {
        let mut orders: Vec<Order> = self
            .list()
            .await?
            .into_iter()
            .filter_map(|record| match record {
                OrderRecord::Active(order) => Some(order),
                OrderRecord::Completed(_) => None,
            })
            .collect();
        orders.sort_by_key(|o| o.order_id);
        Ok(orders)
    }

    pub async fn active_order(&self, id: OrderId) -> Result<Order, OrderError> {
        match self.get(id).await? {
            Some(OrderRecord::Active(order)) => Ok(order),
            _ => Err(OrderError::NotFound(id)),
        }
    }

    pub async fn completed_orders(&self) -> Result<Vec<RealizedOrder>, OrderError> {
        let mut orders: Vec<RealizedOrder> = self
            .list()
            .await?
            .into_iter()
            .filter_map(|record| match record {
                OrderRecord::Completed(realized) => Some(realized),
                OrderRecord::Active(_) => None,
            })
            .collect();
        orders.sort_by_key(|o| o.order_id());
        Ok(orders)
    }

    pub async fn completed_order(&self, id: OrderId) -> Result<RealizedOrder, OrderError> {
        match self.get(id).await? {
            Some(OrderRecord::Completed(realized)) => Ok(realized),
            _ => Err(OrderError::NotFound(id)),
        }
    }

    /// Removes and returns a realized order.
    #[instrument(skip(self))]
    pub async fn pick_up(&self, id: OrderId) -> Result<RealizedOrder, OrderError> {
        debug!("Sending request");
        match self
            .inner
            .take(id)
            .await
            .map_err(|e| Self::not_found_as(e, id))?
        {
            OrderRecord::Completed(realized) => Ok(realized),
            // Take is vetoed while the order is active.
            OrderRecord::Active(_) => Err(OrderError::NotReady(id)),
        }
    }

    fn not_found_as(e: StoreError<OrderError>, id: OrderId) -> OrderError {
        match e {
            StoreError::NotFound(_) => OrderError::NotFound(id),
            other => Self::map_error(other),
        }
    }
}

#[async_trait]
impl RecordClient<OrderRecord> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &StoreClient<OrderRecord> {
        &self.inner
    }

    fn map_error(e: StoreError<OrderError>) -> OrderError {
        match e {
            StoreError::Entity(e) => e,
            other => OrderError::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, CustomerId, LineItem};
    use crate::order_actor::FulfillmentError;
    use shop_kernel::mock::create_mock_store;

    fn order(id: u64) -> Order {
        Order {
            order_id: OrderId(id),
            customer_id: CustomerId(1),
            placement_time: chrono::Utc::now(),
            line_items: vec![LineItem::new("R2-D2", Color::Blue)],
        }
    }

    #[tokio::test]
    async fn tables_are_views_of_one_record() {
        let (mock, inner) = create_mock_store::<OrderRecord>();
        let done = RealizedOrder::failure(
            order(2),
            FulfillmentError::Timeout {
                waiting_for: "order 2".into(),
            },
        );
        mock.expect_list().return_ok(vec![
            OrderRecord::Completed(done.clone()),
            OrderRecord::Active(order(1)),
        ]);
        mock.expect_list().return_ok(vec![
            OrderRecord::Completed(done.clone()),
            OrderRecord::Active(order(1)),
        ]);
        mock.expect_get(OrderId(1))
            .return_ok(Some(OrderRecord::Active(order(1))));

        let client = OrderClient::new(inner);
        assert_eq!(client.active_orders().await.unwrap(), vec![order(1)]);
        assert_eq!(client.completed_orders().await.unwrap(), vec![done]);
        assert_eq!(
            client.completed_order(OrderId(1)).await,
            Err(OrderError::NotFound(OrderId(1)))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn duplicate_open_is_reported() {
        let (mock, inner) = create_mock_store::<OrderRecord>();
        mock.expect_insert(OrderId(7))
            .return_err(StoreError::Duplicate("7".into()));

        let client = OrderClient::new(inner);
        assert_eq!(
            client.open(order(7)).await,
            Err(OrderError::Duplicate(OrderId(7)))
        );
        mock.verify();
    }
}
