use crate::customer_actor::CustomerError;
use crate::model::{Customer, CustomerBatch, CustomerCreate, CustomerId, CustomerUpdate};
use async_trait::async_trait;
use reqwest::StatusCode;
use shop_kernel::{CorrelationContext, RecordClient, StoreClient, StoreError, TRACEPARENT_HEADER};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why a customer lookup did not produce a customer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    #[error("Customer {0} does not exist")]
    NotFound(CustomerId),
    #[error("Customer service unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed customer response: {0}")]
    Malformed(String),
}

/// Read access to the customer registry, wherever it lives.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn lookup(
        &self,
        id: CustomerId,
        ctx: &CorrelationContext,
    ) -> Result<Customer, LookupError>;
}

/// Client for the in-process customer store.
#[derive(Clone)]
pub struct CustomerClient {
    inner: StoreClient<Customer>,
}

impl CustomerClient {
    pub fn new(inner: StoreClient<Customer>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn register(&self, customer: CustomerCreate) -> Result<Customer, CustomerError> {
        debug!("Sending request");
        let id = self.inner.create(customer).await.map_err(Self::map_error)?;
        self.require(id).await
    }

    /// Registers every valid entry and skips the invalid ones.
    #[instrument(skip(self, batch), fields(size = batch.len()))]
    pub async fn register_batch(
        &self,
        batch: Vec<CustomerCreate>,
    ) -> Result<Vec<Customer>, CustomerError> {
        let mut registered = Vec::with_capacity(batch.len());
        for customer in batch {
            match self.register(customer).await {
                Ok(customer) => registered.push(customer),
                Err(CustomerError::Validation(reason)) => {
                    warn!(%reason, "Skipping invalid customer");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(registered)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: CustomerId,
        changes: CustomerUpdate,
    ) -> Result<Customer, CustomerError> {
        debug!("Sending request");
        self.inner
            .update(id, changes)
            .await
            .map_err(|e| Self::not_found_as(e, id))
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: CustomerId) -> Result<Customer, CustomerError> {
        debug!("Sending request");
        self.inner
            .take(id)
            .await
            .map_err(|e| Self::not_found_as(e, id))
    }

    /// Like `get`, but an absent customer is an error.
    pub async fn require(&self, id: CustomerId) -> Result<Customer, CustomerError> {
        self.get(id).await?.ok_or(CustomerError::NotFound(id))
    }

    fn not_found_as(e: StoreError<CustomerError>, id: CustomerId) -> CustomerError {
        match e {
            StoreError::NotFound(_) => CustomerError::NotFound(id),
            other => Self::map_error(other),
        }
    }
}

#[async_trait]
impl RecordClient<Customer> for CustomerClient {
    type Error = CustomerError;

    fn inner(&self) -> &StoreClient<Customer> {
        &self.inner
    }

    fn map_error(e: StoreError<CustomerError>) -> CustomerError {
        match e {
            StoreError::Entity(e) => e,
            other => CustomerError::Store(other.to_string()),
        }
    }
}

#[async_trait]
impl CustomerDirectory for CustomerClient {
    async fn lookup(
        &self,
        id: CustomerId,
        _ctx: &CorrelationContext,
    ) -> Result<Customer, LookupError> {
        match self.require(id).await {
            Ok(customer) => Ok(customer),
            Err(CustomerError::NotFound(id)) => Err(LookupError::NotFound(id)),
            Err(e) => Err(LookupError::Unavailable(e.to_string())),
        }
    }
}

/// Client for a remote customer service.
#[derive(Clone)]
pub struct HttpCustomerClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCustomerClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Registers a customer remotely. Used by the load generator.
    #[instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn register(
        &self,
        customer: &CustomerCreate,
        ctx: &CorrelationContext,
    ) -> Result<Customer, LookupError> {
        let response = self
            .http
            .put(format!("{}/customers/", self.base_url))
            .header(TRACEPARENT_HEADER, ctx.child().to_traceparent())
            .json(customer)
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;
        match response.status() {
            StatusCode::ACCEPTED | StatusCode::OK | StatusCode::CREATED => response
                .json()
                .await
                .map_err(|e| LookupError::Malformed(e.to_string())),
            status => Err(LookupError::Unavailable(format!(
                "register returned {status}"
            ))),
        }
    }

    /// Registers several customers in one call. Invalid entries are left out of the result.
    #[instrument(skip(self, customers, ctx), fields(size = customers.len(), trace_id = %ctx.trace_id()))]
    pub async fn register_batch(
        &self,
        customers: &[CustomerCreate],
        ctx: &CorrelationContext,
    ) -> Result<Vec<Customer>, LookupError> {
        let response = self
            .http
            .put(format!("{}/customers/batchadd/", self.base_url))
            .header(TRACEPARENT_HEADER, ctx.child().to_traceparent())
            .json(&CustomerBatch {
                customers: customers.to_vec(),
            })
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;
        match response.status() {
            StatusCode::ACCEPTED | StatusCode::OK => response
                .json()
                .await
                .map_err(|e| LookupError::Malformed(e.to_string())),
            status => Err(LookupError::Unavailable(format!(
                "batch register returned {status}"
            ))),
        }
    }

    #[instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn remove(&self, id: CustomerId, ctx: &CorrelationContext) -> Result<(), LookupError> {
        let response = self
            .http
            .delete(format!("{}/customers/{id}", self.base_url))
            .header(TRACEPARENT_HEADER, ctx.child().to_traceparent())
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;
        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(LookupError::NotFound(id)),
            status => Err(LookupError::Unavailable(format!("remove returned {status}"))),
        }
    }
}

#[async_trait]
impl CustomerDirectory for HttpCustomerClient {
    #[instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    async fn lookup(
        &self,
        id: CustomerId,
        ctx: &CorrelationContext,
    ) -> Result<Customer, LookupError> {
        debug!("Sending request");
        let response = self
            .http
            .get(format!("{}/customers/{id}", self.base_url))
            .header(TRACEPARENT_HEADER, ctx.child().to_traceparent())
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let customer: Customer = response
                    .json()
                    .await
                    .map_err(|e| LookupError::Malformed(e.to_string()))?;
                if customer.customer_id != id {
                    return Err(LookupError::Malformed(format!(
                        "asked for customer {id}, got {}",
                        customer.customer_id
                    )));
                }
                Ok(customer)
            }
            StatusCode::NOT_FOUND => Err(LookupError::NotFound(id)),
            status => Err(LookupError::Unavailable(format!(
                "unexpected status {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_kernel::mock::create_mock_store;

    fn ada(id: u64) -> Customer {
        Customer {
            customer_id: CustomerId(id),
            full_name: "Ada Lovelace".into(),
            phone_number: "555-1234".into(),
        }
    }

    #[tokio::test]
    async fn register_returns_the_stored_customer() {
        let (mock, inner) = create_mock_store::<Customer>();
        mock.expect_create().return_ok(CustomerId(5));
        mock.expect_get(CustomerId(5)).return_ok(Some(ada(5)));

        let client = CustomerClient::new(inner);
        let created = client
            .register(CustomerCreate {
                full_name: "Ada Lovelace".into(),
                phone_number: "555-1234".into(),
            })
            .await
            .unwrap();
        assert_eq!(created, ada(5));
        mock.verify();
    }

    #[tokio::test]
    async fn lookup_distinguishes_missing_from_unavailable() {
        let (mock, inner) = create_mock_store::<Customer>();
        mock.expect_get(CustomerId(1)).return_ok(None);
        mock.expect_get(CustomerId(2)).return_err(StoreError::Closed);

        let client = CustomerClient::new(inner);
        let ctx = CorrelationContext::new_root();
        assert_eq!(
            client.lookup(CustomerId(1), &ctx).await,
            Err(LookupError::NotFound(CustomerId(1)))
        );
        assert!(matches!(
            client.lookup(CustomerId(2), &ctx).await,
            Err(LookupError::Unavailable(_))
        ));
        mock.verify();
    }

    #[tokio::test]
    async fn update_of_missing_customer_is_not_found() {
        let (mock, inner) = create_mock_store::<Customer>();
        mock.expect_update(CustomerId(3))
            .return_err(StoreError::NotFound("3".into()));

        let client = CustomerClient::new(inner);
        assert_eq!(
            client
                .update(CustomerId(3), CustomerUpdate::default())
                .await,
            Err(CustomerError::NotFound(CustomerId(3)))
        );
        mock.verify();
    }
}
