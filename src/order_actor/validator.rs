use super::FulfillmentError;
use crate::clients::{CustomerDirectory, LookupError};
use crate::model::{Customer, CustomerId};
use shop_kernel::CorrelationContext;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Confirms that an order's customer exists before any robot is built. No retries.
#[derive(Clone)]
pub struct CustomerValidator {
    directory: Arc<dyn CustomerDirectory>,
}

impl CustomerValidator {
    pub fn new(directory: Arc<dyn CustomerDirectory>) -> Self {
        Self { directory }
    }

    #[instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id()))]
    pub async fn validate(
        &self,
        customer_id: CustomerId,
        ctx: &CorrelationContext,
    ) -> Result<Customer, FulfillmentError> {
        match self.directory.lookup(customer_id, ctx).await {
            Ok(customer) => {
                info!("Customer validated");
                Ok(customer)
            }
            Err(e) => {
                warn!(error = %e, "Customer validation failed");
                Err(match e {
                    LookupError::NotFound(customer_id) => {
                        FulfillmentError::CustomerNotFound { customer_id }
                    }
                    LookupError::Unavailable(reason) => {
                        FulfillmentError::CustomerServiceUnavailable { reason }
                    }
                    LookupError::Malformed(reason) => FulfillmentError::MalformedResponse {
                        service: "customer".into(),
                        reason,
                    },
                })
            }
        }
    }
}
