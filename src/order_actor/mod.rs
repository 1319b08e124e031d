//! The order service: a ledger of orders and the orchestrator that fulfils them.
//!
//! Fulfillment of one order runs as a single job on a dispatcher worker:
//!
//! 1. [`CustomerValidator`] confirms the customer exists.
//! 2. [`LineItemDispatcher`] starts one factory build per line item, each followed by a
//!    [`CompletionPoller`].
//! 3. [`ResultAggregator`] joins the items and builds the [`RealizedOrder`](crate::model::RealizedOrder).
//! 4. The ledger record flips from active to completed.

pub mod aggregator;
pub mod dispatcher;
pub mod entity;
pub mod error;
mod fulfillment;
pub mod orchestrator;
pub mod poller;
pub mod validator;

#[cfg(test)]
pub(crate) mod fakes;

pub use aggregator::ResultAggregator;
pub use dispatcher::LineItemDispatcher;
pub use entity::{OrderRecord, OrderTransition};
pub use error::*;
pub use orchestrator::OrderOrchestrator;
pub use poller::{CompletionPoller, PollSettings};
pub use validator::CustomerValidator;

use crate::clients::OrderClient;
use shop_kernel::RecordStore;

/// Creates the order ledger and its client.
pub fn new() -> (RecordStore<OrderRecord>, OrderClient) {
    let (store, generic_client) = RecordStore::new(64);
    (store, OrderClient::new(generic_client))
}
