//! Customer registry: one [`RecordStore`] of customers.

pub mod entity;
pub mod error;

pub use error::*;

use crate::clients::CustomerClient;
use crate::model::Customer;
use shop_kernel::RecordStore;

/// Creates the customer store and its client.
pub fn new() -> (RecordStore<Customer>, CustomerClient) {
    let (store, generic_client) = RecordStore::new(64);
    (store, CustomerClient::new(generic_client))
}
