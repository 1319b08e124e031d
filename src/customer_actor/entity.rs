//! [`StoreEntity`] implementation for [`Customer`].

use super::CustomerError;
use crate::model::{Customer, CustomerCreate, CustomerId, CustomerUpdate};
use async_trait::async_trait;
use shop_kernel::StoreEntity;

#[async_trait]
impl StoreEntity for Customer {
    type Id = CustomerId;
    type Create = CustomerCreate;
    type Update = CustomerUpdate;
    type Context = ();
    type Error = CustomerError;

    fn from_create_params(id: CustomerId, params: CustomerCreate) -> Result<Self, CustomerError> {
        Customer::validate(&params.full_name, &params.phone_number)?;
        Ok(Self {
            customer_id: id,
            full_name: params.full_name.trim().to_string(),
            phone_number: params.phone_number.trim().to_string(),
        })
    }

    /// Validates the merged result before anything changes.
    async fn on_update(&mut self, update: CustomerUpdate, _ctx: &()) -> Result<(), CustomerError> {
        let full_name = update.full_name.unwrap_or_else(|| self.full_name.clone());
        let phone_number = update
            .phone_number
            .unwrap_or_else(|| self.phone_number.clone());
        Customer::validate(&full_name, &phone_number)?;
        self.full_name = full_name.trim().to_string();
        self.phone_number = phone_number.trim().to_string();
        Ok(())
    }
}
