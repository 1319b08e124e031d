//! # StoreEntity Trait
//!
//! The `StoreEntity` trait is the contract every record kept by a [`RecordStore`](crate::RecordStore)
//! must satisfy: customers in the registry, production jobs on the factory floor, orders in
//! the order ledger. It names the identifier, the creation and update payloads, the error
//! type, and the hooks the store calls around each state change.
//!
//! # Provided Methods (Hooks)
//! - [`StoreEntity::on_create`] runs after a record is built and before it becomes visible.
//! - [`StoreEntity::on_take`] runs before a record is removed and may veto the removal.
//!
//! The defaults do nothing (`Ok(())`). [`StoreEntity::on_update`] has no default because an
//! update is the place where a record enforces its own state machine.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any record must implement to be managed by a `RecordStore`.
///
/// # Async & Context
/// Hooks are `async` so a record can consult other stores while validating itself. The
/// `Context` associated type is handed to the store's `run()` loop and passed to every hook.
#[async_trait]
pub trait StoreEntity: Clone + Send + Sync + 'static {
    /// Unique key of the record. `From<u64>` lets the store mint keys for `create`.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + From<u64>;

    /// Payload for store-assigned creation.
    type Create: Send + Sync + Debug;

    /// Payload for an in-place update.
    type Update: Send + Sync + Debug;

    /// Dependencies injected into the store loop. Use `()` if none are needed.
    type Context: Send + Sync;

    /// Record-level error, returned to callers wrapped in [`StoreError::Entity`](crate::StoreError::Entity).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build a record from a freshly minted id and the creation payload.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Called after the record is built (by `create` or `insert`), before it is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Apply an update. Returning an error leaves the stored record untouched.
    async fn on_update(
        &mut self,
        update: Self::Update,
        ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called before the record is removed by `take`. Returning an error keeps it stored.
    async fn on_take(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }
}
