//! # RecordClient Trait
//!
//! Common surface for domain clients that wrap a [`StoreClient`]. Implementors supply the
//! inner client and an error mapping; reads and removal come for free.

use crate::{StoreClient, StoreEntity, StoreError};
use async_trait::async_trait;

/// Trait for domain clients built on a `StoreClient<T>`.
///
/// # Example
///
/// ```rust
/// use shop_kernel::{RecordClient, StoreClient, StoreEntity, StoreError};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Part { id: u64 }
/// #[derive(Debug, thiserror::Error)] #[error("part error: {0}")] struct PartError(String);
///
/// #[async_trait]
/// impl StoreEntity for Part {
///     type Id = u64;
///     type Create = ();
///     type Update = ();
///     type Context = ();
///     type Error = PartError;
///
///     fn from_create_params(id: u64, _: ()) -> Result<Self, PartError> { Ok(Self { id }) }
///     async fn on_update(&mut self, _: (), _: &()) -> Result<(), PartError> { Ok(()) }
/// }
///
/// struct PartClient { inner: StoreClient<Part> }
///
/// impl RecordClient<Part> for PartClient {
///     type Error = PartError;
///     fn inner(&self) -> &StoreClient<Part> { &self.inner }
///     fn map_error(e: StoreError<PartError>) -> PartError {
///         match e {
///             StoreError::Entity(e) => e,
///             other => PartError(other.to_string()),
///         }
///     }
/// }
///
/// async fn usage(parts: PartClient) {
///     let _ = parts.get(1).await;
///     let _ = parts.list().await;
/// }
/// ```
#[async_trait]
pub trait RecordClient<T: StoreEntity>: Send + Sync {
    /// The domain error type.
    type Error: Send + Sync;

    /// Access the inner generic client.
    fn inner(&self) -> &StoreClient<T>;

    /// Map store errors to the domain error type.
    fn map_error(e: StoreError<T::Error>) -> Self::Error;

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    async fn list(&self) -> Result<Vec<T>, Self::Error> {
        self.inner().list().await.map_err(Self::map_error)
    }

    #[tracing::instrument(skip(self))]
    async fn take(&self, id: T::Id) -> Result<T, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().take(id).await.map_err(Self::map_error)
    }
}
