//! # Store Client
//!
//! The caller half of a [`RecordStore`](crate::RecordStore).

use crate::entity::StoreEntity;
use crate::error::StoreError;
use crate::message::{Response, StoreRequest};
use tokio::sync::{mpsc, oneshot};

/// Typed async handle to a `RecordStore<T>`.
///
/// Holds only the request sender, so clones are cheap and can be moved into any task.
/// Every method sends one request and waits for the store's reply.
pub struct StoreClient<T: StoreEntity> {
    sender: mpsc::Sender<StoreRequest<T>>,
}

impl<T: StoreEntity> Clone for StoreClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: StoreEntity> StoreClient<T> {
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> StoreRequest<T>,
    ) -> Result<R, StoreError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Dropped)?
    }

    /// Stores a new record under a store-assigned id.
    pub async fn create(&self, params: T::Create) -> Result<T::Id, StoreError<T::Error>> {
        self.call(|respond_to| StoreRequest::Create { params, respond_to })
            .await
    }

    /// Stores a record under a caller-assigned id. Fails with `Duplicate` if the id is taken.
    pub async fn insert(&self, id: T::Id, record: T) -> Result<(), StoreError<T::Error>> {
        self.call(|respond_to| StoreRequest::Insert {
            id,
            record,
            respond_to,
        })
        .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError<T::Error>> {
        self.call(|respond_to| StoreRequest::Get { id, respond_to })
            .await
    }

    /// Snapshot of every record. Order is unspecified.
    pub async fn list(&self) -> Result<Vec<T>, StoreError<T::Error>> {
        self.call(|respond_to| StoreRequest::List { respond_to }).await
    }

    pub async fn update(&self, id: T::Id, update: T::Update) -> Result<T, StoreError<T::Error>> {
        self.call(|respond_to| StoreRequest::Update {
            id,
            update,
            respond_to,
        })
        .await
    }

    /// Removes and returns a record. At most one concurrent caller gets it.
    pub async fn take(&self, id: T::Id) -> Result<T, StoreError<T::Error>> {
        self.call(|respond_to| StoreRequest::Take { id, respond_to })
            .await
    }
}
