//! # Store Messages
//!
//! The request enum sent from a [`StoreClient`](crate::StoreClient) to a
//! [`RecordStore`](crate::RecordStore). Each variant carries a oneshot sender for its reply.

use crate::entity::StoreEntity;
use crate::error::StoreError;
use tokio::sync::oneshot;

/// One-shot reply channel used by the store.
pub type Response<T, E> = oneshot::Sender<Result<T, StoreError<E>>>;

/// Internal message type sent to the store.
///
/// The variants cover the lifecycle of an in-memory record:
///
/// - **Create**: store-assigned id, built from [`StoreEntity::Create`].
/// - **Insert**: caller-assigned id. Inserting an existing id is rejected.
/// - **Get** / **List**: reads.
/// - **Update**: apply [`StoreEntity::Update`], returning the new state.
/// - **Take**: remove and return the record, subject to [`StoreEntity::on_take`].
#[derive(Debug)]
pub enum StoreRequest<T: StoreEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id, T::Error>,
    },
    Insert {
        id: T::Id,
        record: T,
        respond_to: Response<(), T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    List {
        respond_to: Response<Vec<T>, T::Error>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T, T::Error>,
    },
    Take {
        id: T::Id,
        respond_to: Response<T, T::Error>,
    },
}
