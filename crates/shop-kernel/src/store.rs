//! # Record Store Actor
//!
//! `RecordStore<T>` owns one in-memory table of records and processes every request for it
//! sequentially in its own task. Callers talk to it through a cloneable
//! [`StoreClient<T>`](crate::StoreClient).
//!
//! Because one task owns the table, every operation is linearizable: a `Take` racing a
//! second `Take` for the same id hands the record to exactly one of them, and an `Update`
//! either fully applies or leaves the record as it was. No `Mutex` is involved.

use crate::client::StoreClient;
use crate::entity::StoreEntity;
use crate::error::StoreError;
use crate::message::StoreRequest;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The server half of a record table.
///
/// # Usage Pattern
///
/// 1. **Create**: `RecordStore::new()` returns the store and its client.
/// 2. **Wire**: pass the store's dependencies into `store.run(context)`.
/// 3. **Run**: spawn the run loop on the runtime.
///
/// ```rust
/// use shop_kernel::{RecordStore, StoreEntity};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Note { id: u64, text: String }
/// #[derive(Debug)] struct NoteCreate(String);
/// #[derive(Debug, thiserror::Error)] #[error("note error")] struct NoteError;
///
/// #[async_trait]
/// impl StoreEntity for Note {
///     type Id = u64;
///     type Create = NoteCreate;
///     type Update = String;
///     type Context = ();
///     type Error = NoteError;
///
///     fn from_create_params(id: u64, p: NoteCreate) -> Result<Self, NoteError> {
///         Ok(Self { id, text: p.0 })
///     }
///     async fn on_update(&mut self, text: String, _: &()) -> Result<(), NoteError> {
///         self.text = text;
///         Ok(())
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (store, client) = RecordStore::<Note>::new(16);
///     tokio::spawn(store.run(()));
///
///     let id = client.create(NoteCreate("hello".into())).await.unwrap();
///     let note = client.take(id).await.unwrap();
///     assert_eq!(note.text, "hello");
///     assert!(client.get(id).await.unwrap().is_none());
/// }
/// ```
pub struct RecordStore<T: StoreEntity> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    records: HashMap<T::Id, T>,
    next_id: u64,
}

impl<T: StoreEntity> RecordStore<T> {
    /// Creates a store and its client.
    ///
    /// `buffer_size` is the capacity of the request channel. When it is full, client calls
    /// wait for room.
    pub fn new(buffer_size: usize) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let store = Self {
            receiver,
            records: HashMap::new(),
            next_id: 1,
        };
        (store, StoreClient::new(sender))
    }

    /// Runs the store loop until every client has been dropped.
    pub async fn run(mut self, context: T::Context) {
        // "Customer" instead of "robotshop::model::customer::Customer"
        let record_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(record_type, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Create { params, respond_to } => {
                    debug!(record_type, ?params, "Create");
                    let id = T::Id::from(self.next_id);
                    self.next_id += 1;
                    let result = match T::from_create_params(id.clone(), params) {
                        Ok(record) => self.admit(record_type, id.clone(), record, &context).await,
                        Err(e) => Err(StoreError::Entity(e)),
                    };
                    if let Err(e) = &result {
                        warn!(record_type, %id, error = %e, "Create failed");
                    }
                    let _ = respond_to.send(result.map(|_| id));
                }
                StoreRequest::Insert {
                    id,
                    record,
                    respond_to,
                } => {
                    debug!(record_type, %id, "Insert");
                    let result = self.admit(record_type, id.clone(), record, &context).await;
                    if let Err(e) = &result {
                        warn!(record_type, %id, error = %e, "Insert failed");
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Get { id, respond_to } => {
                    let record = self.records.get(&id).cloned();
                    debug!(record_type, %id, found = record.is_some(), "Get");
                    let _ = respond_to.send(Ok(record));
                }
                StoreRequest::List { respond_to } => {
                    debug!(record_type, size = self.records.len(), "List");
                    let _ = respond_to.send(Ok(self.records.values().cloned().collect()));
                }
                StoreRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(record_type, %id, ?update, "Update");
                    let Some(current) = self.records.get(&id) else {
                        warn!(record_type, %id, "Not found");
                        let _ = respond_to.send(Err(StoreError::NotFound(id.to_string())));
                        continue;
                    };
                    // Work on a copy so a rejected update leaves no partial change behind.
                    let mut next = current.clone();
                    match next.on_update(update, &context).await {
                        Ok(()) => {
                            self.records.insert(id.clone(), next.clone());
                            debug!(record_type, %id, "Updated");
                            let _ = respond_to.send(Ok(next));
                        }
                        Err(e) => {
                            warn!(record_type, %id, error = %e, "Update rejected");
                            let _ = respond_to.send(Err(StoreError::Entity(e)));
                        }
                    }
                }
                StoreRequest::Take { id, respond_to } => {
                    debug!(record_type, %id, "Take");
                    let Some(record) = self.records.get(&id) else {
                        debug!(record_type, %id, "Not found");
                        let _ = respond_to.send(Err(StoreError::NotFound(id.to_string())));
                        continue;
                    };
                    if let Err(e) = record.on_take(&context).await {
                        debug!(record_type, %id, reason = %e, "Take refused");
                        let _ = respond_to.send(Err(StoreError::Entity(e)));
                        continue;
                    }
                    let result = self
                        .records
                        .remove(&id)
                        .ok_or_else(|| StoreError::NotFound(id.to_string()));
                    info!(record_type, %id, size = self.records.len(), "Taken");
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(record_type, size = self.records.len(), "Shutdown");
    }

    async fn admit(
        &mut self,
        record_type: &str,
        id: T::Id,
        mut record: T,
        context: &T::Context,
    ) -> Result<(), StoreError<T::Error>> {
        if self.records.contains_key(&id) {
            return Err(StoreError::Duplicate(id.to_string()));
        }
        record.on_create(context).await.map_err(StoreError::Entity)?;
        self.records.insert(id.clone(), record);
        info!(record_type, %id, size = self.records.len(), "Stored");
        Ok(())
    }
}
