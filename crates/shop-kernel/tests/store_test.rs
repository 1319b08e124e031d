use async_trait::async_trait;
use shop_kernel::mock::create_mock_store;
use shop_kernel::{RecordClient, RecordStore, StoreClient, StoreEntity, StoreError};

// --- Test Entity ---

#[derive(Clone, Debug, PartialEq)]
struct Kiln {
    id: u64,
    label: String,
    state: KilnState,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum KilnState {
    Cold,
    Firing,
    Done,
}

#[derive(Debug)]
struct KilnCreate {
    label: String,
}

#[derive(Debug)]
enum KilnUpdate {
    Fire,
    Finish,
    Relabel(String),
}

#[derive(Debug, thiserror::Error, PartialEq)]
enum KilnError {
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("cannot go from {0:?} to {1:?}")]
    Transition(KilnState, KilnState),
    #[error("kiln is still firing")]
    Busy,
    #[error("store: {0}")]
    Store(String),
}

#[async_trait]
impl StoreEntity for Kiln {
    type Id = u64;
    type Create = KilnCreate;
    type Update = KilnUpdate;
    type Context = ();
    type Error = KilnError;

    fn from_create_params(id: u64, params: KilnCreate) -> Result<Self, KilnError> {
        if params.label.is_empty() {
            return Err(KilnError::EmptyLabel);
        }
        Ok(Self {
            id,
            label: params.label,
            state: KilnState::Cold,
        })
    }

    async fn on_update(&mut self, update: KilnUpdate, _ctx: &()) -> Result<(), KilnError> {
        match (self.state, update) {
            (KilnState::Cold, KilnUpdate::Fire) => self.state = KilnState::Firing,
            (KilnState::Firing, KilnUpdate::Finish) => self.state = KilnState::Done,
            (_, KilnUpdate::Relabel(label)) => {
                // Mutates before failing so the test can see the store discards the copy.
                self.label = label;
                if self.label.is_empty() {
                    return Err(KilnError::EmptyLabel);
                }
            }
            (from, KilnUpdate::Fire) => return Err(KilnError::Transition(from, KilnState::Firing)),
            (from, KilnUpdate::Finish) => return Err(KilnError::Transition(from, KilnState::Done)),
        }
        Ok(())
    }

    async fn on_take(&self, _ctx: &()) -> Result<(), KilnError> {
        if self.state == KilnState::Firing {
            return Err(KilnError::Busy);
        }
        Ok(())
    }
}

fn spawn_store() -> StoreClient<Kiln> {
    let (store, client) = RecordStore::new(16);
    tokio::spawn(store.run(()));
    client
}

// --- Tests ---

#[tokio::test]
async fn test_store_full_lifecycle() {
    let client = spawn_store();

    let id = client
        .create(KilnCreate {
            label: "north".into(),
        })
        .await
        .unwrap();
    assert_eq!(id, 1);

    let kiln = client.update(id, KilnUpdate::Fire).await.unwrap();
    assert_eq!(kiln.state, KilnState::Firing);

    // Still firing: take is refused and the record stays.
    let refused = client.take(id).await.unwrap_err();
    assert!(matches!(refused, StoreError::Entity(KilnError::Busy)));
    assert!(client.get(id).await.unwrap().is_some());

    client.update(id, KilnUpdate::Finish).await.unwrap();
    let taken = client.take(id).await.unwrap();
    assert_eq!(taken.state, KilnState::Done);

    assert!(client.get(id).await.unwrap().is_none());
    assert!(matches!(
        client.take(id).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_ids_are_increasing_and_unique() {
    let client = spawn_store();
    let mut handles = Vec::new();
    for i in 0..50 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .create(KilnCreate {
                    label: format!("kiln-{i}"),
                })
                .await
                .unwrap()
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=50).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_rejected_create_is_not_stored() {
    let client = spawn_store();
    let err = client
        .create(KilnCreate {
            label: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Entity(KilnError::EmptyLabel)));
    assert!(client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_update_leaves_record_untouched() {
    let client = spawn_store();
    let id = client
        .create(KilnCreate {
            label: "east".into(),
        })
        .await
        .unwrap();

    let err = client
        .update(id, KilnUpdate::Relabel(String::new()))
        .await
        .unwrap_err();
    assert_eq!(err.into_entity(), Some(KilnError::EmptyLabel));

    let err = client.update(id, KilnUpdate::Finish).await.unwrap_err();
    assert_eq!(
        err.into_entity(),
        Some(KilnError::Transition(KilnState::Cold, KilnState::Done))
    );

    let kiln = client.get(id).await.unwrap().unwrap();
    assert_eq!(kiln.label, "east");
    assert_eq!(kiln.state, KilnState::Cold);
}

#[tokio::test]
async fn test_insert_rejects_duplicate_ids() {
    let client = spawn_store();
    let kiln = Kiln {
        id: 40,
        label: "west".into(),
        state: KilnState::Done,
    };
    client.insert(40, kiln.clone()).await.unwrap();
    let err = client.insert(40, kiln).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(id) if id == "40"));
}

#[tokio::test]
async fn test_concurrent_take_has_one_winner() {
    let client = spawn_store();
    let id = client
        .create(KilnCreate {
            label: "south".into(),
        })
        .await
        .unwrap();

    let (a, b) = tokio::join!(client.take(id), client.take(id));
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
}

#[tokio::test]
async fn test_closed_store_reports_closed() {
    let (store, client) = RecordStore::<Kiln>::new(4);
    drop(store);
    assert!(matches!(client.list().await, Err(StoreError::Closed)));
}

// --- RecordClient over a mock ---

struct KilnClient {
    inner: StoreClient<Kiln>,
}

impl RecordClient<Kiln> for KilnClient {
    type Error = KilnError;

    fn inner(&self) -> &StoreClient<Kiln> {
        &self.inner
    }

    fn map_error(e: StoreError<KilnError>) -> KilnError {
        match e {
            StoreError::Entity(e) => e,
            other => KilnError::Store(other.to_string()),
        }
    }
}

#[tokio::test]
async fn test_record_client_maps_store_errors() {
    let (mock, inner) = create_mock_store::<Kiln>();
    mock.expect_take(3).return_err(StoreError::Entity(KilnError::Busy));
    mock.expect_get(4)
        .return_err(StoreError::NotFound("4".into()));
    mock.expect_list().return_ok(vec![]);

    let kilns = KilnClient { inner };
    assert_eq!(kilns.take(3).await, Err(KilnError::Busy));
    assert_eq!(
        kilns.get(4).await,
        Err(KilnError::Store("Record not found: 4".into()))
    );
    assert!(kilns.list().await.unwrap().is_empty());
    mock.verify();
}

#[tokio::test]
async fn test_mock_records_mismatched_requests() {
    let (mock, client) = create_mock_store::<Kiln>();
    mock.expect_get(1).return_ok(None);

    // Wrong id: the mock drops the reply channel.
    assert!(matches!(client.get(2).await, Err(StoreError::Dropped)));
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| mock.verify()));
    assert!(outcome.is_err());
}
