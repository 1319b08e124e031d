//! # Mock Store
//!
//! `MockStore<T>` answers `StoreClient<T>` requests from a queue of scripted responses
//! instead of a real table. Use it to test code that sits on top of a client (validation,
//! error mapping, retries) where the exact store reply matters more than store behaviour.
//!
//! | | MockStore | RecordStore |
//! |---|---|---|
//! | **State** | none, replies are scripted | real table |
//! | **Error injection** | `return_err(...)` | requires setting up state |
//! | **Use case** | logic around a client | the store itself, whole flows |
//!
//! ```rust
//! use shop_kernel::mock::MockStore;
//! use shop_kernel::{StoreEntity, StoreError};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug, PartialEq)] struct Part { id: u64 }
//! #[derive(Debug, thiserror::Error)] #[error("part error")] struct PartError;
//!
//! #[async_trait]
//! impl StoreEntity for Part {
//!     type Id = u64; type Create = (); type Update = (); type Context = (); type Error = PartError;
//!     fn from_create_params(id: u64, _: ()) -> Result<Self, PartError> { Ok(Self { id }) }
//!     async fn on_update(&mut self, _: (), _: &()) -> Result<(), PartError> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockStore::<Part>::new();
//!     mock.expect_get(7).return_ok(Some(Part { id: 7 }));
//!     mock.expect_take(7).return_err(StoreError::NotFound("7".into()));
//!
//!     let client = mock.client();
//!     assert_eq!(client.get(7).await.unwrap(), Some(Part { id: 7 }));
//!     assert!(matches!(client.take(7).await, Err(StoreError::NotFound(_))));
//!     mock.verify();
//! }
//! ```

use crate::client::StoreClient;
use crate::entity::StoreEntity;
use crate::error::StoreError;
use crate::message::StoreRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

type Reply<R, T> = Result<R, StoreError<<T as StoreEntity>::Error>>;

enum Expectation<T: StoreEntity> {
    Create(Reply<T::Id, T>),
    Insert(T::Id, Reply<(), T>),
    Get(T::Id, Reply<Option<T>, T>),
    List(Reply<Vec<T>, T>),
    Update(T::Id, Reply<T, T>),
    Take(T::Id, Reply<T, T>),
}

struct Script<T: StoreEntity> {
    expected: VecDeque<Expectation<T>>,
    unexpected: Vec<String>,
}

/// Scripted stand-in for a `RecordStore<T>`.
pub struct MockStore<T: StoreEntity> {
    client: StoreClient<T>,
    script: Arc<Mutex<Script<T>>>,
    _handle: tokio::task::JoinHandle<()>,
}

/// Creates a mock store and returns it with a client already connected.
pub fn create_mock_store<T: StoreEntity>() -> (MockStore<T>, StoreClient<T>) {
    let mock = MockStore::new();
    let client = mock.client();
    (mock, client)
}

fn lock<T: StoreEntity>(script: &Mutex<Script<T>>) -> MutexGuard<'_, Script<T>> {
    script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: StoreEntity> Default for MockStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StoreEntity> MockStore<T> {
    /// Creates a mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StoreRequest<T>>(64);
        let script = Arc::new(Mutex::new(Script {
            expected: VecDeque::new(),
            unexpected: Vec::new(),
        }));
        let shared = Arc::clone(&script);

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                answer(&shared, request);
            }
        });

        Self {
            client: StoreClient::new(sender),
            script,
            _handle: handle,
        }
    }

    pub fn client(&self) -> StoreClient<T> {
        self.client.clone()
    }

    pub fn expect_create(&self) -> ExpectationBuilder<'_, T, T::Id> {
        self.builder(Expectation::Create)
    }

    pub fn expect_insert(&self, id: T::Id) -> ExpectationBuilder<'_, T, ()> {
        self.builder(move |r| Expectation::Insert(id, r))
    }

    pub fn expect_get(&self, id: T::Id) -> ExpectationBuilder<'_, T, Option<T>> {
        self.builder(move |r| Expectation::Get(id, r))
    }

    pub fn expect_list(&self) -> ExpectationBuilder<'_, T, Vec<T>> {
        self.builder(Expectation::List)
    }

    pub fn expect_update(&self, id: T::Id) -> ExpectationBuilder<'_, T, T> {
        self.builder(move |r| Expectation::Update(id, r))
    }

    pub fn expect_take(&self, id: T::Id) -> ExpectationBuilder<'_, T, T> {
        self.builder(move |r| Expectation::Take(id, r))
    }

    /// Panics if an expectation was not consumed or a request did not match.
    pub fn verify(&self) {
        let script = lock(&self.script);
        if !script.unexpected.is_empty() {
            panic!("Unexpected store requests: {:?}", script.unexpected);
        }
        if !script.expected.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                script.expected.len()
            );
        }
    }

    fn builder<R>(
        &self,
        make: impl FnOnce(Reply<R, T>) -> Expectation<T> + Send + 'static,
    ) -> ExpectationBuilder<'_, T, R> {
        ExpectationBuilder {
            script: &self.script,
            make: Box::new(make),
        }
    }
}

/// Completes an expectation with the reply the mock should send.
#[must_use = "an expectation is only registered once a reply is given"]
pub struct ExpectationBuilder<'a, T: StoreEntity, R> {
    script: &'a Mutex<Script<T>>,
    make: Box<dyn FnOnce(Reply<R, T>) -> Expectation<T> + Send>,
}

impl<T: StoreEntity, R> ExpectationBuilder<'_, T, R> {
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    pub fn return_err(self, error: StoreError<T::Error>) {
        self.push(Err(error));
    }

    fn push(self, reply: Reply<R, T>) {
        let expectation = (self.make)(reply);
        lock(self.script).expected.push_back(expectation);
    }
}

/// Replies to one request from the front of the script.
///
/// A mismatch drops `respond_to`, so the caller sees `StoreError::Dropped`.
fn answer<T: StoreEntity>(script: &Mutex<Script<T>>, request: StoreRequest<T>) {
    let mut script = lock(script);
    let next = script.expected.pop_front();
    let mismatch = match (request, next) {
        (StoreRequest::Create { respond_to, .. }, Some(Expectation::Create(r))) => {
            let _ = respond_to.send(r);
            None
        }
        (StoreRequest::Insert { id, respond_to, .. }, Some(Expectation::Insert(want, r)))
            if id == want =>
        {
            let _ = respond_to.send(r);
            None
        }
        (StoreRequest::Get { id, respond_to }, Some(Expectation::Get(want, r))) if id == want => {
            let _ = respond_to.send(r);
            None
        }
        (StoreRequest::List { respond_to }, Some(Expectation::List(r))) => {
            let _ = respond_to.send(r);
            None
        }
        (StoreRequest::Update { id, respond_to, .. }, Some(Expectation::Update(want, r)))
            if id == want =>
        {
            let _ = respond_to.send(r);
            None
        }
        (StoreRequest::Take { id, respond_to }, Some(Expectation::Take(want, r))) if id == want => {
            let _ = respond_to.send(r);
            None
        }
        (request, next) => Some(format!(
            "got {} while expecting {}",
            describe_request(&request),
            next.as_ref().map_or("nothing", describe_expectation)
        )),
    };
    if let Some(message) = mismatch {
        script.unexpected.push(message);
    }
}

fn describe_request<T: StoreEntity>(request: &StoreRequest<T>) -> String {
    match request {
        StoreRequest::Create { .. } => "create".into(),
        StoreRequest::Insert { id, .. } => format!("insert({id})"),
        StoreRequest::Get { id, .. } => format!("get({id})"),
        StoreRequest::List { .. } => "list".into(),
        StoreRequest::Update { id, .. } => format!("update({id})"),
        StoreRequest::Take { id, .. } => format!("take({id})"),
    }
}

fn describe_expectation<T: StoreEntity>(expectation: &Expectation<T>) -> &'static str {
    match expectation {
        Expectation::Create(_) => "create",
        Expectation::Insert(..) => "insert",
        Expectation::Get(..) => "get",
        Expectation::List(_) => "list",
        Expectation::Update(..) => "update",
        Expectation::Take(..) => "take",
    }
}
