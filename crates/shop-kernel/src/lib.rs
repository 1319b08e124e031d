//! # Shop Kernel
//!
//! Building blocks shared by the robot shop services: the customer registry, the factory
//! floor and the order orchestrator.
//!
//! ## Record stores
//!
//! Every shared table in the shop is a [`RecordStore`]: a single task that owns a
//! `HashMap` and processes requests one at a time, reached through a cloneable
//! [`StoreClient`]. Sequential processing makes each table linearizable without locks, and
//! the [`StoreEntity`] hooks let each record type guard its own state machine:
//!
//! 1. **Entity layer** ([`StoreEntity`]): ids, payloads, validation, transitions.
//! 2. **Runtime layer** ([`RecordStore`]): message loop and table ownership.
//! 3. **Interface layer** ([`StoreClient`], [`RecordClient`]): typed async calls.
//!
//! Further reading: [Actors with Tokio](https://ryhl.io/blog/actors-with-tokio/).
//!
//! ## Bounded work
//!
//! [`WorkerPool`] runs a fixed number of workers behind a fixed amount of admission. A
//! caller reserves a [`Ticket`] first and only then commits state, so rejected work leaves
//! no trace.
//!
//! ## Correlation
//!
//! [`CorrelationContext`] carries a W3C `traceparent` explicitly across every call boundary
//! between services.
//!
//! ## Testing
//!
//! [`mock::MockStore`] scripts store replies for tests of code built on a client; a real
//! `RecordStore` is cheap enough to spawn in any `#[tokio::test]`.

pub mod client;
pub mod client_trait;
pub mod correlation;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod pool;
pub mod store;
pub mod tracing;

pub use client::StoreClient;
pub use client_trait::RecordClient;
pub use correlation::{CorrelationContext, TRACEPARENT_HEADER};
pub use entity::StoreEntity;
pub use error::{CorrelationError, PoolError, StoreError};
pub use message::StoreRequest;
pub use pool::{Ticket, WorkerPool};
pub use store::RecordStore;
