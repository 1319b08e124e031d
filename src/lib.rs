//! # Robot Shop
//!
//! > **Order fulfillment across three small services.**
//!
//! A customer registry, a robot factory and an order service talk to each other over
//! HTTP. Placing an order fans out into one factory build per line item, each build is
//! polled until its robot is ready, and the results are joined into a single realized
//! order that the customer picks up.
//!
//! ## 🏗️ Design
//!
//! Every shared table is a [`shop_kernel::RecordStore`]: one task owning its records and
//! processing requests one at a time. Every service that does work runs a bounded
//! [`shop_kernel::WorkerPool`] and turns callers away as soon as it is full, rather than
//! queueing without limit. A [`shop_kernel::CorrelationContext`] travels as an explicit
//! parameter across every call boundary and as a `traceparent` header across every HTTP
//! hop.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The data ([`model`])
//! Customers, robots, orders and realized orders, with their JSON encoding.
//!
//! ### 2. The services ([`customer_actor`], [`factory`], [`order_actor`])
//! - **Customer registry**: validated customer records.
//! - **Factory**: the [`ProductionScheduler`](factory::ProductionScheduler) and its
//!   production lines.
//! - **Order service**: the [`OrderOrchestrator`](order_actor::OrderOrchestrator), which
//!   validates the customer, dispatches line items, polls for robots and aggregates the
//!   outcome.
//!
//! ### 3. The interface ([`clients`], [`http`])
//! Typed clients over the stores, HTTP gateways to remote services and the axum routers
//! each service exposes.
//!
//! ### 4. The wiring ([`lifecycle`], [`config`])
//! [`ShopSystem`](lifecycle::ShopSystem) starts the stores, connects the services and
//! shuts them down; [`ShopConfig`](config::ShopConfig) holds every tunable.
//!
//! ### 5. The driver ([`loadgen`])
//! A load generator that exercises a running shop end to end.
//!
//! ## 🚀 Running
//!
//! ```bash
//! # All three services in one process
//! RUST_LOG=info cargo run -- all
//!
//! # Then, from another terminal
//! cargo run -- load --customers 5 --orders 20
//! ```

pub mod clients;
pub mod config;
pub mod customer_actor;
pub mod factory;
pub mod http;
pub mod lifecycle;
pub mod loadgen;
pub mod model;
pub mod order_actor;
