//! Data carried between the shop's services: customers, robots, orders and their outcomes.

mod ids;
pub mod customer;
pub mod order;
pub mod robot;

pub use customer::*;
pub use ids::{CustomerId, OrderId, SerialNumber};
pub use order::*;
pub use robot::*;
