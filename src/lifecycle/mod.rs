//! Service wiring and shutdown.

pub mod shop_system;

pub use shop_system::*;
