//! The robot factory: a catalog of robot types, a store of production jobs and the
//! scheduler that drives jobs through the production lines.

pub mod catalog;
pub mod entity;
pub mod error;
pub mod scheduler;

pub use catalog::RobotCatalog;
pub use entity::{JobStage, ProductionJob};
pub use error::*;
pub use scheduler::{ProductionScheduler, ProductionTimings};
