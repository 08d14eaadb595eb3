//! Accumulators that fold transaction records into summaries

pub mod expense;
pub mod revenue;
pub mod stock;

pub use expense::*;
pub use revenue::*;
pub use stock::*;
