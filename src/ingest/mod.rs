//! Typed ingestion boundary between the API collaborator and the engine

pub mod coerce;
pub mod normalize;
pub mod raw;

pub use coerce::*;
pub use normalize::*;
pub use raw::*;
