//! Period reports and their export format

pub mod export;
pub mod period;

pub use export::*;
pub use period::*;
