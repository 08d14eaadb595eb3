//! Tax calculation module

pub mod vat;

pub use vat::*;
