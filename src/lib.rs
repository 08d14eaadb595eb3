//! # Repair Accounting Core
//!
//! Financial aggregation engine for a repair shop: VAT decomposition,
//! revenue/expense/stock accumulators, period reports with export, and
//! summary/detail queries over repair tickets and the purchase stream.
//!
//! ## Features
//!
//! - **VAT decomposition**: 10% VAT split of gross amounts in included/excluded/none modes
//! - **Ingestion**: Loose API payloads coerced into typed records with data-quality issues
//! - **Accumulators**: Revenue, expense and stock summaries that reconcile with each other
//! - **Period reports**: Daily/monthly/yearly grouping with net profit and a quoted export
//! - **Queries**: Date-ranged detail views for revenue, expense, VAT and net
//! - **Source abstraction**: Data access behind the async [`RecordSource`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use repair_accounting_core::{decompose_vat, TaxMode};
//!
//! let split = decompose_vat(110000, TaxMode::Included);
//! assert_eq!(split.supply_amount, 100000);
//! assert_eq!(split.vat_amount, 10000);
//!
//! // Reports over a data source go through the service:
//! // let service = ReportService::new(YourRecordSource::new());
//! // let dashboard = service.dashboard(&DateRange::unbounded()).await?;
//! ```

pub mod accumulators;
pub mod config;
pub mod ingest;
pub mod query;
pub mod reporting;
pub mod service;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

use std::sync::Once;

// Re-export commonly used types
pub use accumulators::*;
pub use config::*;
pub use ingest::*;
pub use query::*;
pub use reporting::*;
pub use service::*;
pub use tax::*;
pub use traits::*;
pub use types::*;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Repair accounting core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
