//! Traits for the record-source collaborator

use async_trait::async_trait;

use crate::ingest::Normalized;
use crate::query::DateRange;
use crate::types::*;

/// Source of already-normalized transaction records
///
/// Implemented by the data-access layer (REST client, SQL repository,
/// in-memory fixtures). All I/O happens here; the aggregation engine only
/// sees the records once every fetch has completed.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Repair tickets dated inside the range
    async fn fetch_repairs(&self, range: &DateRange) -> ReportResult<Normalized<TransactionRecord>>;

    /// Purchase, sale and return rows dated inside the range
    async fn fetch_purchases(
        &self,
        range: &DateRange,
    ) -> ReportResult<Normalized<TransactionRecord>>;

    /// Parts consumed by repairs dated inside the range
    async fn fetch_repair_parts(
        &self,
        range: &DateRange,
    ) -> ReportResult<Normalized<RepairPartUsage>>;
}
