//! In-memory record source for testing

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ingest::*;
use crate::query::{filter_by_date, DateRange};
use crate::traits::*;
use crate::types::*;

/// Holds raw collaborator payloads and normalizes them on every fetch
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    repairs: Arc<RwLock<Vec<RawRepair>>>,
    purchases: Arc<RwLock<Vec<RawPurchase>>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `{"repairs": [...]}` and `{"purchases": [...]}` payloads
    pub fn from_json(repairs_json: &str, purchases_json: &str) -> ReportResult<Self> {
        let source = Self::new();
        source.extend_repairs(parse_repairs_payload(repairs_json)?)?;
        source.extend_purchases(parse_purchases_payload(purchases_json)?)?;
        Ok(source)
    }

    pub fn add_repair(&self, repair: RawRepair) -> ReportResult<()> {
        self.extend_repairs([repair])
    }

    pub fn add_purchase(&self, purchase: RawPurchase) -> ReportResult<()> {
        self.extend_purchases([purchase])
    }

    pub fn extend_repairs(&self, repairs: impl IntoIterator<Item = RawRepair>) -> ReportResult<()> {
        write(&self.repairs)?.extend(repairs);
        Ok(())
    }

    pub fn extend_purchases(
        &self,
        purchases: impl IntoIterator<Item = RawPurchase>,
    ) -> ReportResult<()> {
        write(&self.purchases)?.extend(purchases);
        Ok(())
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReportResult<()> {
        write(&self.repairs)?.clear();
        write(&self.purchases)?.clear();
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> ReportResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| ReportError::Source("record store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> ReportResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| ReportError::Source("record store lock poisoned".to_string()))
}

// Undated records and issues only belong to an unbounded range.
fn dated_in_range(date: Option<NaiveDate>, range: &DateRange) -> bool {
    date.map_or(range.is_unbounded(), |d| range.contains(d))
}

fn in_range(
    mut normalized: Normalized<TransactionRecord>,
    range: &DateRange,
) -> Normalized<TransactionRecord> {
    normalized.records = filter_by_date(&normalized.records, range);
    normalized
        .issues
        .retain(|issue| dated_in_range(issue.date, range));
    normalized
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn fetch_repairs(&self, range: &DateRange) -> ReportResult<Normalized<TransactionRecord>> {
        let repairs = read(&self.repairs)?;
        Ok(in_range(normalize_repairs(&repairs), range))
    }

    async fn fetch_purchases(
        &self,
        range: &DateRange,
    ) -> ReportResult<Normalized<TransactionRecord>> {
        let purchases = read(&self.purchases)?;
        Ok(in_range(normalize_purchases(&purchases), range))
    }

    async fn fetch_repair_parts(
        &self,
        range: &DateRange,
    ) -> ReportResult<Normalized<RepairPartUsage>> {
        let repairs = read(&self.repairs)?;
        let matching: Vec<RawRepair> = repairs
            .iter()
            .filter(|r| dated_in_range(r.date_text().and_then(parse_record_date), range))
            .cloned()
            .collect();
        Ok(repair_parts_of(&matching))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const REPAIRS: &str = r#"{"repairs": [
        {"id": 1, "total_cost": "110000", "vat_option": "included", "repair_date": "2024-01-15",
         "parts": [{"product_id": 5, "quantity": 2}]},
        {"id": 2, "total_cost": 30000, "repair_date": "2024-02-01",
         "parts": [{"product_id": 5, "quantity": 1}]}
    ]}"#;

    const PURCHASES: &str = r#"{"purchases": [
        {"id": 10, "type": "구매", "total_amount": 50000, "tax_option": "excluded",
         "quantity": 10, "purchase_date": "2024-01-03", "product_id": 5}
    ]}"#;

    #[tokio::test]
    async fn test_fetch_filters_by_range() {
        let source = MemoryRecordSource::from_json(REPAIRS, PURCHASES).unwrap();
        let january = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1),
            NaiveDate::from_ymd_opt(2024, 1, 31),
        )
        .unwrap();

        let repairs = source.fetch_repairs(&january).await.unwrap();
        assert_eq!(repairs.records.len(), 1);
        assert_eq!(repairs.records[0].id.as_deref(), Some("1"));

        let parts = source.fetch_repair_parts(&january).await.unwrap();
        assert_eq!(parts.records.len(), 1);
        assert_eq!(parts.records[0].quantity, 2);

        let all_parts = source.fetch_repair_parts(&DateRange::unbounded()).await.unwrap();
        assert_eq!(all_parts.records.len(), 2);
    }

    #[tokio::test]
    async fn test_issues_are_passed_through() {
        let source = MemoryRecordSource::new();
        source
            .add_purchase(serde_json::from_value(json!({
                "type": "구매", "total_amount": "??", "quantity": 1, "date": "2024-01-01"
            })).unwrap())
            .unwrap();
        let purchases = source.fetch_purchases(&DateRange::unbounded()).await.unwrap();
        assert_eq!(purchases.records[0].gross_amount, 0);
        assert_eq!(purchases.count_issues(IssueKind::NonNumericAmount), 1);
    }

    #[tokio::test]
    async fn test_issues_follow_the_range() {
        let source = MemoryRecordSource::from_json(
            r#"[{"total_cost": "n/a", "repair_date": "2024-01-10"},
                {"total_cost": "??", "repair_date": "2024-02-10"},
                {"total_cost": 1000}]"#,
            r#"[{"type": "구매", "total_amount": "x", "quantity": 1, "date": "2024-02-01"}]"#,
        )
        .unwrap();
        let january = DateRange::parse(Some("2024-01-01"), Some("2024-01-31")).unwrap();

        let repairs = source.fetch_repairs(&january).await.unwrap();
        assert_eq!(repairs.issues.len(), 1);
        assert_eq!(repairs.issues[0].kind, IssueKind::NonNumericAmount);
        let purchases = source.fetch_purchases(&january).await.unwrap();
        assert!(purchases.is_clean());

        let all = source.fetch_repairs(&DateRange::unbounded()).await.unwrap();
        assert_eq!(all.count_issues(IssueKind::NonNumericAmount), 2);
        assert_eq!(all.count_issues(IssueKind::InvalidDate), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let source = MemoryRecordSource::from_json(REPAIRS, PURCHASES).unwrap();
        source.clear().unwrap();
        let repairs = source.fetch_repairs(&DateRange::unbounded()).await.unwrap();
        assert!(repairs.records.is_empty());
    }
}
