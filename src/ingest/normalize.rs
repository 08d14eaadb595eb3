//! Normalization of raw collaborator records into [`TransactionRecord`]s.
//!
//! Coercion happens exactly once here. Every degraded field is logged and
//! reported as a [`NormalizationIssue`] so data-quality problems stay visible
//! while the reports keep working.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::ingest::coerce::{coerce_amount, coerce_quantity, CoerceError};
use crate::ingest::raw::*;
use crate::tax::TaxMode;
use crate::types::*;

/// What went wrong with a raw field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// Amount was missing or not numeric and became 0
    NonNumericAmount,
    /// Amount was negative and was clamped to 0
    NegativeAmount,
    /// Amount magnitude exceeded the accepted maximum and became 0
    AmountOutOfRange,
    /// Quantity was missing or not numeric and became 0
    NonNumericQuantity,
    /// Quantity was negative and was clamped to 0
    NegativeQuantity,
    /// Quantity magnitude exceeded the accepted maximum and became 0
    QuantityOutOfRange,
    /// Tax option not recognized, treated as `none`
    UnknownTaxOption,
    /// Transaction type not recognized, record dropped
    UnknownType,
    /// Return without a usable original type, kept without financial effect
    MissingOriginalType,
    /// Date missing or unparseable, record dropped
    InvalidDate,
}

/// A single data-quality finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationIssue {
    /// Position of the raw record in its input sequence
    pub index: usize,
    /// Record id when the collaborator supplied one
    pub record_id: Option<String>,
    /// Date of the affected record (the parent repair for parts), when readable
    pub date: Option<NaiveDate>,
    pub kind: IssueKind,
    /// The offending raw value, rendered as text
    pub raw_value: String,
}

/// Normalized records plus the issues found while producing them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub issues: Vec<NormalizationIssue>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl<T> Normalized<T> {
    /// True when nothing had to be coerced or dropped
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues of the given kind
    pub fn count_issues(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    pub fn extend(&mut self, other: Normalized<T>) {
        self.records.extend(other.records);
        self.issues.extend(other.issues);
    }
}

struct IssueSink<'a> {
    issues: &'a mut Vec<NormalizationIssue>,
    index: usize,
    record_id: Option<String>,
    date: Option<NaiveDate>,
}

impl IssueSink<'_> {
    fn report(&mut self, kind: IssueKind, raw_value: impl ToString) {
        let raw_value = raw_value.to_string();
        warn!(
            index = self.index,
            record_id = self.record_id.as_deref().unwrap_or("-"),
            ?kind,
            raw_value = %raw_value,
            "degraded transaction field"
        );
        self.issues.push(NormalizationIssue {
            index: self.index,
            record_id: self.record_id.clone(),
            date: self.date,
            kind,
            raw_value,
        });
    }

    fn amount(&mut self, value: &Value) -> i64 {
        match coerce_amount(value) {
            Ok(amount) if amount < 0 => {
                self.report(IssueKind::NegativeAmount, value);
                0
            }
            Ok(amount) => amount,
            Err(CoerceError::OutOfRange) => {
                self.report(IssueKind::AmountOutOfRange, value);
                0
            }
            Err(CoerceError::NotNumeric) => {
                self.report(IssueKind::NonNumericAmount, value);
                0
            }
        }
    }

    fn quantity(&mut self, value: &Value) -> i64 {
        match coerce_quantity(value) {
            Ok(quantity) if quantity < 0 => {
                self.report(IssueKind::NegativeQuantity, value);
                0
            }
            Ok(quantity) => quantity,
            Err(CoerceError::OutOfRange) => {
                self.report(IssueKind::QuantityOutOfRange, value);
                0
            }
            Err(CoerceError::NotNumeric) => {
                self.report(IssueKind::NonNumericQuantity, value);
                0
            }
        }
    }

    // Empty or absent options stay `None` so the caller's default applies.
    fn tax_mode(&mut self, option: Option<&str>) -> Option<TaxMode> {
        let text = option.map(str::trim).filter(|s| !s.is_empty())?;
        match TaxMode::recognize(text) {
            Some(mode) => Some(mode),
            None => {
                self.report(IssueKind::UnknownTaxOption, text);
                Some(TaxMode::None)
            }
        }
    }

    // The sink is built with the parsed date; this only reports a missing one.
    fn date(&mut self, text: Option<&str>) -> Option<NaiveDate> {
        if self.date.is_none() {
            self.report(IssueKind::InvalidDate, text.unwrap_or(""));
        }
        self.date
    }
}

/// Parse the `YYYY-MM-DD` prefix of a stored date or timestamp
pub fn parse_record_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let prefix = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Normalize repair tickets into `Repair` records
pub fn normalize_repairs(raw: &[RawRepair]) -> Normalized<TransactionRecord> {
    let mut out = Normalized::default();
    for (index, repair) in raw.iter().enumerate() {
        let id = key_text(&repair.id);
        let mut sink = IssueSink {
            issues: &mut out.issues,
            index,
            record_id: id.clone(),
            date: repair.date_text().and_then(parse_record_date),
        };
        let Some(date) = sink.date(repair.date_text()) else {
            continue;
        };
        let mut record =
            TransactionRecord::new(TransactionKind::Repair, date, sink.amount(&repair.total_cost));
        record.tax_mode = sink.tax_mode(repair.vat_option.as_deref());
        record.id = id;
        record.customer_id = key_text(&repair.customer_id);
        record.description = repair.description.clone();
        out.records.push(record);
    }
    out
}

/// Normalize purchase/sale/return rows
pub fn normalize_purchases(raw: &[RawPurchase]) -> Normalized<TransactionRecord> {
    let mut out = Normalized::default();
    for (index, purchase) in raw.iter().enumerate() {
        let id = key_text(&purchase.id);
        let mut sink = IssueSink {
            issues: &mut out.issues,
            index,
            record_id: id.clone(),
            date: purchase.date_text().and_then(parse_record_date),
        };
        let label = purchase.kind.as_deref().unwrap_or("");
        let Some(kind) = TransactionKind::from_label(label) else {
            sink.report(IssueKind::UnknownType, label);
            continue;
        };
        let Some(date) = sink.date(purchase.date_text()) else {
            continue;
        };

        let mut record = TransactionRecord::new(kind, date, sink.amount(&purchase.total_amount));
        record.quantity = sink.quantity(&purchase.quantity);
        record.tax_mode = sink.tax_mode(purchase.tax_option_text());
        if kind == TransactionKind::Return {
            let original = purchase.original_type.as_deref().unwrap_or("");
            record.original_kind = match TransactionKind::from_label(original) {
                Some(k @ (TransactionKind::Sale | TransactionKind::Purchase)) => Some(k),
                _ => {
                    sink.report(IssueKind::MissingOriginalType, original);
                    None
                }
            };
        }
        record.id = id;
        record.customer_id = key_text(&purchase.customer_id);
        record.product_id = key_text(&purchase.product_id);
        record.description = purchase
            .description
            .clone()
            .or_else(|| purchase.product_name.clone());
        out.records.push(record);
    }
    out
}

/// Normalize part usage rows
pub fn normalize_repair_parts(raw: &[RawRepairPart]) -> Normalized<RepairPartUsage> {
    let mut out = Normalized::default();
    for (index, part) in raw.iter().enumerate() {
        let product_id = key_text(&part.product_id);
        let mut sink = IssueSink {
            issues: &mut out.issues,
            index,
            record_id: product_id.clone(),
            date: None,
        };
        let quantity = sink.quantity(&part.quantity);
        out.records.push(RepairPartUsage {
            product_id,
            quantity,
        });
    }
    out
}

/// Collect and normalize the parts embedded in repair tickets.
/// Part issues carry the date of their repair.
pub fn repair_parts_of(repairs: &[RawRepair]) -> Normalized<RepairPartUsage> {
    let mut out = Normalized::default();
    for repair in repairs {
        let date = repair.date_text().and_then(parse_record_date);
        let offset = out.records.len();
        let mut parts = normalize_repair_parts(&repair.parts);
        for issue in &mut parts.issues {
            issue.index += offset;
            issue.date = date;
        }
        out.extend(parts);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repairs(value: serde_json::Value) -> Vec<RawRepair> {
        serde_json::from_value(value).unwrap()
    }

    fn purchases(value: serde_json::Value) -> Vec<RawPurchase> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_clean_repair() {
        let out = normalize_repairs(&repairs(json!([{
            "id": 7,
            "total_cost": "110000",
            "vat_option": "included",
            "repair_date": "2024-01-15T09:30:00",
            "customer_id": 3
        }])));
        assert!(out.is_clean());
        let record = &out.records[0];
        assert_eq!(record.kind, TransactionKind::Repair);
        assert_eq!(record.gross_amount, 110000);
        assert_eq!(record.tax_mode, Some(TaxMode::Included));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(record.id.as_deref(), Some("7"));
        assert_eq!(record.customer_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_degraded_amount_is_reported() {
        let out = normalize_repairs(&repairs(json!([
            {"total_cost": "n/a", "date": "2024-01-01"},
            {"total_cost": -500, "date": "2024-01-01"}
        ])));
        assert_eq!(out.records.len(), 2);
        assert!(out.records.iter().all(|r| r.gross_amount == 0));
        assert_eq!(out.count_issues(IssueKind::NonNumericAmount), 1);
        assert_eq!(out.count_issues(IssueKind::NegativeAmount), 1);
    }

    #[test]
    fn test_empty_tax_option_stays_absent() {
        let out = normalize_repairs(&repairs(json!([
            {"total_cost": 1000, "vat_option": "", "date": "2024-01-01"},
            {"total_cost": 1000, "vat_option": "zero-rated", "date": "2024-01-01"}
        ])));
        assert_eq!(out.records[0].tax_mode, None);
        assert_eq!(out.records[1].tax_mode, Some(TaxMode::None));
        assert_eq!(out.count_issues(IssueKind::UnknownTaxOption), 1);
    }

    #[test]
    fn test_undated_records_are_dropped() {
        let out = normalize_repairs(&repairs(json!([
            {"total_cost": 1000},
            {"total_cost": 1000, "date": "15/01/2024"}
        ])));
        assert!(out.records.is_empty());
        assert_eq!(out.count_issues(IssueKind::InvalidDate), 2);
    }

    #[test]
    fn test_purchase_kinds_and_returns() {
        let out = normalize_purchases(&purchases(json!([
            {"type": "구매", "total_amount": 50000, "tax_option": "excluded",
             "quantity": "10", "purchase_date": "2024-02-01", "product_id": 9},
            {"type": "판매", "total_amount": "22000", "quantity": 4, "date": "2024-02-03"},
            {"type": "반품", "original_type": "판매", "total_amount": 5500,
             "quantity": 1, "date": "2024-02-04"},
            {"type": "반품", "total_amount": 5500, "quantity": 1, "date": "2024-02-04"},
            {"type": "교환", "total_amount": 1, "date": "2024-02-05"}
        ])));
        assert_eq!(out.records.len(), 4);
        assert_eq!(out.records[0].kind, TransactionKind::Purchase);
        assert_eq!(out.records[0].quantity, 10);
        assert_eq!(out.records[0].product_id.as_deref(), Some("9"));
        assert_eq!(out.records[1].tax_mode, None);
        assert!(out.records[2].is_sale_return());
        assert_eq!(out.records[3].original_kind, None);
        assert_eq!(out.count_issues(IssueKind::MissingOriginalType), 1);
        assert_eq!(out.count_issues(IssueKind::UnknownType), 1);
    }

    #[test]
    fn test_bad_quantity_becomes_zero() {
        let out = normalize_purchases(&purchases(json!([
            {"type": "구매", "total_amount": 100, "quantity": "many", "date": "2024-01-01"}
        ])));
        assert_eq!(out.records[0].quantity, 0);
        assert_eq!(out.count_issues(IssueKind::NonNumericQuantity), 1);
    }

    #[test]
    fn test_embedded_repair_parts() {
        let raw = repairs(json!([
            {"total_cost": 1, "date": "2024-01-01",
             "parts": [{"product_id": 1, "quantity": 2}, {"product_id": 2, "quantity": "x"}]},
            {"total_cost": 1, "date": "2024-01-02", "parts": [{"productId": 1, "quantity": 1}]}
        ]));
        let parts = repair_parts_of(&raw);
        assert_eq!(parts.records.len(), 3);
        assert_eq!(parts.records.iter().map(|p| p.quantity).sum::<i64>(), 3);
        assert_eq!(parts.count_issues(IssueKind::NonNumericQuantity), 1);
    }

    #[test]
    fn test_oversized_values_are_reported() {
        let out = normalize_purchases(&purchases(json!([
            {"type": "구매", "total_amount": "9223372036854775807", "tax_option": "excluded",
             "quantity": 1, "date": "2024-01-01"},
            {"type": "구매", "total_amount": 18446744073709551615u64, "quantity": 1e12,
             "date": "2024-01-02"}
        ])));
        assert_eq!(out.records.len(), 2);
        assert!(out.records.iter().all(|r| r.gross_amount == 0));
        assert_eq!(out.count_issues(IssueKind::AmountOutOfRange), 2);
        assert_eq!(out.count_issues(IssueKind::NonNumericAmount), 0);
        assert_eq!(out.records[1].quantity, 0);
        assert_eq!(out.count_issues(IssueKind::QuantityOutOfRange), 1);
    }

    #[test]
    fn test_non_string_fields_degrade_per_row() {
        let raw = parse_purchases_payload(
            r#"[{"type": "구매", "total_amount": 1000, "date": "2024-01-01"},
                {"type": "판매", "total_amount": 1100, "tax_option": 1, "date": "2024-01-02"},
                {"type": 3, "total_amount": 1, "date": "2024-01-03"}]"#,
        )
        .unwrap();
        let out = normalize_purchases(&raw);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[1].tax_mode, Some(TaxMode::None));
        assert_eq!(out.count_issues(IssueKind::UnknownTaxOption), 1);
        assert_eq!(out.count_issues(IssueKind::UnknownType), 1);

        let raw = parse_repairs_payload(
            r#"[{"total_cost": 1000, "repair_date": "2024-01-15"},
                {"total_cost": 2000, "repair_date": 20240115}]"#,
        )
        .unwrap();
        let out = normalize_repairs(&raw);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.count_issues(IssueKind::InvalidDate), 1);
    }

    #[test]
    fn test_issues_carry_record_dates() {
        let out = normalize_purchases(&purchases(json!([
            {"type": "구매", "total_amount": "n/a", "quantity": 1, "date": "2024-03-09"},
            {"type": "구매", "total_amount": 1, "quantity": 1, "date": "garbage"}
        ])));
        assert_eq!(out.issues[0].date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(out.issues[1].date, None);

        let parts = repair_parts_of(&repairs(json!([
            {"total_cost": 1, "date": "2024-01-01", "parts": [{"quantity": 1}]},
            {"total_cost": 1, "date": "2024-02-01", "parts": [{"quantity": "x"}]}
        ])));
        assert_eq!(parts.issues.len(), 1);
        assert_eq!(parts.issues[0].index, 1);
        assert_eq!(parts.issues[0].date, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn test_parse_record_date() {
        assert!(parse_record_date("2024-01-15").is_some());
        assert!(parse_record_date("2024-01-15 10:00:00").is_some());
        assert!(parse_record_date("2024-13-01").is_none());
        assert!(parse_record_date("").is_none());
    }
}
