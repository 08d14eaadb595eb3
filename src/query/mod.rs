//! Summary and detail queries over a date range

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::ingest::parse_record_date;
use crate::reporting::combined_period_report;
use crate::tax::{decompose_vat, TaxMode, VatBreakdown};
use crate::types::*;

/// Which view a detail query produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailType {
    Revenue,
    Expense,
    Vat,
    Net,
}

impl DetailType {
    /// Parse `revenue`/`expense`/`vat`/`net` or the Korean menu names
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "revenue" | "매출" => Some(DetailType::Revenue),
            "expense" | "매입" => Some(DetailType::Expense),
            "vat" | "부가세" => Some(DetailType::Vat),
            "net" | "순이익" => Some(DetailType::Net),
            _ => None,
        }
    }
}

/// Inclusive date range; a missing bound is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ReportResult<Self> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(ReportError::InvalidRange(format!("{f} is after {t}")));
            }
        }
        Ok(Self { from, to })
    }

    /// Range covering every record
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build from `YYYY-MM-DD` strings as sent by a date picker; empty means open
    pub fn parse(from: Option<&str>, to: Option<&str>) -> ReportResult<Self> {
        let bound = |text: Option<&str>| -> ReportResult<Option<NaiveDate>> {
            match text.map(str::trim).filter(|s| !s.is_empty()) {
                None => Ok(None),
                Some(s) => parse_record_date(s)
                    .map(Some)
                    .ok_or_else(|| ReportError::InvalidRange(format!("not a date: {s}"))),
            }
        };
        Self::new(bound(from)?, bound(to)?)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|f| date >= f) && self.to.is_none_or(|t| date <= t)
    }
}

/// Records whose date falls inside the range
pub fn filter_by_date(records: &[TransactionRecord], range: &DateRange) -> Vec<TransactionRecord> {
    records
        .iter()
        .filter(|r| range.contains(r.date))
        .cloned()
        .collect()
}

/// One line of a detail table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRow {
    /// Record date, or the period key for net rows
    pub label: String,
    pub kind: Option<TransactionKind>,
    pub record_id: Option<String>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub description: Option<String>,
    pub supply_amount: i64,
    pub vat_amount: i64,
    pub total_amount: i64,
    /// The figure this view sums; negative for reversals
    pub amount: i64,
}

impl DetailRow {
    fn from_record(record: &TransactionRecord, split: VatBreakdown, amount: i64) -> Self {
        Self {
            label: record.date.format("%Y-%m-%d").to_string(),
            kind: Some(record.kind),
            record_id: record.id.clone(),
            customer_id: record.customer_id.clone(),
            product_id: record.product_id.clone(),
            description: record.description.clone(),
            supply_amount: split.supply_amount,
            vat_amount: split.vat_amount,
            total_amount: split.total(),
            amount,
        }
    }
}

/// Summary strip shown above a detail table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetailSummary {
    pub total_amount: i64,
    pub total_count: i64,
    /// total_amount / total_count rounded to the won, ties toward +∞; 0 when there are no rows
    pub average_amount: i64,
}

impl DetailSummary {
    pub fn of(rows: &[DetailRow]) -> Self {
        let total_amount = rows.iter().fold(0i64, |sum, r| sum.saturating_add(r.amount));
        let total_count = rows.len() as i64;
        Self {
            total_amount,
            total_count,
            average_amount: average(total_amount, total_count),
        }
    }
}

// Ties round toward positive infinity: 2.5 -> 3, -2.5 -> -2.
fn average(total: i64, count: i64) -> i64 {
    if count == 0 {
        return 0;
    }
    let half = BigDecimal::new(5.into(), 1);
    (BigDecimal::from(total) / BigDecimal::from(count) + half)
        .with_scale_round(0, RoundingMode::Floor)
        .to_i64()
        .unwrap_or(0)
}

fn signed(sign: i64, amount: i64) -> i64 {
    if sign < 0 {
        amount.saturating_neg()
    } else {
        amount
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailReport {
    pub detail_type: DetailType,
    pub range: DateRange,
    pub rows: Vec<DetailRow>,
    pub summary: DetailSummary,
}

/// Run a detail query.
///
/// Records are filtered by the inclusive range first, then routed through the
/// same rules the accumulators and the period grouping use, so view totals
/// reconcile with the summaries.
pub fn query_details(
    detail_type: DetailType,
    range: &DateRange,
    repairs: &[TransactionRecord],
    purchases: &[TransactionRecord],
    config: &ReportConfig,
) -> DetailReport {
    let repairs = filter_by_date(repairs, range);
    let purchases = filter_by_date(purchases, range);

    let rows = match detail_type {
        DetailType::Revenue => revenue_rows(&repairs, &purchases, config)
            .into_iter()
            .map(|(record, split, sign)| DetailRow::from_record(record, split, signed(sign, split.total())))
            .collect(),
        DetailType::Expense => expense_rows(&purchases, config)
            .into_iter()
            .map(|(record, split)| DetailRow::from_record(record, split, split.total()))
            .collect(),
        DetailType::Vat => vat_rows(&repairs, &purchases, config),
        DetailType::Net => net_rows(&repairs, &purchases, config),
    };

    let summary = DetailSummary::of(&rows);
    tracing::debug!(
        ?detail_type,
        rows = summary.total_count,
        total = summary.total_amount,
        "detail query"
    );
    DetailReport {
        detail_type,
        range: *range,
        rows,
        summary,
    }
}

// Mirrors the revenue accumulator: positive repairs and sales add, sale returns subtract.
fn revenue_rows<'a>(
    repairs: &'a [TransactionRecord],
    purchases: &'a [TransactionRecord],
    config: &ReportConfig,
) -> Vec<(&'a TransactionRecord, VatBreakdown, i64)> {
    let mut rows: Vec<(&TransactionRecord, VatBreakdown, i64)> = repairs
        .iter()
        .filter(|r| r.kind == TransactionKind::Repair && r.gross_amount > 0)
        .map(|r| (r, split(r, config.repair_default_tax_mode), 1))
        .collect();
    for record in purchases {
        let sign = match record.kind {
            TransactionKind::Sale => 1,
            TransactionKind::Return if record.is_sale_return() => -1,
            _ => continue,
        };
        rows.push((record, split(record, config.purchase_default_tax_mode), sign));
    }
    rows.sort_by_key(|(record, _, _)| record.date);
    rows
}

// Mirrors the expense accumulator: purchases and purchase returns both add.
fn expense_rows<'a>(
    purchases: &'a [TransactionRecord],
    config: &ReportConfig,
) -> Vec<(&'a TransactionRecord, VatBreakdown)> {
    purchases
        .iter()
        .filter(|r| r.kind == TransactionKind::Purchase || r.is_purchase_return())
        .map(|r| (r, split(r, config.purchase_default_tax_mode)))
        .collect()
}

// Sales VAT counts positive, purchase VAT negative; the total is VAT payable.
fn vat_rows(
    repairs: &[TransactionRecord],
    purchases: &[TransactionRecord],
    config: &ReportConfig,
) -> Vec<DetailRow> {
    let mut rows: Vec<DetailRow> = revenue_rows(repairs, purchases, config)
        .into_iter()
        .map(|(record, split, sign)| DetailRow::from_record(record, split, signed(sign, split.vat_amount)))
        .chain(
            expense_rows(purchases, config)
                .into_iter()
                .map(|(record, split)| DetailRow::from_record(record, split, split.vat_amount.saturating_neg())),
        )
        .collect();
    rows.sort_by(|a, b| a.label.cmp(&b.label));
    rows
}

fn net_rows(
    repairs: &[TransactionRecord],
    purchases: &[TransactionRecord],
    config: &ReportConfig,
) -> Vec<DetailRow> {
    combined_period_report(repairs, purchases, config.granularity, config)
        .rows
        .into_iter()
        .map(|row| DetailRow {
            label: row.period,
            kind: None,
            record_id: None,
            customer_id: None,
            product_id: None,
            description: None,
            supply_amount: row.sales.supply_amount.saturating_sub(row.purchase.supply_amount),
            vat_amount: row.sales.vat_amount.saturating_sub(row.purchase.vat_amount),
            total_amount: row.net,
            amount: row.net,
        })
        .collect()
}

fn split(record: &TransactionRecord, default: TaxMode) -> VatBreakdown {
    decompose_vat(record.gross_amount, record.tax_mode_or(default))
}
