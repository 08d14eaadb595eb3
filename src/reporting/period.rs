//! Period grouping of revenue and expense records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;
use tracing::debug;

use crate::config::ReportConfig;
use crate::tax::{decompose_vat, TaxMode, VatBreakdown};
use crate::types::*;

/// Totals of one side (sales or purchase) of a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub count: i64,
    pub supply_amount: i64,
    pub vat_amount: i64,
    pub total_amount: i64,
}

impl PeriodTotals {
    /// Add (`sign = 1`) or remove (`sign = -1`) one decomposed record
    fn record(&mut self, split: VatBreakdown, sign: i64) {
        let split = if sign < 0 { -split } else { split };
        self.count += sign;
        self.supply_amount = self.supply_amount.saturating_add(split.supply_amount);
        self.vat_amount = self.vat_amount.saturating_add(split.vat_amount);
        self.total_amount = self.supply_amount.saturating_add(self.vat_amount);
    }
}

impl AddAssign for PeriodTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.count += rhs.count;
        self.supply_amount = self.supply_amount.saturating_add(rhs.supply_amount);
        self.vat_amount = self.vat_amount.saturating_add(rhs.vat_amount);
        self.total_amount = self.total_amount.saturating_add(rhs.total_amount);
    }
}

/// Sales and purchase totals for one period key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBucket {
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`
    pub period: String,
    pub sales: PeriodTotals,
    pub purchase: PeriodTotals,
}

impl PeriodBucket {
    fn new(period: String) -> Self {
        Self {
            period,
            sales: PeriodTotals::default(),
            purchase: PeriodTotals::default(),
        }
    }

    /// Sales total minus purchase total
    pub fn net(&self) -> i64 {
        self.sales.total_amount.saturating_sub(self.purchase.total_amount)
    }
}

/// Presentation class of a net amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetClass {
    Positive,
    Negative,
}

impl NetClass {
    /// Zero counts as positive
    pub fn of(net: i64) -> Self {
        if net < 0 {
            NetClass::Negative
        } else {
            NetClass::Positive
        }
    }
}

/// One report row: a bucket with its net amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRow {
    pub period: String,
    pub sales: PeriodTotals,
    pub purchase: PeriodTotals,
    pub net: i64,
    pub net_class: NetClass,
}

impl From<PeriodBucket> for PeriodRow {
    fn from(bucket: PeriodBucket) -> Self {
        let net = bucket.net();
        Self {
            period: bucket.period,
            sales: bucket.sales,
            purchase: bucket.purchase,
            net,
            net_class: NetClass::of(net),
        }
    }
}

/// Period rows plus the grand total row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub granularity: Granularity,
    pub rows: Vec<PeriodRow>,
    pub grand_total: PeriodRow,
}

impl PeriodReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Net profit and VAT position over the whole report
    pub fn profit_summary(&self) -> ProfitSummary {
        let total = &self.grand_total;
        ProfitSummary {
            revenue_total: total.sales.total_amount,
            expense_total: total.purchase.total_amount,
            net_profit: total.net,
            vat_payable: total.sales.vat_amount.saturating_sub(total.purchase.vat_amount),
            net_class: total.net_class,
        }
    }
}

/// Headline figures derived from a period report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitSummary {
    pub revenue_total: i64,
    pub expense_total: i64,
    /// revenue_total - expense_total
    pub net_profit: i64,
    /// Sales VAT minus purchase VAT
    pub vat_payable: i64,
    pub net_class: NetClass,
}

/// Group revenue and expense records into period buckets ordered by key.
///
/// Revenue records go to `sales`: repairs with a positive cost and sales add,
/// sale returns subtract. Expense records go to `purchase`: purchases and
/// purchase returns add. Records of any other kind are ignored on that side.
/// `default_tax_mode` applies to records without a tax option on both sides.
pub fn group_by_period(
    revenue: &[TransactionRecord],
    expense: &[TransactionRecord],
    granularity: Granularity,
    default_tax_mode: TaxMode,
) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<String, PeriodBucket> = BTreeMap::new();

    for record in revenue {
        let sign = match record.kind {
            TransactionKind::Repair if record.gross_amount > 0 => 1,
            TransactionKind::Sale => 1,
            TransactionKind::Return if record.is_sale_return() => -1,
            _ => continue,
        };
        let split = decompose_vat(record.gross_amount, record.tax_mode_or(default_tax_mode));
        bucket_for(&mut buckets, granularity, record)
            .sales
            .record(split, sign);
    }

    for record in expense {
        if record.kind != TransactionKind::Purchase && !record.is_purchase_return() {
            continue;
        }
        let split = decompose_vat(record.gross_amount, record.tax_mode_or(default_tax_mode));
        bucket_for(&mut buckets, granularity, record)
            .purchase
            .record(split, 1);
    }

    buckets.into_values().collect()
}

// Buckets are created on first touch.
fn bucket_for<'a>(
    buckets: &'a mut BTreeMap<String, PeriodBucket>,
    granularity: Granularity,
    record: &TransactionRecord,
) -> &'a mut PeriodBucket {
    let key = granularity.period_key(record.date);
    buckets
        .entry(key.clone())
        .or_insert_with(|| PeriodBucket::new(key))
}

/// Group records and attach per-row and grand-total net amounts
pub fn build_period_report(
    revenue: &[TransactionRecord],
    expense: &[TransactionRecord],
    granularity: Granularity,
    config: &ReportConfig,
) -> PeriodReport {
    let buckets = group_by_period(
        revenue,
        expense,
        granularity,
        config.grouping_default_tax_mode,
    );

    let mut total = PeriodBucket::new(config.grand_total_label.clone());
    for bucket in &buckets {
        total.sales += bucket.sales;
        total.purchase += bucket.purchase;
    }

    let rows: Vec<PeriodRow> = buckets.into_iter().map(PeriodRow::from).collect();
    let grand_total = PeriodRow::from(total);
    debug!(
        ?granularity,
        periods = rows.len(),
        net = grand_total.net,
        "period report built"
    );

    PeriodReport {
        granularity,
        rows,
        grand_total,
    }
}

/// Period report over the shop's two record streams.
///
/// Repairs and sales feed the sales side, purchases feed the purchase side.
pub fn combined_period_report(
    repairs: &[TransactionRecord],
    purchases: &[TransactionRecord],
    granularity: Granularity,
    config: &ReportConfig,
) -> PeriodReport {
    let revenue: Vec<TransactionRecord> = repairs.iter().chain(purchases).cloned().collect();
    build_period_report(&revenue, purchases, granularity, config)
}
