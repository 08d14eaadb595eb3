//! Revenue accumulation from repairs and sales

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ReportConfig;
use crate::tax::{decompose_vat, TaxMode};
use crate::types::*;

/// Revenue totals as handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevenueSummary {
    /// Gross revenue (supply + VAT)
    pub total_revenue: i64,
    /// VAT collected
    pub total_revenue_vat: i64,
    /// Number of contributing records, net of sale returns
    pub revenue_count: i64,
    /// Revenue before VAT
    pub supply_amount: i64,
}

/// Folds repair tickets and sales into revenue totals.
///
/// Every `calculate_*` call starts from zero; build one calculator per request.
#[derive(Debug, Clone)]
pub struct RevenueCalculator {
    // Supply only; the summary's `total_revenue` is gross.
    total_revenue: i64,
    total_revenue_vat: i64,
    revenue_count: i64,
    repair_default_tax_mode: TaxMode,
    purchase_default_tax_mode: TaxMode,
}

impl Default for RevenueCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl RevenueCalculator {
    /// Calculator with the standard defaults: repairs `none`, sales `included`
    pub fn new() -> Self {
        Self::from_config(&ReportConfig::default())
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            total_revenue: 0,
            total_revenue_vat: 0,
            revenue_count: 0,
            repair_default_tax_mode: config.repair_default_tax_mode,
            purchase_default_tax_mode: config.purchase_default_tax_mode,
        }
    }

    /// Zero all totals
    pub fn reset(&mut self) {
        self.total_revenue = 0;
        self.total_revenue_vat = 0;
        self.revenue_count = 0;
    }

    /// Revenue from repair tickets. Tickets with a non-positive cost are skipped.
    pub fn calculate_from_repairs(&mut self, repairs: &[TransactionRecord]) -> RevenueSummary {
        self.reset();
        self.apply_repairs(repairs);
        self.finish("repairs")
    }

    /// Revenue from the purchase stream: sales add, sale returns subtract.
    ///
    /// The count is decremented for each sale return and is not clamped at zero.
    pub fn calculate_from_purchases(&mut self, records: &[TransactionRecord]) -> RevenueSummary {
        self.reset();
        self.apply_purchases(records);
        self.finish("purchases")
    }

    /// Repairs and sales together in one run
    pub fn calculate_integrated(
        &mut self,
        repairs: &[TransactionRecord],
        records: &[TransactionRecord],
    ) -> RevenueSummary {
        self.reset();
        self.apply_repairs(repairs);
        self.apply_purchases(records);
        self.finish("integrated")
    }

    pub fn summary(&self) -> RevenueSummary {
        RevenueSummary {
            total_revenue: self.total_revenue.saturating_add(self.total_revenue_vat),
            total_revenue_vat: self.total_revenue_vat,
            revenue_count: self.revenue_count,
            supply_amount: self.total_revenue,
        }
    }

    fn apply_repairs(&mut self, repairs: &[TransactionRecord]) {
        for repair in repairs
            .iter()
            .filter(|r| r.kind == TransactionKind::Repair && r.gross_amount > 0)
        {
            let split = decompose_vat(
                repair.gross_amount,
                repair.tax_mode_or(self.repair_default_tax_mode),
            );
            self.total_revenue = self.total_revenue.saturating_add(split.supply_amount);
            self.total_revenue_vat = self.total_revenue_vat.saturating_add(split.vat_amount);
            self.revenue_count += 1;
        }
    }

    fn apply_purchases(&mut self, records: &[TransactionRecord]) {
        for record in records {
            let sign = match record.kind {
                TransactionKind::Sale => 1,
                TransactionKind::Return if record.is_sale_return() => -1,
                _ => continue,
            };
            let split = decompose_vat(
                record.gross_amount,
                record.tax_mode_or(self.purchase_default_tax_mode),
            );
            let split = if sign < 0 { -split } else { split };
            self.total_revenue = self.total_revenue.saturating_add(split.supply_amount);
            self.total_revenue_vat = self.total_revenue_vat.saturating_add(split.vat_amount);
            self.revenue_count += sign;
        }
    }

    fn finish(&self, source: &str) -> RevenueSummary {
        let summary = self.summary();
        debug!(
            source,
            total = summary.total_revenue,
            vat = summary.total_revenue_vat,
            count = summary.revenue_count,
            "revenue calculated"
        );
        summary
    }
}
