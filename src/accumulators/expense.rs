//! Expense accumulation from purchases

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ReportConfig;
use crate::tax::{decompose_vat, TaxMode};
use crate::types::*;

/// Expense totals as handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpenseSummary {
    /// Gross expense (supply + VAT)
    pub total_expense: i64,
    /// VAT paid
    pub total_expense_vat: i64,
    pub expense_count: i64,
    /// Expense before VAT
    pub supply_amount: i64,
}

/// Folds purchases and purchase returns into expense totals.
///
/// A purchase return is counted as an additional expense event, not as a
/// reversal. Rows without a tax option are treated as VAT-included.
#[derive(Debug, Clone)]
pub struct ExpenseCalculator {
    // Supply only; the summary's `total_expense` is gross.
    total_expense: i64,
    total_expense_vat: i64,
    expense_count: i64,
    default_tax_mode: TaxMode,
}

impl Default for ExpenseCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpenseCalculator {
    pub fn new() -> Self {
        Self::from_config(&ReportConfig::default())
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            total_expense: 0,
            total_expense_vat: 0,
            expense_count: 0,
            default_tax_mode: config.purchase_default_tax_mode,
        }
    }

    pub fn reset(&mut self) {
        self.total_expense = 0;
        self.total_expense_vat = 0;
        self.expense_count = 0;
    }

    /// Expense from the purchase stream; sales and sale returns are ignored
    pub fn calculate_from_purchases(&mut self, records: &[TransactionRecord]) -> ExpenseSummary {
        self.reset();
        for record in records
            .iter()
            .filter(|r| r.kind == TransactionKind::Purchase || r.is_purchase_return())
        {
            let split = decompose_vat(record.gross_amount, record.tax_mode_or(self.default_tax_mode));
            self.total_expense = self.total_expense.saturating_add(split.supply_amount);
            self.total_expense_vat = self.total_expense_vat.saturating_add(split.vat_amount);
            self.expense_count += 1;
        }

        let summary = self.summary();
        debug!(
            total = summary.total_expense,
            vat = summary.total_expense_vat,
            count = summary.expense_count,
            "expense calculated"
        );
        summary
    }

    pub fn summary(&self) -> ExpenseSummary {
        ExpenseSummary {
            total_expense: self.total_expense.saturating_add(self.total_expense_vat),
            total_expense_vat: self.total_expense_vat,
            expense_count: self.expense_count,
            supply_amount: self.total_expense,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    #[test]
    fn test_excluded_purchase() {
        let records = vec![TransactionRecord::purchase(day(), 50000, 1).with_tax_mode(TaxMode::Excluded)];
        let summary = ExpenseCalculator::new().calculate_from_purchases(&records);
        assert_eq!(summary.supply_amount, 50000);
        assert_eq!(summary.total_expense_vat, 5000);
        assert_eq!(summary.total_expense, 55000);
        assert_eq!(summary.expense_count, 1);
    }

    #[test]
    fn test_missing_option_defaults_to_included() {
        let records = vec![TransactionRecord::purchase(day(), 11000, 1)];
        let summary = ExpenseCalculator::new().calculate_from_purchases(&records);
        assert_eq!(summary.supply_amount, 10000);
        assert_eq!(summary.total_expense_vat, 1000);
        assert_eq!(summary.total_expense, 11000);
    }

    #[test]
    fn test_purchase_return_adds() {
        let records = vec![
            TransactionRecord::purchase(day(), 11000, 2),
            TransactionRecord::return_of(TransactionKind::Purchase, day(), 5500, 1),
        ];
        let summary = ExpenseCalculator::new().calculate_from_purchases(&records);
        assert_eq!(summary.total_expense, 16500);
        assert_eq!(summary.expense_count, 2);
    }

    #[test]
    fn test_sales_side_ignored() {
        let records = vec![
            TransactionRecord::sale(day(), 11000, 1),
            TransactionRecord::return_of(TransactionKind::Sale, day(), 11000, 1),
            TransactionRecord::repair(day(), 11000),
        ];
        let summary = ExpenseCalculator::new().calculate_from_purchases(&records);
        assert_eq!(summary, ExpenseSummary::default());
    }

    #[test]
    fn test_configured_default() {
        let config = ReportConfig {
            purchase_default_tax_mode: TaxMode::None,
            ..ReportConfig::default()
        };
        let records = vec![TransactionRecord::purchase(day(), 11000, 1)];
        let summary = ExpenseCalculator::from_config(&config).calculate_from_purchases(&records);
        assert_eq!(summary.total_expense_vat, 0);
        assert_eq!(summary.total_expense, 11000);
    }

    #[test]
    fn test_huge_purchase_saturates() {
        let records = vec![TransactionRecord::purchase(day(), i64::MAX, 1).with_tax_mode(TaxMode::Excluded)];
        let summary = ExpenseCalculator::new().calculate_from_purchases(&records);
        assert_eq!(summary.total_expense, i64::MAX);
        assert_eq!(summary.expense_count, 1);
    }
}
