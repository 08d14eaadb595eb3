//! Stock movement accumulation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::*;

/// Breakdown of how stock moved during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockMovement {
    pub purchased: i64,
    pub sold: i64,
    /// Signed: sale returns add, purchase returns subtract
    pub returned: i64,
    pub used_in_repairs: i64,
    /// Same as `current_stock`
    pub net_change: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockSummary {
    pub total_purchased: i64,
    pub total_sold: i64,
    pub total_returned: i64,
    pub total_used_in_repairs: i64,
    /// purchased - sold + returned - used in repairs
    pub current_stock: i64,
    pub stock_movement: StockMovement,
}

/// Stock position of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStock {
    pub product_id: Option<String>,
    pub summary: StockSummary,
}

/// Folds purchase-stream quantities and repair part usage into stock counters
#[derive(Debug, Clone, Default)]
pub struct StockCalculator {
    total_purchased: i64,
    total_sold: i64,
    total_returned: i64,
    total_used_in_repairs: i64,
}

impl StockCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stock movement from purchases, sales and returns
    pub fn calculate_from_purchases(&mut self, records: &[TransactionRecord]) -> StockSummary {
        self.reset();
        self.apply_purchases(records);
        self.summary()
    }

    /// Parts consumed by repairs
    pub fn calculate_from_repair_parts(&mut self, parts: &[RepairPartUsage]) -> StockSummary {
        self.reset();
        self.apply_repair_parts(parts);
        self.summary()
    }

    /// Purchase stream and repair usage in one run
    pub fn calculate_integrated(
        &mut self,
        records: &[TransactionRecord],
        parts: &[RepairPartUsage],
    ) -> StockSummary {
        self.reset();
        self.apply_purchases(records);
        self.apply_repair_parts(parts);
        let summary = self.summary();
        debug!(
            current_stock = summary.current_stock,
            purchased = summary.total_purchased,
            sold = summary.total_sold,
            "stock calculated"
        );
        summary
    }

    /// One integrated summary per product id, ordered by product id.
    /// Rows without a product id are grouped under `None`.
    pub fn calculate_by_product(
        records: &[TransactionRecord],
        parts: &[RepairPartUsage],
    ) -> Vec<ProductStock> {
        let mut products: BTreeMap<Option<String>, StockCalculator> = BTreeMap::new();
        for record in records {
            products
                .entry(record.product_id.clone())
                .or_default()
                .apply_purchases(std::slice::from_ref(record));
        }
        for part in parts {
            products
                .entry(part.product_id.clone())
                .or_default()
                .apply_repair_parts(std::slice::from_ref(part));
        }
        products
            .into_iter()
            .map(|(product_id, calculator)| ProductStock {
                product_id,
                summary: calculator.summary(),
            })
            .collect()
    }

    pub fn summary(&self) -> StockSummary {
        let current_stock = self
            .total_purchased
            .saturating_sub(self.total_sold)
            .saturating_add(self.total_returned)
            .saturating_sub(self.total_used_in_repairs);
        StockSummary {
            total_purchased: self.total_purchased,
            total_sold: self.total_sold,
            total_returned: self.total_returned,
            total_used_in_repairs: self.total_used_in_repairs,
            current_stock,
            stock_movement: StockMovement {
                purchased: self.total_purchased,
                sold: self.total_sold,
                returned: self.total_returned,
                used_in_repairs: self.total_used_in_repairs,
                net_change: current_stock,
            },
        }
    }

    fn apply_purchases(&mut self, records: &[TransactionRecord]) {
        for record in records {
            match record.kind {
                TransactionKind::Purchase => {
                    self.total_purchased = self.total_purchased.saturating_add(record.quantity)
                }
                TransactionKind::Sale => {
                    self.total_sold = self.total_sold.saturating_add(record.quantity)
                }
                TransactionKind::Return => match record.original_kind {
                    Some(TransactionKind::Sale) => {
                        self.total_returned = self.total_returned.saturating_add(record.quantity)
                    }
                    Some(TransactionKind::Purchase) => {
                        self.total_returned = self.total_returned.saturating_sub(record.quantity)
                    }
                    _ => {}
                },
                TransactionKind::Repair => {}
            }
        }
    }

    fn apply_repair_parts(&mut self, parts: &[RepairPartUsage]) {
        self.total_used_in_repairs = parts
            .iter()
            .fold(self.total_used_in_repairs, |used, p| used.saturating_add(p.quantity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn part(product: &str, quantity: i64) -> RepairPartUsage {
        RepairPartUsage {
            product_id: Some(product.to_string()),
            quantity,
        }
    }

    #[test]
    fn test_purchase_then_sale() {
        let records = vec![
            TransactionRecord::purchase(day(), 10000, 10),
            TransactionRecord::sale(day(), 8000, 4),
        ];
        let summary = StockCalculator::new().calculate_from_purchases(&records);
        assert_eq!(summary.current_stock, 6);
        assert_eq!(summary.total_returned, 0);
        assert_eq!(summary.total_used_in_repairs, 0);
    }

    #[test]
    fn test_return_directions() {
        let records = vec![
            TransactionRecord::purchase(day(), 0, 10),
            TransactionRecord::return_of(TransactionKind::Sale, day(), 0, 3),
            TransactionRecord::return_of(TransactionKind::Purchase, day(), 0, 5),
        ];
        let summary = StockCalculator::new().calculate_from_purchases(&records);
        assert_eq!(summary.total_returned, -2);
        assert_eq!(summary.current_stock, 8);
    }

    #[test]
    fn test_integrated_with_repair_parts() {
        let records = vec![TransactionRecord::purchase(day(), 0, 10)];
        let parts = vec![part("a", 2), part("b", 1)];
        let summary = StockCalculator::new().calculate_integrated(&records, &parts);
        assert_eq!(summary.total_used_in_repairs, 3);
        assert_eq!(summary.current_stock, 7);
        assert_eq!(summary.stock_movement.net_change, 7);
        assert_eq!(summary.stock_movement.used_in_repairs, 3);
    }

    #[test]
    fn test_repair_parts_alone() {
        let summary = StockCalculator::new().calculate_from_repair_parts(&[part("a", 4)]);
        assert_eq!(summary.total_used_in_repairs, 4);
        assert_eq!(summary.current_stock, -4);
    }

    #[test]
    fn test_by_product() {
        let records = vec![
            TransactionRecord::purchase(day(), 0, 10).with_product("a"),
            TransactionRecord::purchase(day(), 0, 3).with_product("b"),
            TransactionRecord::sale(day(), 0, 1).with_product("a"),
        ];
        let products = StockCalculator::calculate_by_product(&records, &[part("b", 2)]);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].product_id.as_deref(), Some("a"));
        assert_eq!(products[0].summary.current_stock, 9);
        assert_eq!(products[1].summary.current_stock, 1);
    }

    #[test]
    fn test_empty_runs_are_zero() {
        let summary = StockCalculator::new().calculate_integrated(&[], &[]);
        assert_eq!(summary, StockSummary::default());
    }
}
