//! Report service that fetches records and runs fresh calculators per request

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::accumulators::*;
use crate::config::ReportConfig;
use crate::ingest::{NormalizationIssue, Normalized};
use crate::query::*;
use crate::reporting::*;
use crate::traits::*;
use crate::types::*;

/// Everything fetched for one request
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub repairs: Normalized<TransactionRecord>,
    pub purchases: Normalized<TransactionRecord>,
    pub repair_parts: Normalized<RepairPartUsage>,
}

impl RecordSet {
    /// Data-quality findings across all three streams
    pub fn issues(&self) -> Vec<NormalizationIssue> {
        self.repairs
            .issues
            .iter()
            .chain(&self.purchases.issues)
            .chain(&self.repair_parts.issues)
            .cloned()
            .collect()
    }
}

/// Headline snapshot for the accounting dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub range: DateRange,
    pub revenue: RevenueSummary,
    pub expense: ExpenseSummary,
    /// Gross revenue minus gross expense
    pub net_profit: i64,
    pub net_class: NetClass,
    /// Sales VAT minus purchase VAT
    pub vat_payable: i64,
    pub stock: StockSummary,
    /// Issues of records dated inside the range; undated ones count only when unbounded
    pub issue_count: usize,
}

/// Orchestrates a [`RecordSource`] and the aggregation engine
pub struct ReportService<S: RecordSource> {
    source: S,
    config: ReportConfig,
}

impl<S: RecordSource> ReportService<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ReportConfig::default())
    }

    pub fn with_config(source: S, config: ReportConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Fetch every stream for the range. Nothing is computed until this completes.
    pub async fn load(&self, range: &DateRange) -> ReportResult<RecordSet> {
        let repairs = self.source.fetch_repairs(range).await?;
        let purchases = self.source.fetch_purchases(range).await?;
        let repair_parts = self.source.fetch_repair_parts(range).await?;
        Ok(RecordSet {
            repairs,
            purchases,
            repair_parts,
        })
    }

    /// Revenue from repairs and sales
    pub async fn revenue_summary(&self, range: &DateRange) -> ReportResult<RevenueSummary> {
        let set = self.load(range).await?;
        Ok(RevenueCalculator::from_config(&self.config)
            .calculate_integrated(&set.repairs.records, &set.purchases.records))
    }

    pub async fn expense_summary(&self, range: &DateRange) -> ReportResult<ExpenseSummary> {
        let set = self.load(range).await?;
        Ok(ExpenseCalculator::from_config(&self.config).calculate_from_purchases(&set.purchases.records))
    }

    /// Stock position from the purchase stream and repair part usage
    pub async fn stock_summary(&self, range: &DateRange) -> ReportResult<StockSummary> {
        let set = self.load(range).await?;
        Ok(StockCalculator::new()
            .calculate_integrated(&set.purchases.records, &set.repair_parts.records))
    }

    pub async fn stock_by_product(&self, range: &DateRange) -> ReportResult<Vec<ProductStock>> {
        let set = self.load(range).await?;
        Ok(StockCalculator::calculate_by_product(
            &set.purchases.records,
            &set.repair_parts.records,
        ))
    }

    /// Period report; `granularity` falls back to the configured one
    pub async fn period_report(
        &self,
        range: &DateRange,
        granularity: Option<Granularity>,
    ) -> ReportResult<PeriodReport> {
        let set = self.load(range).await?;
        let granularity = granularity.unwrap_or(self.config.granularity);
        let report = combined_period_report(
            &set.repairs.records,
            &set.purchases.records,
            granularity,
            &self.config,
        );
        info!(
            ?granularity,
            periods = report.rows.len(),
            net = report.grand_total.net,
            issues = set.issues().len(),
            "period report generated"
        );
        Ok(report)
    }

    /// Period report rendered in the export format
    pub async fn export_period_report(
        &self,
        range: &DateRange,
        granularity: Option<Granularity>,
    ) -> ReportResult<String> {
        let report = self.period_report(range, granularity).await?;
        report_to_csv_string(&report, self.config.include_grand_total_in_export)
    }

    pub async fn details(
        &self,
        detail_type: DetailType,
        range: &DateRange,
    ) -> ReportResult<DetailReport> {
        let set = self.load(range).await?;
        Ok(query_details(
            detail_type,
            range,
            &set.repairs.records,
            &set.purchases.records,
            &self.config,
        ))
    }

    /// Revenue, expense, net profit and stock from a single fetch
    pub async fn dashboard(&self, range: &DateRange) -> ReportResult<Dashboard> {
        let set = self.load(range).await?;
        let revenue = RevenueCalculator::from_config(&self.config)
            .calculate_integrated(&set.repairs.records, &set.purchases.records);
        let expense =
            ExpenseCalculator::from_config(&self.config).calculate_from_purchases(&set.purchases.records);
        let stock = StockCalculator::new()
            .calculate_integrated(&set.purchases.records, &set.repair_parts.records);

        let net_profit = revenue.total_revenue.saturating_sub(expense.total_expense);
        let dashboard = Dashboard {
            range: *range,
            revenue,
            expense,
            net_profit,
            net_class: NetClass::of(net_profit),
            vat_payable: revenue
                .total_revenue_vat
                .saturating_sub(expense.total_expense_vat),
            stock,
            issue_count: set.issues().len(),
        };
        info!(
            revenue = dashboard.revenue.total_revenue,
            expense = dashboard.expense.total_expense,
            net_profit,
            issues = dashboard.issue_count,
            "dashboard generated"
        );
        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryRecordSource;

    fn service() -> ReportService<MemoryRecordSource> {
        let source = MemoryRecordSource::from_json(
            r#"{"repairs": [
                {"id": 1, "total_cost": 110000, "vat_option": "included", "repair_date": "2024-01-15",
                 "parts": [{"product_id": 1, "quantity": 1}]}
            ]}"#,
            r#"{"purchases": [
                {"id": 1, "type": "구매", "total_amount": 50000, "tax_option": "excluded",
                 "quantity": 10, "purchase_date": "2024-01-02", "product_id": 1},
                {"id": 2, "type": "판매", "total_amount": 22000, "quantity": 4,
                 "purchase_date": "2024-03-02", "product_id": 1}
            ]}"#,
        )
        .unwrap();
        ReportService::new(source)
    }

    #[tokio::test]
    async fn test_dashboard() {
        let dashboard = service().dashboard(&DateRange::unbounded()).await.unwrap();
        assert_eq!(dashboard.revenue.total_revenue, 132000);
        assert_eq!(dashboard.expense.total_expense, 55000);
        assert_eq!(dashboard.net_profit, 77000);
        assert_eq!(dashboard.net_class, NetClass::Positive);
        assert_eq!(dashboard.vat_payable, 12000 - 5000);
        assert_eq!(dashboard.stock.current_stock, 5);
        assert_eq!(dashboard.issue_count, 0);
    }

    #[tokio::test]
    async fn test_issue_count_is_scoped_to_range() {
        let source = MemoryRecordSource::from_json(
            r#"[{"total_cost": "n/a", "repair_date": "2024-01-05"},
                {"total_cost": -10, "repair_date": "2024-03-05"}]"#,
            r#"[{"type": "구매", "total_amount": "9223372036854775807", "tax_option": "excluded",
                 "quantity": 1, "purchase_date": "2024-03-01"}]"#,
        )
        .unwrap();
        let service = ReportService::new(source);

        let january = DateRange::parse(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        assert_eq!(service.dashboard(&january).await.unwrap().issue_count, 1);

        let all = service.dashboard(&DateRange::unbounded()).await.unwrap();
        assert_eq!(all.issue_count, 3);
        assert_eq!(all.expense.total_expense, 0);
    }

    #[tokio::test]
    async fn test_repeated_requests_do_not_accumulate() {
        let service = service();
        let first = service.revenue_summary(&DateRange::unbounded()).await.unwrap();
        let second = service.revenue_summary(&DateRange::unbounded()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_period_report_uses_configured_granularity() {
        let report = service()
            .period_report(&DateRange::unbounded(), None)
            .await
            .unwrap();
        assert_eq!(report.granularity, Granularity::Monthly);
        let keys: Vec<&str> = report.rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(keys, vec!["2024-01", "2024-03"]);

        let yearly = service()
            .period_report(&DateRange::unbounded(), Some(Granularity::Yearly))
            .await
            .unwrap();
        assert_eq!(yearly.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_export_includes_grand_total() {
        let text = service()
            .export_period_report(&DateRange::unbounded(), None)
            .await
            .unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().last().unwrap().starts_with("\"합계\""));
    }
}
