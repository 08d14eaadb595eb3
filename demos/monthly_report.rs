//! Monthly report walkthrough over an in-memory record source

use repair_accounting_core::{
    decompose_vat, init, utils::MemoryRecordSource, DateRange, DetailType, Granularity,
    ReportService, TaxMode,
};

const REPAIRS: &str = r#"{"repairs": [
    {"id": 101, "total_cost": "110,000", "vat_option": "included", "repair_date": "2024-01-15",
     "customer_id": 7, "description": "Screen replacement",
     "parts": [{"product_id": 1, "quantity": 1}]},
    {"id": 102, "total_cost": 33000, "vat_option": "included", "repair_date": "2024-02-03",
     "parts": [{"product_id": 2, "quantity": 2}]},
    {"id": 103, "total_cost": 0, "repair_date": "2024-02-10", "description": "Warranty check"}
]}"#;

const PURCHASES: &str = r#"{"purchases": [
    {"id": 1, "type": "구매", "total_amount": 50000, "tax_option": "excluded",
     "quantity": 10, "purchase_date": "2024-01-02", "product_id": 1},
    {"id": 2, "type": "판매", "total_amount": 22000, "tax_option": "included",
     "quantity": 2, "purchase_date": "2024-01-20", "product_id": 1},
    {"id": 3, "type": "반품", "original_type": "판매", "total_amount": 11000,
     "tax_option": "included", "quantity": 1, "purchase_date": "2024-02-05", "product_id": 1},
    {"id": 4, "type": "구매", "total_amount": "abc", "quantity": 5, "purchase_date": "2024-02-07",
     "product_id": 2}
]}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init();
    println!("🔧 Repair Accounting Core - Monthly Report Example\n");

    // 1. VAT decomposition in each mode
    println!("🧾 VAT Decomposition of 110,000:");
    for mode in [TaxMode::Included, TaxMode::Excluded, TaxMode::None] {
        let split = decompose_vat(110000, mode);
        println!(
            "  {:<9} supply ₩{:>7}  VAT ₩{:>6}  total ₩{:>7}",
            mode.as_str(),
            split.supply_amount,
            split.vat_amount,
            split.total()
        );
    }
    println!();

    let source = MemoryRecordSource::from_json(REPAIRS, PURCHASES)?;
    let service = ReportService::new(source);
    let all_time = DateRange::unbounded();

    // 2. Dashboard
    println!("📊 Dashboard:");
    let dashboard = service.dashboard(&all_time).await?;
    println!("  Revenue:     ₩{} ({} records)", dashboard.revenue.total_revenue, dashboard.revenue.revenue_count);
    println!("  Expense:     ₩{} ({} records)", dashboard.expense.total_expense, dashboard.expense.expense_count);
    println!("  Net Profit:  ₩{} ({:?})", dashboard.net_profit, dashboard.net_class);
    println!("  VAT Payable: ₩{}", dashboard.vat_payable);
    println!("  Stock:       {} units", dashboard.stock.current_stock);
    println!("  Data issues: {}", dashboard.issue_count);
    println!();

    // 3. Monthly report and export
    println!("📅 Monthly Report:");
    let report = service.period_report(&all_time, Some(Granularity::Monthly)).await?;
    for row in &report.rows {
        println!(
            "  {}  sales ₩{:>7}  purchase ₩{:>7}  net ₩{:>7}",
            row.period, row.sales.total_amount, row.purchase.total_amount, row.net
        );
    }
    println!();

    println!("📤 Export:");
    let exported = service.export_period_report(&all_time, None).await?;
    for line in exported.lines() {
        println!("  {}", line);
    }
    println!();

    // 4. Detail query for January
    println!("🔍 January Revenue Details:");
    let january = DateRange::parse(Some("2024-01-01"), Some("2024-01-31"))?;
    let details = service.details(DetailType::Revenue, &january).await?;
    for row in &details.rows {
        println!("  {} {:?} ₩{}", row.label, row.kind, row.amount);
    }
    println!(
        "  Total ₩{} over {} rows (average ₩{})",
        details.summary.total_amount, details.summary.total_count, details.summary.average_amount
    );
    println!();

    // 5. Stock by product
    println!("📦 Stock by Product:");
    for product in service.stock_by_product(&all_time).await? {
        println!(
            "  {:<6} {} units",
            product.product_id.as_deref().unwrap_or("-"),
            product.summary.current_stock
        );
    }

    println!("\n🎉 Monthly report example completed successfully!");
    Ok(())
}
