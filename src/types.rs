//! Core types and data structures shared by the aggregation engine

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::tax::TaxMode;

/// Kind of business event a transaction record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Repair ticket billed to a customer
    Repair,
    /// Stock bought from a supplier
    Purchase,
    /// Stock sold to a customer
    Sale,
    /// Reversal of a prior sale or purchase
    Return,
}

impl TransactionKind {
    /// Map a collaborator type label (`구매`/`판매`/`반품` or the English names)
    /// to a kind. Returns `None` for anything unrecognized.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "구매" | "purchase" => Some(TransactionKind::Purchase),
            "판매" | "sale" => Some(TransactionKind::Sale),
            "반품" | "return" => Some(TransactionKind::Return),
            "수리" | "repair" => Some(TransactionKind::Repair),
            _ => None,
        }
    }

    /// Korean label used by the collaborator layer
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Repair => "수리",
            TransactionKind::Purchase => "구매",
            TransactionKind::Sale => "판매",
            TransactionKind::Return => "반품",
        }
    }
}

/// Normalized transaction record consumed by every accumulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Identifier passed through from the collaborator
    pub id: Option<String>,
    /// What kind of event this is
    pub kind: TransactionKind,
    /// Day the event happened
    pub date: NaiveDate,
    /// Gross amount in the smallest currency unit (won)
    pub gross_amount: i64,
    /// Tax option as recorded; `None` means absent so the call site default applies
    pub tax_mode: Option<TaxMode>,
    /// For returns, which kind of transaction is being reversed
    pub original_kind: Option<TransactionKind>,
    /// Units moved, used by stock accumulation only
    pub quantity: i64,
    /// Opaque customer key
    pub customer_id: Option<String>,
    /// Opaque product key
    pub product_id: Option<String>,
    /// Free-form description for detail rows
    pub description: Option<String>,
}

impl TransactionRecord {
    /// Create a record with no tax option, quantity or foreign keys
    pub fn new(kind: TransactionKind, date: NaiveDate, gross_amount: i64) -> Self {
        Self {
            id: None,
            kind,
            date,
            gross_amount,
            tax_mode: None,
            original_kind: None,
            quantity: 0,
            customer_id: None,
            product_id: None,
            description: None,
        }
    }

    /// Repair ticket with the given total cost
    pub fn repair(date: NaiveDate, total_cost: i64) -> Self {
        Self::new(TransactionKind::Repair, date, total_cost)
    }

    /// Purchase of `quantity` units for `total_amount`
    pub fn purchase(date: NaiveDate, total_amount: i64, quantity: i64) -> Self {
        Self::new(TransactionKind::Purchase, date, total_amount).with_quantity(quantity)
    }

    /// Sale of `quantity` units for `total_amount`
    pub fn sale(date: NaiveDate, total_amount: i64, quantity: i64) -> Self {
        Self::new(TransactionKind::Sale, date, total_amount).with_quantity(quantity)
    }

    /// Return reversing a prior `original` transaction
    pub fn return_of(
        original: TransactionKind,
        date: NaiveDate,
        total_amount: i64,
        quantity: i64,
    ) -> Self {
        let mut record =
            Self::new(TransactionKind::Return, date, total_amount).with_quantity(quantity);
        record.original_kind = Some(original);
        record
    }

    pub fn with_tax_mode(mut self, tax_mode: TaxMode) -> Self {
        self.tax_mode = Some(tax_mode);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Tax option of the record, or `default` when none was recorded
    pub fn tax_mode_or(&self, default: TaxMode) -> TaxMode {
        self.tax_mode.unwrap_or(default)
    }

    /// True for a return that reverses a sale
    pub fn is_sale_return(&self) -> bool {
        self.kind == TransactionKind::Return
            && self.original_kind == Some(TransactionKind::Sale)
    }

    /// True for a return that reverses a purchase
    pub fn is_purchase_return(&self) -> bool {
        self.kind == TransactionKind::Return
            && self.original_kind == Some(TransactionKind::Purchase)
    }
}

/// Parts consumed by a repair ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairPartUsage {
    pub product_id: Option<String>,
    pub quantity: i64,
}

/// Period granularity used to group records into buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// `YYYY-MM-DD`
    Daily,
    /// `YYYY-MM`
    #[default]
    Monthly,
    /// `YYYY`
    Yearly,
}

impl Granularity {
    /// Parse `daily`/`monthly`/`yearly` (also `day`/`month`/`year`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "daily" | "day" => Some(Granularity::Daily),
            "monthly" | "month" => Some(Granularity::Monthly),
            "yearly" | "year" => Some(Granularity::Yearly),
            _ => None,
        }
    }

    /// Bucket key for a date. Keys sort lexicographically in date order.
    pub fn period_key(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Daily => date.format("%Y-%m-%d").to_string(),
            Granularity::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
            Granularity::Yearly => format!("{:04}", date.year()),
        }
    }
}

/// Errors raised at the boundaries of the reporting engine.
///
/// The aggregation functions themselves never fail; these cover collaborator
/// fetches, export files and configuration.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Record source error: {0}")]
    Source(String),
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Invalid date range: {0}")]
    InvalidRange(String),
}

/// Result type for reporting operations
pub type ReportResult<T> = Result<T, ReportError>;
