//! Loosely typed record shapes as delivered by the API collaborator

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::*;

/// Repair ticket as returned by `GET /repairs`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRepair {
    #[serde(default)]
    pub id: Value,
    #[serde(default, alias = "totalCost")]
    pub total_cost: Value,
    #[serde(default, deserialize_with = "lenient_text", alias = "vatOption")]
    pub vat_option: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", alias = "repairDate")]
    pub repair_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "customerId")]
    pub customer_id: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_parts")]
    pub parts: Vec<RawRepairPart>,
}

/// Purchase, sale or return row as returned by `GET /purchases`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPurchase {
    #[serde(default)]
    pub id: Value,
    #[serde(default, alias = "totalAmount")]
    pub total_amount: Value,
    #[serde(default, deserialize_with = "lenient_text", alias = "taxOption")]
    pub tax_option: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", alias = "vatOption")]
    pub vat_option: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", alias = "originalType")]
    pub original_type: Option<String>,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default, deserialize_with = "lenient_text", alias = "purchaseDate")]
    pub purchase_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "customerId")]
    pub customer_id: Value,
    #[serde(default, alias = "productId")]
    pub product_id: Value,
    #[serde(default, deserialize_with = "lenient_text", alias = "productName")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

/// Part consumed by a repair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRepairPart {
    #[serde(default, alias = "productId")]
    pub product_id: Value,
    #[serde(default)]
    pub quantity: Value,
}

impl RawRepair {
    /// First date field present, in order of preference
    pub fn date_text(&self) -> Option<&str> {
        first_present(&[&self.repair_date, &self.date, &self.created_at])
    }
}

impl RawPurchase {
    pub fn date_text(&self) -> Option<&str> {
        first_present(&[&self.purchase_date, &self.date, &self.created_at])
    }

    /// `tax_option`, falling back to the `vat_option` spelling
    pub fn tax_option_text(&self) -> Option<&str> {
        first_present(&[&self.tax_option, &self.vat_option])
    }
}

fn first_present<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

// Text fields accept any scalar so one odd row cannot sink the payload;
// the normalizer reports values it cannot interpret.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

// Non-array `parts` and non-object entries are skipped.
fn lenient_parts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RawRepairPart>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Render an opaque key (string or number) as a string
pub fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RepairsPayload {
    Envelope { repairs: Vec<RawRepair> },
    Bare(Vec<RawRepair>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PurchasesPayload {
    Envelope { purchases: Vec<RawPurchase> },
    Bare(Vec<RawPurchase>),
}

/// Parse `{"repairs": [...]}` or a bare array of repairs
pub fn parse_repairs_payload(json: &str) -> ReportResult<Vec<RawRepair>> {
    let payload: RepairsPayload = serde_json::from_str(json)
        .map_err(|e| ReportError::Parse(format!("repairs payload: {e}")))?;
    Ok(match payload {
        RepairsPayload::Envelope { repairs } => repairs,
        RepairsPayload::Bare(repairs) => repairs,
    })
}

/// Parse `{"purchases": [...]}` or a bare array of purchases
pub fn parse_purchases_payload(json: &str) -> ReportResult<Vec<RawPurchase>> {
    let payload: PurchasesPayload = serde_json::from_str(json)
        .map_err(|e| ReportError::Parse(format!("purchases payload: {e}")))?;
    Ok(match payload {
        PurchasesPayload::Envelope { purchases } => purchases,
        PurchasesPayload::Bare(purchases) => purchases,
    })
}
