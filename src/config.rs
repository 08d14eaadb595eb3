//! Reporting configuration

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::tax::TaxMode;
use crate::types::*;

/// Knobs that shape report output.
///
/// The tax-mode defaults differ per call site. Repairs fall back to `none`,
/// purchase-stream rows to `included`, and period grouping to `none` on
/// both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Granularity used when a report does not ask for one
    pub granularity: Granularity,
    /// Tax mode for repair records without a VAT option
    pub repair_default_tax_mode: TaxMode,
    /// Tax mode for purchase/sale/return rows without a tax option, outside grouping
    pub purchase_default_tax_mode: TaxMode,
    /// Tax mode for records without an option inside period grouping
    pub grouping_default_tax_mode: TaxMode,
    /// Append the grand total row to exports
    pub include_grand_total_in_export: bool,
    /// Period cell text of the grand total row
    pub grand_total_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Monthly,
            repair_default_tax_mode: TaxMode::None,
            purchase_default_tax_mode: TaxMode::Included,
            grouping_default_tax_mode: TaxMode::None,
            include_grand_total_in_export: true,
            grand_total_label: "합계".into(),
        }
    }
}

impl ReportConfig {
    /// Parse a JSON document; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> ReportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file, or defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> ReportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no report config, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn to_json_string(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_call_sites() {
        let config = ReportConfig::default();
        assert_eq!(config.repair_default_tax_mode, TaxMode::None);
        assert_eq!(config.purchase_default_tax_mode, TaxMode::Included);
        assert_eq!(config.grouping_default_tax_mode, TaxMode::None);
        assert_eq!(config.granularity, Granularity::Monthly);
        assert!(config.include_grand_total_in_export);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ReportConfig::from_json_str(
            r#"{"granularity": "yearly", "purchase_default_tax_mode": "exclude"}"#,
        )
        .unwrap();
        assert_eq!(config.granularity, Granularity::Yearly);
        assert_eq!(config.purchase_default_tax_mode, TaxMode::Excluded);
        assert_eq!(config.repair_default_tax_mode, TaxMode::None);
        assert_eq!(config.grand_total_label, "합계");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ReportConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ReportConfig::load("/nonexistent/report-config.json").unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = ReportConfig {
            granularity: Granularity::Daily,
            ..ReportConfig::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(ReportConfig::from_json_str(&json).unwrap(), config);
    }
}
