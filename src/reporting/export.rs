//! Quoted, comma-delimited export of period reports

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::reporting::period::*;
use crate::types::*;

/// Header row of the export: period, sales supply/VAT/total, purchase supply/VAT/total, net
pub const EXPORT_HEADER: [&str; 8] = [
    "기간",
    "매출 공급가액",
    "매출 부가세",
    "매출 총금액",
    "매입 공급가액",
    "매입 부가세",
    "매입 총금액",
    "순이익",
];

/// One exported line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "기간")]
    pub period: String,
    #[serde(rename = "매출 공급가액")]
    pub sales_supply: i64,
    #[serde(rename = "매출 부가세")]
    pub sales_vat: i64,
    #[serde(rename = "매출 총금액")]
    pub sales_total: i64,
    #[serde(rename = "매입 공급가액")]
    pub purchase_supply: i64,
    #[serde(rename = "매입 부가세")]
    pub purchase_vat: i64,
    #[serde(rename = "매입 총금액")]
    pub purchase_total: i64,
    #[serde(rename = "순이익")]
    pub net: i64,
}

impl From<&PeriodRow> for ExportRow {
    fn from(row: &PeriodRow) -> Self {
        Self {
            period: row.period.clone(),
            sales_supply: row.sales.supply_amount,
            sales_vat: row.sales.vat_amount,
            sales_total: row.sales.total_amount,
            purchase_supply: row.purchase.supply_amount,
            purchase_vat: row.purchase.vat_amount,
            purchase_total: row.purchase.total_amount,
            net: row.net,
        }
    }
}

/// Rows of a report in export order
pub fn export_rows(report: &PeriodReport, include_grand_total: bool) -> Vec<ExportRow> {
    let mut rows: Vec<ExportRow> = report.rows.iter().map(ExportRow::from).collect();
    if include_grand_total {
        rows.push(ExportRow::from(&report.grand_total));
    }
    rows
}

/// Write the header and one row per period, every field quoted
pub fn write_report_csv<W: Write>(
    report: &PeriodReport,
    include_grand_total: bool,
    writer: W,
) -> ReportResult<()> {
    let mut wrt = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    wrt.write_record(EXPORT_HEADER)?;
    for row in export_rows(report, include_grand_total) {
        wrt.serialize(row)?;
    }
    wrt.flush()?;
    Ok(())
}

/// Export as a string; lines are joined by `\n` without a trailing newline
pub fn report_to_csv_string(report: &PeriodReport, include_grand_total: bool) -> ReportResult<String> {
    let mut buffer = Vec::new();
    write_report_csv(report, include_grand_total, &mut buffer)?;
    let mut text =
        String::from_utf8(buffer).map_err(|e| ReportError::Parse(format!("export encoding: {e}")))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Read an export back into rows. The header must match [`EXPORT_HEADER`].
pub fn parse_report_csv(text: &str) -> ReportResult<Vec<ExportRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?;
    if !headers.iter().eq(EXPORT_HEADER.iter().copied()) {
        return Err(ReportError::Parse(format!(
            "unexpected export header: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut rows = Vec::new();
    for (line, record) in rdr.deserialize::<ExportRow>().enumerate() {
        let row = record.map_err(|e| ReportError::Parse(format!("row {}: {e}", line + 1)))?;
        rows.push(row);
    }
    Ok(rows)
}
