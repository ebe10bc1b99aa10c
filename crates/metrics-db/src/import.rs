//! CSV import of company metric values.
//!
//! Expected columns: company, year, metric, value. Values that parse as
//! numbers are stored as numbers; anything else is stored verbatim and left
//! for the scorer to drop.

use anyhow::Result;
use metrics_core::RawValue;
use serde::Serialize;

use crate::store::MetricStore;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCsvRow {
    pub company: String,
    pub fiscal_year: i32,
    pub metric: String,
    pub value: RawValue,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Parse CSV metric data. Rows without a company, metric or valid year are
/// skipped.
pub fn parse_metric_csv(csv_data: &str) -> Result<Vec<MetricCsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let company = record.get(0).unwrap_or("").trim().to_string();
        let fiscal_year: Option<i32> = record.get(1).and_then(|s| s.trim().parse().ok());
        let metric = record.get(2).unwrap_or("").trim().to_string();
        let raw = record.get(3).unwrap_or("").trim();

        let Some(fiscal_year) = fiscal_year else {
            continue;
        };
        if company.is_empty() || metric.is_empty() {
            continue;
        }

        let value = if raw.is_empty() {
            RawValue::Null
        } else {
            match raw.parse::<f64>() {
                Ok(v) => RawValue::Number(v),
                Err(_) => RawValue::Text(raw.to_string()),
            }
        };

        rows.push(MetricCsvRow {
            company,
            fiscal_year,
            metric,
            value,
        });
    }

    Ok(rows)
}

impl MetricStore {
    /// Write parsed rows, continuing past individual failures.
    pub async fn import_rows(&self, rows: &[MetricCsvRow]) -> ImportResult {
        let mut result = ImportResult::default();

        for row in rows {
            match self.record(&row.company, row.fiscal_year, &row.metric, &row.value).await {
                Ok(()) => result.imported += 1,
                Err(e) => {
                    tracing::warn!("Import failed for {} {} {}: {}", row.company, row.fiscal_year, row.metric, e);
                    result.errors.push(format!("{} {} {}: {}", row.company, row.fiscal_year, row.metric, e));
                    result.skipped += 1;
                }
            }
        }

        result
    }
}
