//! data-loader: import company metric CSV files into the metrics database.
//!
//! Each file needs a `company,year,metric,value` header. Rows are upserted,
//! so re-running a file replaces earlier values for the same
//! company/metric/year.
//!
//! Usage:
//!   cargo run -p data-loader -- --file metrics_2023.csv --file metrics_2024.csv
//!   cargo run -p data-loader -- --db sqlite:metrics.db --file metrics.csv
//!   cargo run -p data-loader -- --file metrics.csv --dry-run

use anyhow::Context;
use metrics_db::{parse_metric_csv, ImportResult, MetricCsvRow, MetricStore, MetricsDb};
use std::collections::BTreeSet;

const DEFAULT_DB: &str = "sqlite:metrics.db";

#[derive(Debug, PartialEq)]
struct LoaderArgs {
    db_url: String,
    files: Vec<String>,
    dry_run: bool,
}

fn parse_args(args: &[String], env_db: Option<String>) -> LoaderArgs {
    let dry_run = args.iter().any(|a| a == "--dry-run");

    let db_url = args
        .iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .or(env_db)
        .unwrap_or_else(|| DEFAULT_DB.to_string());

    let files = args
        .iter()
        .enumerate()
        .filter(|(_, a)| *a == "--file")
        .filter_map(|(i, _)| args.get(i + 1))
        .filter(|f| !f.starts_with("--"))
        .cloned()
        .collect();

    LoaderArgs { db_url, files, dry_run }
}

/// Distinct companies and years in a batch.
fn describe(rows: &[MetricCsvRow]) -> (usize, BTreeSet<i32>) {
    let companies: BTreeSet<&str> = rows.iter().map(|r| r.company.as_str()).collect();
    let years: BTreeSet<i32> = rows.iter().map(|r| r.fiscal_year).collect();
    (companies.len(), years)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "data_loader=info,metrics_db=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args, std::env::var("DATABASE_URL").ok());

    if args.files.is_empty() {
        eprintln!("Usage:");
        eprintln!("  data-loader --file metrics.csv [--file more.csv ...]");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --dry-run          Parse and report without writing to the DB");
        eprintln!("  --db URL           SQLite URL (default: $DATABASE_URL or {})", DEFAULT_DB);
        std::process::exit(1);
    }

    tracing::info!(
        "data-loader: {} file(s), db={}, dry_run={}",
        args.files.len(),
        args.db_url,
        args.dry_run
    );

    let store = if args.dry_run {
        None
    } else {
        let db = MetricsDb::new(&args.db_url)
            .await
            .with_context(|| format!("failed to open {}", args.db_url))?;
        Some(MetricStore::new(db))
    };

    let mut total = ImportResult::default();
    for path in &args.files {
        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path))?;
        let rows = parse_metric_csv(&data).with_context(|| format!("failed to parse {}", path))?;
        let (companies, years) = describe(&rows);
        tracing::info!(
            "{}: {} rows, {} companies, years {:?}",
            path,
            rows.len(),
            companies,
            years
        );

        let Some(store) = &store else {
            continue;
        };

        let result = store.import_rows(&rows).await;
        tracing::info!("{}: imported {}, skipped {}", path, result.imported, result.skipped);
        for error in &result.errors {
            tracing::warn!("  {}", error);
        }

        total.imported += result.imported;
        total.skipped += result.skipped;
        total.errors.extend(result.errors);
    }

    if !args.dry_run {
        tracing::info!(
            "Done: {} values imported, {} skipped",
            total.imported,
            total.skipped
        );
    }

    Ok(())
}
