pub mod db;
pub mod import;
pub mod store;

pub use db::MetricsDb;
pub use import::{parse_metric_csv, ImportResult, MetricCsvRow};
pub use store::MetricStore;
