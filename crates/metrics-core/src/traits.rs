use async_trait::async_trait;
use crate::{CompanyMetricRow, MetricRow, MetricsResult};

/// Read-only access to stored company metrics.
///
/// Every call is an independent short-lived read; implementations must not
/// rely on state carried between calls.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// All distinct company names, alphabetical.
    async fn list_companies(&self) -> MetricsResult<Vec<String>>;

    /// Every (company, year, metric, value) observation for `year`.
    async fn fetch_year_rows(&self, year: i32) -> MetricsResult<Vec<MetricRow>>;

    /// Metric observations for companies whose name contains `company`
    /// (case-insensitive) in `year`.
    async fn fetch_company_year(&self, company: &str, year: i32) -> MetricsResult<Vec<CompanyMetricRow>>;
}
