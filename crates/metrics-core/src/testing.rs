//! In-memory `MetricSource` for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{CompanyMetricRow, MetricRow, MetricSource, MetricsError, MetricsResult, RawValue};

#[derive(Default)]
pub struct InMemorySource {
    rows: Vec<MetricRow>,
    companies: Vec<String>,
    fail: bool,
    queries: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation; the company is registered on first sight.
    pub fn with_row(mut self, company: &str, year: i32, metric: &str, value: impl Into<RawValue>) -> Self {
        self.add_company(company);
        self.rows.push(MetricRow::new(company, year, metric, value));
        self
    }

    /// Register a company that has no metric rows.
    pub fn with_company(mut self, company: &str) -> Self {
        self.add_company(company);
        self
    }

    /// Make every query fail with a database error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    fn add_company(&mut self, company: &str) {
        if !self.companies.iter().any(|c| c == company) {
            self.companies.push(company.to_string());
        }
    }

    fn begin(&self) -> MetricsResult<()> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(MetricsError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetricSource for InMemorySource {
    async fn list_companies(&self) -> MetricsResult<Vec<String>> {
        self.begin()?;
        let mut names = self.companies.clone();
        names.sort();
        Ok(names)
    }

    async fn fetch_year_rows(&self, year: i32) -> MetricsResult<Vec<MetricRow>> {
        self.begin()?;
        Ok(self.rows.iter().filter(|r| r.fiscal_year == year).cloned().collect())
    }

    async fn fetch_company_year(&self, company: &str, year: i32) -> MetricsResult<Vec<CompanyMetricRow>> {
        self.begin()?;
        let needle = company.to_lowercase();
        Ok(self
            .rows
            .iter()
            .filter(|r| r.fiscal_year == year && r.company.to_lowercase().contains(&needle))
            .map(|r| CompanyMetricRow::new(r.metric.clone(), r.value.clone()))
            .collect())
    }
}
