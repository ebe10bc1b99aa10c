use async_trait::async_trait;
use metrics_core::{
    CompanyMetricRow, MetricHistoryPoint, MetricRow, MetricSource, MetricsError, MetricsResult, RawValue,
};

use crate::db::MetricsDb;

fn db_err(e: sqlx::Error) -> MetricsError {
    MetricsError::Database(e.to_string())
}

/// Read and write access to company metric values.
pub struct MetricStore {
    db: MetricsDb,
}

impl MetricStore {
    pub fn new(db: MetricsDb) -> Self {
        Self { db }
    }

    /// Insert a company if missing and return its id
    pub async fn upsert_company(&self, name: &str) -> MetricsResult<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO companies (name) VALUES (?)
            ON CONFLICT(name) DO UPDATE SET name = excluded.name
            RETURNING company_id
            "#,
        )
        .bind(name)
        .fetch_one(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    /// Insert a metric label if missing and return its id
    pub async fn upsert_metric(&self, name: &str) -> MetricsResult<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO financial_metrics (name) VALUES (?)
            ON CONFLICT(name) DO UPDATE SET name = excluded.name
            RETURNING metric_id
            "#,
        )
        .bind(name)
        .fetch_one(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    /// Store one value, replacing any previous value for the same
    /// company, metric and year.
    pub async fn insert_value(
        &self,
        company_id: i64,
        metric_id: i64,
        fiscal_year: i32,
        value: &RawValue,
    ) -> MetricsResult<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO metric_values (company_id, metric_id, fiscal_year, value)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(company_id, metric_id, fiscal_year) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(company_id)
        .bind(metric_id)
        .bind(fiscal_year);

        let query = match value {
            RawValue::Null => query.bind(Option::<f64>::None),
            RawValue::Number(v) => query.bind(*v),
            RawValue::Text(s) => query.bind(s.clone()),
        };

        query.execute(self.db.pool()).await.map_err(db_err)?;
        Ok(())
    }

    /// Convenience wrapper resolving names to ids before inserting.
    pub async fn record(&self, company: &str, fiscal_year: i32, metric: &str, value: &RawValue) -> MetricsResult<()> {
        let company_id = self.upsert_company(company).await?;
        let metric_id = self.upsert_metric(metric).await?;
        self.insert_value(company_id, metric_id, fiscal_year, value).await
    }

    /// Latest `limit` fiscal years of one metric for one company, newest
    /// first. Company and metric names must match exactly.
    pub async fn metric_history(
        &self,
        company: &str,
        metric: &str,
        limit: i64,
    ) -> MetricsResult<Vec<MetricHistoryPoint>> {
        let company_id: Option<(i64,)> = sqlx::query_as("SELECT company_id FROM companies WHERE name = ?")
            .bind(company)
            .fetch_optional(self.db.pool())
            .await
            .map_err(db_err)?;
        let Some((company_id,)) = company_id else {
            return Err(MetricsError::NotFound(format!("company '{}'", company)));
        };

        let metric_id: Option<(i64,)> = sqlx::query_as("SELECT metric_id FROM financial_metrics WHERE name = ?")
            .bind(metric)
            .fetch_optional(self.db.pool())
            .await
            .map_err(db_err)?;
        let Some((metric_id,)) = metric_id else {
            return Err(MetricsError::NotFound(format!("metric '{}'", metric)));
        };

        let rows: Vec<(i32, Option<String>)> = sqlx::query_as(
            r#"
            SELECT fiscal_year, CAST(value AS TEXT)
            FROM metric_values
            WHERE company_id = ? AND metric_id = ?
            ORDER BY fiscal_year DESC
            LIMIT ?
            "#,
        )
        .bind(company_id)
        .bind(metric_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(fiscal_year, value)| MetricHistoryPoint {
                fiscal_year,
                value: RawValue::from(value),
            })
            .collect())
    }
}

#[async_trait]
impl MetricSource for MetricStore {
    async fn list_companies(&self) -> MetricsResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM companies ORDER BY name")
            .fetch_all(self.db.pool())
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn fetch_year_rows(&self, year: i32) -> MetricsResult<Vec<MetricRow>> {
        let rows: Vec<(String, i32, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT c.name, v.fiscal_year, m.name, CAST(v.value AS TEXT)
            FROM metric_values v
            JOIN companies c ON v.company_id = c.company_id
            JOIN financial_metrics m ON v.metric_id = m.metric_id
            WHERE v.fiscal_year = ?
            ORDER BY v.id
            "#,
        )
        .bind(year)
        .fetch_all(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(company, fiscal_year, metric, value)| MetricRow {
                company,
                fiscal_year,
                metric,
                value: RawValue::from(value),
            })
            .collect())
    }

    async fn fetch_company_year(&self, company: &str, year: i32) -> MetricsResult<Vec<CompanyMetricRow>> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT m.name, CAST(v.value AS TEXT)
            FROM metric_values v
            JOIN financial_metrics m ON v.metric_id = m.metric_id
            JOIN companies c ON v.company_id = c.company_id
            WHERE LOWER(c.name) LIKE LOWER(?) AND v.fiscal_year = ?
            ORDER BY v.id
            "#,
        )
        .bind(format!("%{}%", company))
        .bind(year)
        .fetch_all(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(metric, value)| CompanyMetricRow {
                metric,
                value: RawValue::from(value),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    async fn setup_test_store() -> MetricStore {
        MetricStore::new(MetricsDb::new("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_list_companies_alphabetical() {
        let store = setup_test_store().await;
        for name in ["Zeta", "Acme", "Beta"] {
            store.upsert_company(name).await.unwrap();
        }

        let names = store.list_companies().await.unwrap();
        assert_eq!(names, vec!["Acme", "Beta", "Zeta"]);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = setup_test_store().await;
        let a = store.upsert_company("Acme").await.unwrap();
        let b = store.upsert_company("Acme").await.unwrap();
        assert_eq!(a, b);

        let m1 = store.upsert_metric("ROE").await.unwrap();
        let m2 = store.upsert_metric("ROE").await.unwrap();
        assert_eq!(m1, m2);
    }

    #[tokio::test]
    async fn test_year_rows_keep_loose_types() {
        let store = setup_test_store().await;
        assert_ok!(store.record("Acme", 2023, "ROE", &RawValue::Number(15.2)).await);
        assert_ok!(store.record("Acme", 2023, "Remarks", &RawValue::from("n/a")).await);
        assert_ok!(store.record("Beta", 2023, "ROE", &RawValue::Null).await);
        assert_ok!(store.record("Beta", 2022, "ROE", &RawValue::Number(3.0)).await);

        let rows = store.fetch_year_rows(2023).await.unwrap();
        assert_eq!(
            rows,
            vec![
                MetricRow::new("Acme", 2023, "ROE", RawValue::from("15.2")),
                MetricRow::new("Acme", 2023, "Remarks", RawValue::from("n/a")),
                MetricRow::new("Beta", 2023, "ROE", RawValue::Null),
            ]
        );
        assert_eq!(rows[0].value.as_f64(), Some(15.2));
        assert_eq!(rows[1].value.as_f64(), None);
    }

    #[tokio::test]
    async fn test_company_year_fuzzy_match() {
        let store = setup_test_store().await;
        store.record("Acme Corp", 2023, "ROE", &RawValue::Number(15.2)).await.unwrap();
        store.record("Acme Corp", 2023, "Net Profit Margin", &RawValue::Number(8.1)).await.unwrap();
        store.record("Acme Corp", 2024, "ROE", &RawValue::Number(16.0)).await.unwrap();

        let rows = store.fetch_company_year("acme", 2023).await.unwrap();
        assert_eq!(
            rows,
            vec![
                CompanyMetricRow::new("ROE", RawValue::from("15.2")),
                CompanyMetricRow::new("Net Profit Margin", RawValue::from("8.1")),
            ]
        );

        assert!(store.fetch_company_year("Globex", 2023).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reinserting_value_replaces_it() {
        let store = setup_test_store().await;
        store.record("Acme", 2023, "ROE", &RawValue::Number(1.0)).await.unwrap();
        store.record("Acme", 2023, "ROE", &RawValue::Number(2.5)).await.unwrap();

        let rows = store.fetch_year_rows(2023).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value.as_f64(), Some(2.5));
    }

    #[tokio::test]
    async fn test_metric_history() {
        let store = setup_test_store().await;
        for (year, value) in [(2019, 1.0), (2020, 2.0), (2021, 3.0), (2022, 4.0), (2023, 5.0), (2024, 6.0)] {
            store.record("Acme", year, "ROE", &RawValue::Number(value)).await.unwrap();
        }

        let history = store.metric_history("Acme", "ROE", 5).await.unwrap();
        let years: Vec<i32> = history.iter().map(|p| p.fiscal_year).collect();
        assert_eq!(years, vec![2024, 2023, 2022, 2021, 2020]);
        assert_eq!(history[0].value.as_f64(), Some(6.0));

        assert_err!(store.metric_history("Globex", "ROE", 5).await);
        assert!(matches!(
            store.metric_history("Acme", "ROA", 5).await,
            Err(MetricsError::NotFound(_))
        ));
    }
}
