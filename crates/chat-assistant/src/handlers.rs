//! Structured query handlers. Each returns the reply text.

use fundamental_scoring::normalize_metric_name;
use metrics_core::{MetricMap, MetricsError, RawValue};

use crate::ChatAssistant;

fn store_warning(e: MetricsError) -> String {
    tracing::error!("Metric store query failed: {}", e);
    format!("⚠️ Data store error: {}", e)
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

impl ChatAssistant {
    pub async fn list_companies(&self, limit: usize) -> String {
        let companies = match self.source.list_companies().await {
            Ok(c) => c,
            Err(e) => return store_warning(e),
        };
        if companies.is_empty() {
            return "⚠️ No companies found.".to_string();
        }

        let limited = &companies[..companies.len().min(limit)];
        let lines = limited
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");
        format!("📋 Companies (showing first {}):\n{}", limited.len(), lines)
    }

    pub async fn top_companies(&self, year: i32, top_n: usize) -> String {
        let table = match self.engine.compute_scores(&[year]).await {
            Ok(t) => t,
            Err(e) => return store_warning(e),
        };
        if table.is_empty() {
            return format!("⚠️ No scores found for {}.", year);
        }

        let top = table.top(year, top_n);
        if top.is_empty() {
            return format!("⚠️ No top companies found for {}.", year);
        }

        let lines = top
            .iter()
            .filter_map(|r| r.score.map(|s| format!("- {}: {:.4}", r.name, s)))
            .collect::<Vec<_>>()
            .join("\n");
        format!("📊 Top {} Companies ({}):\n{}", top_n, year, lines)
    }

    pub async fn all_scores(&self, year: i32, top_n: usize) -> String {
        let table = match self.engine.compute_scores(&[year]).await {
            Ok(t) => t,
            Err(e) => return store_warning(e),
        };

        let top = table.top(year, top_n);
        if top.is_empty() {
            return format!("⚠️ No scores found for {}.", year);
        }

        let lines = top
            .iter()
            .filter_map(|r| r.score.map(|s| format!("- {}: {:.4}", r.name, s)))
            .collect::<Vec<_>>()
            .join("\n");
        format!("📊 Top {} Company Scores ({}):\n{}", top_n, year, lines)
    }

    pub async fn summary_of(&self, company: &str, year: i32) -> String {
        let rows = match self.source.fetch_company_year(company, year).await {
            Ok(r) => r,
            Err(e) => return store_warning(e),
        };
        if rows.is_empty() {
            return format!("⚠️ No data found for {} in {}.", company, year);
        }

        let mut metrics: MetricMap<RawValue> = MetricMap::new();
        for row in rows {
            metrics.insert(normalize_metric_name(&row.metric), row.value);
        }

        let lines = metrics
            .iter()
            .map(|(k, v)| format!("- {}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n");
        format!("📄 Summary of {} ({}):\n{}", title_case(company), year, lines)
    }

    pub async fn company_metric(&self, company: &str, metric_input: &str, year: i32) -> String {
        let rows = match self.source.fetch_company_year(company, year).await {
            Ok(r) => r,
            Err(e) => return store_warning(e),
        };
        if rows.is_empty() {
            return format!("⚠️ No data found for {} in {}.", company, year);
        }

        let mut by_key: MetricMap<(String, RawValue)> = MetricMap::new();
        for row in rows {
            by_key.insert(normalize_metric_name(&row.metric), (row.metric, row.value));
        }

        let needle = normalize_metric_name(metric_input);
        let found = by_key.get(&needle).or_else(|| {
            by_key
                .iter()
                .find(|(k, _)| k.contains(needle.as_str()) || needle.contains(k))
                .map(|(_, v)| v)
        });

        match found {
            Some((label, value)) => format!("📊 {} — {} in {}: {}", title_case(company), label, year, value),
            None => format!("⚠️ Metric '{}' not found for {} in {}.", metric_input, company, year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_client::{CompletionProvider, LlmResult};
    use metrics_core::testing::InMemorySource;
    use std::sync::Arc;

    struct NoLlm;

    #[async_trait]
    impl CompletionProvider for NoLlm {
        async fn complete(&self, _prompt: &str) -> LlmResult<String> {
            Ok(String::new())
        }

        fn backend_name(&self) -> &'static str {
            "none"
        }
    }

    fn assistant(source: InMemorySource) -> ChatAssistant {
        ChatAssistant::new(Arc::new(source), Arc::new(NoLlm))
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("acme corp"), "Acme Corp");
        assert_eq!(title_case("ACME CORP"), "Acme Corp");
        assert_eq!(title_case("3m india"), "3M India");
        assert_eq!(title_case("o'neil & co"), "O'Neil & Co");
    }

    #[tokio::test]
    async fn test_list_companies_limit() {
        let mut source = InMemorySource::new();
        for i in 0..25 {
            source = source.with_company(&format!("Company {:02}", i));
        }
        let reply = assistant(source).list_companies(20).await;

        assert!(reply.starts_with("📋 Companies (showing first 20):\n- Company 00\n"));
        assert!(reply.ends_with("- Company 19"));
        assert!(!reply.contains("Company 20"));
    }

    #[tokio::test]
    async fn test_list_companies_empty() {
        let reply = assistant(InMemorySource::new()).list_companies(20).await;
        assert_eq!(reply, "⚠️ No companies found.");
    }

    #[tokio::test]
    async fn test_top_companies() {
        let source = InMemorySource::new()
            .with_row("Acme", 2024, "ROE", 10.0)
            .with_row("Beta", 2024, "ROE", 20.0)
            .with_row("Zeta", 2024, "ROE", 15.0);
        let reply = assistant(source).top_companies(2024, 2).await;

        assert_eq!(reply, "📊 Top 2 Companies (2024):\n- Beta: 1.0000\n- Zeta: 0.5000");
    }

    #[tokio::test]
    async fn test_top_companies_no_rows() {
        let reply = assistant(InMemorySource::new()).top_companies(2024, 10).await;
        assert_eq!(reply, "⚠️ No scores found for 2024.");
    }

    #[tokio::test]
    async fn test_top_companies_without_scores() {
        let source = InMemorySource::new().with_row("Acme", 2024, "ROE", "n/a");
        let reply = assistant(source).top_companies(2024, 10).await;
        assert_eq!(reply, "⚠️ No top companies found for 2024.");
    }

    #[tokio::test]
    async fn test_all_scores_skips_unscored() {
        let source = InMemorySource::new()
            .with_row("Acme", 2024, "ROE", 10.0)
            .with_row("Beta", 2024, "ROE", 20.0)
            .with_row("Ghost", 2024, "ROE", "-");
        let reply = assistant(source).all_scores(2024, 20).await;

        assert_eq!(reply, "📊 Top 20 Company Scores (2024):\n- Beta: 1.0000\n- Acme: 0.0000");
        assert!(!reply.contains("Ghost"));
    }

    #[tokio::test]
    async fn test_summary_of() {
        let source = InMemorySource::new()
            .with_row("Acme Corp", 2023, "ROE", 15.2)
            .with_row("Acme Corp", 2023, "Net Profit Margin", 8.1);
        let reply = assistant(source).summary_of("acme corp", 2023).await;

        assert_eq!(reply, "📄 Summary of Acme Corp (2023):\n- roe: 15.2\n- net_profit_margin: 8.1");
    }

    #[tokio::test]
    async fn test_summary_of_missing() {
        let reply = assistant(InMemorySource::new()).summary_of("Globex", 2023).await;
        assert_eq!(reply, "⚠️ No data found for Globex in 2023.");
    }

    #[tokio::test]
    async fn test_company_metric_exact_and_fuzzy() {
        let source = InMemorySource::new()
            .with_row("Acme", 2024, "Return on Equity", 15.2)
            .with_row("Acme", 2024, "Long Term Debt / Equity (X)", 0.3);
        let assistant = assistant(source);

        let exact = assistant.company_metric("Acme", "roe", 2024).await;
        assert_eq!(exact, "📊 Acme — Return on Equity in 2024: 15.2");

        let fuzzy = assistant.company_metric("Acme", "long term debt", 2024).await;
        assert_eq!(fuzzy, "📊 Acme — Long Term Debt / Equity (X) in 2024: 0.3");

        let missing = assistant.company_metric("Acme", "altman z score", 2024).await;
        assert_eq!(missing, "⚠️ Metric 'altman z score' not found for Acme in 2024.");
    }

    #[tokio::test]
    async fn test_store_failure_is_rendered() {
        let reply = assistant(InMemorySource::failing()).all_scores(2024, 20).await;
        assert!(reply.starts_with("⚠️ Data store error:"));
    }
}
