use serde::{Deserialize, Serialize};
use std::fmt;

/// Loosely-typed scalar as it comes back from the metric store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric coercion used by the scorer. Text is trimmed and parsed as a
    /// float; `Null` and unparseable text yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Null => None,
            RawValue::Number(v) => Some(*v),
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<Option<String>> for RawValue {
    fn from(s: Option<String>) -> Self {
        match s {
            Some(s) => RawValue::Text(s),
            None => RawValue::Null,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "None"),
            // Whole numbers keep a trailing ".0" so 15.0 does not render as "15"
            RawValue::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            RawValue::Number(v) => write!(f, "{}", v),
            RawValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One observation for a fiscal year: (company, year, metric label, value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub company: String,
    pub fiscal_year: i32,
    pub metric: String,
    pub value: RawValue,
}

impl MetricRow {
    pub fn new(
        company: impl Into<String>,
        fiscal_year: i32,
        metric: impl Into<String>,
        value: impl Into<RawValue>,
    ) -> Self {
        Self {
            company: company.into(),
            fiscal_year,
            metric: metric.into(),
            value: value.into(),
        }
    }
}

/// One observation for an already-selected company and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetricRow {
    pub metric: String,
    pub value: RawValue,
}

impl CompanyMetricRow {
    pub fn new(metric: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            metric: metric.into(),
            value: value.into(),
        }
    }
}

/// A single point of a company/metric time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricHistoryPoint {
    pub fiscal_year: i32,
    pub value: RawValue,
}

/// Insertion-ordered map from canonical metric key to value.
///
/// Re-inserting an existing key replaces the value but keeps the key's
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricMap<V = f64> {
    entries: Vec<(String, V)>,
}

impl<V> MetricMap<V> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert or overwrite. Returns the previous value when the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All numeric observations for one (company, fiscal year) pair, keyed by
/// canonical metric key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyYearRecord {
    pub name: String,
    pub year: i32,
    pub metrics: MetricMap,
}

impl CompanyYearRecord {
    pub fn new(name: impl Into<String>, year: i32) -> Self {
        Self {
            name: name.into(),
            year,
            metrics: MetricMap::new(),
        }
    }
}

/// Raw and normalized value of one metric column for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub key: String,
    pub raw: Option<f64>,
    pub normalized: Option<f64>,
}

/// One (company, year) row of a score table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub name: String,
    pub year: i32,
    /// One entry per metric column observed in this row's year.
    pub metrics: Vec<MetricScore>,
    /// Mean of the available normalized columns, rounded to 4 decimals.
    pub score: Option<f64>,
    /// Min-style rank within the year; `0` means unranked (no score).
    pub rank: u32,
}

impl ScoreRow {
    pub fn metric(&self, key: &str) -> Option<&MetricScore> {
        self.metrics.iter().find(|m| m.key == key)
    }

    pub fn normalized(&self, key: &str) -> Option<f64> {
        self.metric(key).and_then(|m| m.normalized)
    }
}

/// Ephemeral scoring output, sorted by year ascending then score descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub rows: Vec<ScoreRow>,
}

impl ScoreTable {
    pub fn new(rows: Vec<ScoreRow>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &ScoreRow> {
        self.rows.iter().filter(move |r| r.year == year)
    }

    pub fn find(&self, name: &str, year: i32) -> Option<&ScoreRow> {
        self.for_year(year).find(|r| r.name == name)
    }

    /// Scored rows of `year`, best first, truncated to `n`. Unscored rows
    /// are dropped.
    pub fn top(&self, year: i32, n: usize) -> Vec<&ScoreRow> {
        let mut scored: Vec<&ScoreRow> = self.for_year(year).filter(|r| r.score.is_some()).collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(n);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_coercion() {
        assert_eq!(RawValue::Number(1.5).as_f64(), Some(1.5));
        assert_eq!(RawValue::from(" 12.25 ").as_f64(), Some(12.25));
        assert_eq!(RawValue::from("-3e2").as_f64(), Some(-300.0));
        assert_eq!(RawValue::from("n/a").as_f64(), None);
        assert_eq!(RawValue::from("").as_f64(), None);
        assert_eq!(RawValue::Null.as_f64(), None);
    }

    #[test]
    fn test_raw_value_display() {
        assert_eq!(RawValue::Number(15.2).to_string(), "15.2");
        assert_eq!(RawValue::Number(15.0).to_string(), "15.0");
        assert_eq!(RawValue::from("8.10").to_string(), "8.10");
        assert_eq!(RawValue::Null.to_string(), "None");
    }

    #[test]
    fn test_raw_value_json() {
        let values: Vec<RawValue> = serde_json::from_str(r#"[12.5, "restated", null]"#).unwrap();
        assert_eq!(
            values,
            vec![RawValue::Number(12.5), RawValue::from("restated"), RawValue::Null]
        );
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[12.5,"restated",null]"#);
    }

    #[test]
    fn test_metric_map_overwrite_keeps_position() {
        let mut map = MetricMap::new();
        assert_eq!(map.insert("roe", 1.0), None);
        map.insert("roa", 2.0);
        assert_eq!(map.insert("roe", 3.0), Some(1.0));

        let entries: Vec<(&str, f64)> = map.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(entries, vec![("roe", 3.0), ("roa", 2.0)]);
        assert_eq!(map.len(), 2);
    }

    fn row(name: &str, year: i32, score: Option<f64>) -> ScoreRow {
        ScoreRow {
            name: name.to_string(),
            year,
            metrics: vec![],
            score,
            rank: 0,
        }
    }

    #[test]
    fn test_top_drops_unscored_rows() {
        let table = ScoreTable::new(vec![
            row("A", 2024, Some(0.4)),
            row("B", 2024, None),
            row("C", 2024, Some(0.9)),
            row("D", 2023, Some(1.0)),
        ]);

        let top: Vec<&str> = table.top(2024, 10).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(top, vec!["C", "A"]);
        assert_eq!(table.top(2024, 1).len(), 1);
        assert!(table.top(2022, 5).is_empty());
    }
}
