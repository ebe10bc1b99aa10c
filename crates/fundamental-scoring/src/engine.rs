//! Composite min-max scoring across companies of a fiscal year.
//!
//! Raw rows are grouped into one record per (company, year). Within each
//! year every metric column is min-max scaled on its own, flipped for
//! lower-is-better metrics, and the per-metric scores are averaged into a
//! single composite that is then ranked.

use metrics_core::{
    CompanyYearRecord, MetricRow, MetricScore, MetricSource, MetricsResult, ScoreRow, ScoreTable,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::directionality::{is_classified, Direction};
use crate::normalizer::normalize_metric_name;

pub struct CompositeScoringEngine {
    source: Arc<dyn MetricSource>,
}

impl CompositeScoringEngine {
    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self { source }
    }

    /// Fetch every requested year and build a fresh score table.
    ///
    /// Years with no stored rows are skipped. Nothing is cached; each call
    /// re-reads the store.
    pub async fn compute_scores(&self, years: &[i32]) -> MetricsResult<ScoreTable> {
        let years: BTreeSet<i32> = years.iter().copied().collect();

        let mut records = Vec::new();
        for year in years {
            let rows = self.source.fetch_year_rows(year).await?;
            if rows.is_empty() {
                tracing::debug!("No metric rows for {}, skipping", year);
                continue;
            }
            let mut year_records = assemble_records(&rows);
            tracing::debug!(
                "Assembled {} company records from {} rows for {}",
                year_records.len(),
                rows.len(),
                year
            );
            records.append(&mut year_records);
        }

        Ok(score_records(records))
    }
}

/// Group raw rows into one record per (company, fiscal year), in first-seen
/// order.
///
/// Values that do not coerce to a number are dropped individually. When two
/// labels normalize to the same key the later value wins.
pub fn assemble_records(rows: &[MetricRow]) -> Vec<CompanyYearRecord> {
    let mut index: HashMap<(&str, i32), usize> = HashMap::new();
    let mut records: Vec<CompanyYearRecord> = Vec::new();

    for row in rows {
        let slot = *index
            .entry((row.company.as_str(), row.fiscal_year))
            .or_insert_with(|| {
                records.push(CompanyYearRecord::new(row.company.clone(), row.fiscal_year));
                records.len() - 1
            });

        let Some(value) = row.value.as_f64() else {
            continue;
        };

        let key = normalize_metric_name(&row.metric);
        if let Some(previous) = records[slot].metrics.insert(key.clone(), value) {
            tracing::debug!(
                "{} {}: '{}' collides on '{}', replacing {} with {}",
                row.company,
                row.fiscal_year,
                row.metric,
                key,
                previous,
                value
            );
        }
    }

    records
}

/// Score already-assembled records. Each fiscal year is an independent
/// partition.
///
/// The column set is every key seen anywhere in the batch, in first-seen
/// order. A column with no values in some year is degenerate there and
/// scores `1.0` for that year's rows.
pub fn score_records(records: Vec<CompanyYearRecord>) -> ScoreTable {
    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.metrics.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }

    let mut partitions: BTreeMap<i32, Vec<CompanyYearRecord>> = BTreeMap::new();
    for record in records {
        partitions.entry(record.year).or_default().push(record);
    }

    let mut rows = Vec::new();
    for (year, partition) in partitions {
        rows.extend(score_partition(year, &columns, partition));
    }

    ScoreTable::new(rows)
}

fn score_partition(year: i32, columns: &[String], records: Vec<CompanyYearRecord>) -> Vec<ScoreRow> {
    let mut normalized: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(columns.len()); records.len()];
    for column in columns {
        // NaN counts as missing, same as an absent value.
        let raw: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.metrics.get(column).copied().filter(|v| !v.is_nan()))
            .collect();

        if !is_classified(column) {
            tracing::trace!("Unclassified metric '{}' scored as higher-is-better", column);
        }

        for (i, score) in min_max_scale(&raw, Direction::of(column)).into_iter().enumerate() {
            normalized[i].push(score);
        }
    }

    let mut rows: Vec<ScoreRow> = records
        .into_iter()
        .zip(normalized)
        .map(|(record, scores)| {
            let score = mean(&scores).map(round4);
            let metrics = columns
                .iter()
                .zip(scores)
                .map(|(key, normalized)| MetricScore {
                    key: key.clone(),
                    raw: record.metrics.get(key).copied(),
                    normalized,
                })
                .collect();
            ScoreRow {
                name: record.name,
                year,
                metrics,
                score,
                rank: 0,
            }
        })
        .collect();

    let scores: Vec<Option<f64>> = rows.iter().map(|r| r.score).collect();
    for (row, rank) in rows.iter_mut().zip(min_rank_descending(&scores)) {
        row.rank = rank;
    }

    // Stable: equal scores keep record order, unscored rows go last.
    rows.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    tracing::debug!(
        "Scored {} companies across {} metrics for {}",
        rows.len(),
        columns.len(),
        year
    );

    rows
}

/// Min-max scale one column of a year partition.
///
/// With at most one present value, or when every present value is equal,
/// the whole column (missing entries included) scores `1.0`. Otherwise
/// missing entries stay missing, as does any non-finite result.
pub fn min_max_scale(values: &[Option<f64>], direction: Direction) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();

    let (min, max) = present
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if present.len() <= 1 || min == max {
        return vec![Some(1.0); values.len()];
    }

    let range = max - min;
    values
        .iter()
        .map(|v| {
            v.map(|v| {
                let scaled = (v - min) / range;
                match direction {
                    Direction::Higher => scaled,
                    Direction::Lower => 1.0 - scaled,
                }
            })
            // inf/inf and friends
            .filter(|s| s.is_finite())
        })
        .collect()
}

/// Descending min-style rank: ties share the lowest rank number and the next
/// distinct score skips ahead (`[0.9, 0.9, 0.5]` ranks as `[1, 1, 3]`).
/// Missing scores get `0`.
pub fn min_rank_descending(scores: &[Option<f64>]) -> Vec<u32> {
    scores
        .iter()
        .map(|score| match score {
            Some(s) => {
                let higher = scores.iter().flatten().filter(|other| **other > *s).count();
                higher as u32 + 1
            }
            None => 0,
        })
        .collect()
}

fn mean(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Round to 4 decimal places, half to even.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round_ties_even() / 10_000.0
}
