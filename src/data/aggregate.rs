//! Summary metrics and chart series over a filtered record sequence.
//!
//! Every series is built from ordered maps, so repeated calls on the same
//! input produce bit-identical output.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::Record;
use crate::config::{EngineConfig, TieBreak};
use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleMean {
    pub role: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryMean {
    pub country_code: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
    /// Fraction of the filtered records in this category.
    pub share: f64,
}

/// Histogram bucket covering `[lower, upper)`; the last bucket is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Full-precision mean; see [`AggregateResult::mean_salary_rounded`].
    pub mean_salary: f64,
    pub max_salary: f64,
    pub most_common_role: String,
    pub record_count: usize,
    /// Ascending by mean, capped at `max_roles` (highest-paying kept).
    pub role_salary_means: Vec<RoleMean>,
    /// Distinct roles before the cap was applied.
    pub distinct_roles: usize,
    /// Whether `role_salary_means` dropped lower-paying roles.
    pub role_means_truncated: bool,
    pub salary_histogram: Vec<HistogramBucket>,
    pub remote_type_counts: Vec<CategoryCount>,
    pub country_salary_means: Vec<CountryMean>,
}

impl AggregateResult {
    /// Mean salary rounded to whole dollars for display.
    pub fn mean_salary_rounded(&self) -> i64 {
        self.mean_salary.round() as i64
    }
}

/// Aggregator outcome. `NoData` is a normal result for an empty filter and
/// must be shown as such rather than charted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Aggregation {
    NoData,
    Data(AggregateResult),
}

impl Aggregation {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Aggregation::NoData)
    }

    pub fn as_data(&self) -> Option<&AggregateResult> {
        match self {
            Aggregation::Data(result) => Some(result),
            Aggregation::NoData => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Compute every metric and series over an already-filtered sequence.
///
/// Accepts owned records or references, so the output of
/// [`filter`](super::filter::filter) can be passed straight in.
pub fn aggregate<R: Borrow<Record>>(records: &[R], config: &EngineConfig) -> Result<Aggregation> {
    config.validate()?;

    if records.is_empty() {
        log::warn!("aggregate called on an empty selection");
        return Ok(Aggregation::NoData);
    }
    validate_salaries(records)?;

    let salaries: Vec<f64> = records.iter().map(|r| r.borrow().salary_usd).collect();
    let record_count = records.len();
    let sum: f64 = salaries.iter().sum();
    let mean_salary = sum / record_count as f64;
    let max_salary = salaries.iter().copied().fold(f64::MIN, f64::max);

    let (role_salary_means, distinct_roles) = role_means(records, config.max_roles);
    let role_means_truncated = distinct_roles > role_salary_means.len();
    if role_means_truncated {
        log::warn!(
            "role series truncated: showing {} of {distinct_roles} roles",
            role_salary_means.len()
        );
    }

    let result = AggregateResult {
        mean_salary,
        max_salary,
        most_common_role: most_common_role(records, config.tie_break),
        record_count,
        role_salary_means,
        distinct_roles,
        role_means_truncated,
        salary_histogram: histogram(&salaries, config.histogram_bins),
        remote_type_counts: remote_type_counts(records),
        country_salary_means: country_means(records),
    };
    log::debug!(
        "aggregated {record_count} records: mean={:.2} max={:.2}",
        result.mean_salary,
        result.max_salary
    );
    Ok(Aggregation::Data(result))
}

fn validate_salaries<R: Borrow<Record>>(records: &[R]) -> Result<()> {
    for (row, rec) in records.iter().enumerate() {
        let salary = rec.borrow().salary_usd;
        if !salary.is_finite() {
            return Err(EngineError::DataIntegrity {
                row,
                field: "salary_usd",
                reason: format!("non-numeric value {salary}"),
            });
        }
        if salary < 0.0 {
            return Err(EngineError::DataIntegrity {
                row,
                field: "salary_usd",
                reason: format!("negative value {salary}"),
            });
        }
    }
    Ok(())
}

/// Running sum and count per key.
fn grouped_means<'a, R, F>(records: &'a [R], key: F) -> BTreeMap<&'a str, f64>
where
    R: Borrow<Record>,
    F: Fn(&'a Record) -> &'a str,
{
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for rec in records {
        let rec = rec.borrow();
        let entry = groups.entry(key(rec)).or_insert((0.0, 0));
        entry.0 += rec.salary_usd;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

/// Role means ascending, keeping the `cap` highest. Also returns the
/// number of distinct roles before capping.
fn role_means<R: Borrow<Record>>(records: &[R], cap: usize) -> (Vec<RoleMean>, usize) {
    let mut means: Vec<RoleMean> = grouped_means(records, |r| r.role.as_str())
        .into_iter()
        .map(|(role, mean)| RoleMean {
            role: role.to_string(),
            mean,
        })
        .collect();
    // Stable sort: equal means stay in role-name order.
    means.sort_by(|a, b| a.mean.total_cmp(&b.mean));

    let distinct = means.len();
    if distinct > cap {
        means.drain(..distinct - cap);
    }
    (means, distinct)
}

fn country_means<R: Borrow<Record>>(records: &[R]) -> Vec<CountryMean> {
    grouped_means(records, |r| r.residence_country_code.as_str())
        .into_iter()
        .map(|(code, mean)| CountryMean {
            country_code: code.to_string(),
            mean,
        })
        .collect()
}

fn remote_type_counts<R: Borrow<Record>>(records: &[R]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for rec in records {
        *counts.entry(rec.borrow().remote_type.as_str()).or_default() += 1;
    }
    let total = records.len() as f64;
    counts
        .into_iter()
        .map(|(value, count)| CategoryCount {
            value: value.to_string(),
            count,
            share: count as f64 / total,
        })
        .collect()
}

/// Mode of the role column. `records` must be non-empty.
fn most_common_role<R: Borrow<Record>>(records: &[R], tie_break: TieBreak) -> String {
    // role -> (count, first position)
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (pos, rec) in records.iter().enumerate() {
        counts.entry(rec.borrow().role.as_str()).or_insert((0, pos)).0 += 1;
    }

    let best = counts.into_iter().max_by(|(a_role, (a_n, a_pos)), (b_role, (b_n, b_pos))| {
        a_n.cmp(b_n).then_with(|| match tie_break {
            // Earlier position wins, so it must compare as greater.
            TieBreak::FirstEncountered => b_pos.cmp(a_pos),
            TieBreak::Lexicographic => b_role.cmp(a_role),
        })
    });
    best.map(|(role, _)| role.to_string()).unwrap_or_default()
}

/// Equal-width histogram over the observed range.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBucket> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return vec![HistogramBucket {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = ((v - min) / width).floor() as usize;
        // The maximum (and float overshoot near it) lands in the closed last bucket.
        counts[idx.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBucket {
            lower: min + i as f64 * width,
            upper: if i + 1 == bins {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count,
        })
        .collect()
}
