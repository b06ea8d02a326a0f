//! Output surface for the presentation layer: a JSON report and a plain-text
//! summary.

use std::fmt;

use serde::Serialize;

use crate::data::aggregate::{AggregateResult, Aggregation};
use crate::data::filter::FilterSelection;
use crate::data::model::Record;

pub const NO_DATA_MESSAGE: &str =
    "No records match this combination of filters. Try selecting more roles or years.";

/// Everything one query produces: the selection echoed back, the aggregate
/// and, optionally, the unaggregated rows for a detail table.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport<'a> {
    pub selection: &'a FilterSelection,
    pub summary: &'a Aggregation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<&'a [&'a Record]>,
}

impl<'a> QueryReport<'a> {
    pub fn new(selection: &'a FilterSelection, summary: &'a Aggregation) -> Self {
        Self {
            selection,
            summary,
            rows: None,
        }
    }

    pub fn with_rows(mut self, rows: &'a [&'a Record]) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Whole-dollar amount with thousands separators, e.g. `USD 100,000`.
pub fn format_usd(amount: f64) -> String {
    format_whole_usd(amount.round() as i64)
}

pub fn format_whole_usd(dollars: i64) -> String {
    format!("USD {}", group_thousands(dollars))
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Human-readable rendering of an aggregation.
pub fn render_text(summary: &Aggregation) -> String {
    TextSummary(summary).to_string()
}

/// Plain-text dashboard: headline metrics followed by each chart series.
pub struct TextSummary<'a>(pub &'a Aggregation);

impl fmt::Display for TextSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = match self.0 {
            Aggregation::NoData => return f.write_str(NO_DATA_MESSAGE),
            Aggregation::Data(result) => result,
        };
        write_metrics(f, r)?;
        write_series(f, r)
    }
}

fn write_metrics(f: &mut fmt::Formatter<'_>, r: &AggregateResult) -> fmt::Result {
    writeln!(f, "Mean salary:       {}", format_whole_usd(r.mean_salary_rounded()))?;
    writeln!(f, "Max salary:        {}", format_usd(r.max_salary))?;
    writeln!(f, "Most common role:  {}", r.most_common_role)?;
    writeln!(f, "Records:           {}", group_thousands(r.record_count as i64))
}

fn write_series(f: &mut fmt::Formatter<'_>, r: &AggregateResult) -> fmt::Result {
    writeln!(f)?;
    if r.role_means_truncated {
        writeln!(
            f,
            "Mean salary by role (top {} of {}):",
            r.role_salary_means.len(),
            r.distinct_roles
        )?;
    } else {
        writeln!(f, "Mean salary by role:")?;
    }
    for rm in &r.role_salary_means {
        writeln!(f, "  {:<40} {}", rm.role, format_usd(rm.mean))?;
    }

    writeln!(f)?;
    writeln!(f, "Salary distribution:")?;
    for b in &r.salary_histogram {
        writeln!(
            f,
            "  {:>14} - {:<14} {}",
            format_usd(b.lower),
            format_usd(b.upper),
            b.count
        )?;
    }

    writeln!(f)?;
    writeln!(f, "Work model:")?;
    for c in &r.remote_type_counts {
        writeln!(f, "  {:<20} {:>6} ({:.1}%)", c.value, c.count, c.share * 100.0)?;
    }

    writeln!(f)?;
    writeln!(f, "Mean salary by country of residence:")?;
    for c in &r.country_salary_means {
        writeln!(f, "  {:<6} {}", c.country_code, format_usd(c.mean))?;
    }
    Ok(())
}
