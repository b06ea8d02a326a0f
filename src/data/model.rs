use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single untyped cell outside the typed columns
// ---------------------------------------------------------------------------

/// A dynamically-typed cell kept for columns the engine does not interpret
/// (contract type, local currency, employer country, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Guess the type of a raw text cell (CSV has no type information).
    pub fn from_text(s: &str) -> Self {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Column – the typed columns every record carries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Year,
    Role,
    Seniority,
    CompanySize,
    RemoteType,
    ResidenceCountryCode,
    SalaryUsd,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Year,
        Column::Role,
        Column::Seniority,
        Column::CompanySize,
        Column::RemoteType,
        Column::ResidenceCountryCode,
        Column::SalaryUsd,
    ];

    /// Canonical snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            Column::Year => "year",
            Column::Role => "role",
            Column::Seniority => "seniority",
            Column::CompanySize => "company_size",
            Column::RemoteType => "remote_type",
            Column::ResidenceCountryCode => "residence_country_code",
            Column::SalaryUsd => "salary_usd",
        }
    }

    /// Header names accepted for this column, canonical name first.
    /// Matching is exact: the survey exports use lowercase headers.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Year => &["year", "ano", "work_year"],
            Column::Role => &["role", "cargo", "job_title"],
            Column::Seniority => &["seniority", "senioridade", "experience_level"],
            Column::CompanySize => &["company_size", "tamanho_empresa"],
            Column::RemoteType => &["remote_type", "remoto"],
            Column::ResidenceCountryCode => &["residence_country_code", "residencia_iso3"],
            Column::SalaryUsd => &["salary_usd", "usd", "salary_in_usd"],
        }
    }

    /// Resolve a source header to a typed column, if it is one.
    pub fn from_header(header: &str) -> Option<Column> {
        Column::ALL
            .into_iter()
            .find(|col| col.aliases().contains(&header))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Dimension – the independently filterable columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Year,
    Role,
    Seniority,
    CompanySize,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Year,
        Dimension::Role,
        Dimension::Seniority,
        Dimension::CompanySize,
    ];

    pub fn column(self) -> Column {
        match self {
            Dimension::Year => Column::Year,
            Dimension::Role => Column::Role,
            Dimension::Seniority => Column::Seniority,
            Dimension::CompanySize => Column::CompanySize,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column().name())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the survey table
// ---------------------------------------------------------------------------

/// One salary survey response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub year: i32,
    /// Job title.
    pub role: String,
    pub seniority: String,
    pub company_size: String,
    /// Remote / hybrid / on-site.
    pub remote_type: String,
    /// ISO3 country code of the respondent's residence.
    pub residence_country_code: String,
    pub salary_usd: f64,
    /// Source columns outside the typed set, kept for the detail view.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, CellValue>,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The loaded table with the sorted distinct values of each dimension.
/// Immutable once built: the engine only ever borrows it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    years: BTreeSet<i32>,
    roles: BTreeSet<String>,
    seniorities: BTreeSet<String>,
    company_sizes: BTreeSet<String>,
}

impl Dataset {
    /// Build dimension indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut years = BTreeSet::new();
        let mut roles = BTreeSet::new();
        let mut seniorities = BTreeSet::new();
        let mut company_sizes = BTreeSet::new();

        for rec in &records {
            years.insert(rec.year);
            roles.insert(rec.role.clone());
            seniorities.insert(rec.seniority.clone());
            company_sizes.insert(rec.company_size.clone());
        }

        Dataset {
            records,
            years,
            roles,
            seniorities,
            company_sizes,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn seniorities(&self) -> &BTreeSet<String> {
        &self.seniorities
    }

    pub fn company_sizes(&self) -> &BTreeSet<String> {
        &self.company_sizes
    }

    /// Distinct values of a dimension as text, in sorted order.
    pub fn distinct_values(&self, dimension: Dimension) -> Vec<String> {
        match dimension {
            Dimension::Year => self.years.iter().map(|y| y.to_string()).collect(),
            Dimension::Role => self.roles.iter().cloned().collect(),
            Dimension::Seniority => self.seniorities.iter().cloned().collect(),
            Dimension::CompanySize => self.company_sizes.iter().cloned().collect(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
