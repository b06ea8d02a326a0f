use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{Dataset, Dimension, Record};

// ---------------------------------------------------------------------------
// Role filter: wildcard or explicit set
// ---------------------------------------------------------------------------

/// Role constraint. `All` is a wildcard: it also admits roles that were not
/// known when the selection was built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleFilter {
    #[default]
    All,
    Specific(BTreeSet<String>),
}

impl RoleFilter {
    pub fn admits(&self, role: &str) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Specific(roles) => roles.contains(role),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter selection
// ---------------------------------------------------------------------------

/// The user's constraints across the four dimensions.
///
/// Every explicit set is a whitelist: an empty set admits nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSelection {
    pub years: BTreeSet<i32>,
    #[serde(default)]
    pub roles: RoleFilter,
    pub seniorities: BTreeSet<String>,
    pub company_sizes: BTreeSet<String>,
}

impl FilterSelection {
    /// Selection with every observed value chosen and roles as the wildcard.
    pub fn all_of(dataset: &Dataset) -> Self {
        Self {
            years: dataset.years().clone(),
            roles: RoleFilter::All,
            seniorities: dataset.seniorities().clone(),
            company_sizes: dataset.company_sizes().clone(),
        }
    }

    /// Whether a single record passes every dimension.
    pub fn matches(&self, record: &Record) -> bool {
        self.years.contains(&record.year)
            && self.roles.admits(&record.role)
            && self.seniorities.contains(&record.seniority)
            && self.company_sizes.contains(&record.company_size)
    }

    /// True when some dimension can admit nothing, so every query is empty.
    pub fn is_vacuous(&self) -> bool {
        self.years.is_empty()
            || self.seniorities.is_empty()
            || self.company_sizes.is_empty()
            || matches!(&self.roles, RoleFilter::Specific(r) if r.is_empty())
    }

    /// Number of chosen values in a dimension, `None` for the role wildcard.
    pub fn selected_count(&self, dimension: Dimension) -> Option<usize> {
        match dimension {
            Dimension::Year => Some(self.years.len()),
            Dimension::Role => match &self.roles {
                RoleFilter::All => None,
                RoleFilter::Specific(r) => Some(r.len()),
            },
            Dimension::Seniority => Some(self.seniorities.len()),
            Dimension::CompanySize => Some(self.company_sizes.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Records passing `selection`, in their original order.
pub fn filter<'a>(records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
    if selection.is_vacuous() {
        return Vec::new();
    }
    records.iter().filter(|r| selection.matches(r)).collect()
}

/// Indices into `dataset.records()` of the records passing `selection`.
pub fn filtered_indices(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    if selection.is_vacuous() {
        return Vec::new();
    }
    dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn sample() -> Vec<Record> {
        vec![
            record(2023, "Data Scientist", "Senior", "L", "Remote", "USA", 150_000.0),
            record(2023, "Data Scientist", "Junior", "S", "On-site", "BRA", 50_000.0),
            record(2024, "Data Engineer", "Senior", "M", "Hybrid", "DEU", 90_000.0),
            record(2024, "Analyst", "Mid", "L", "Remote", "USA", 70_000.0),
        ]
    }

    fn set<T: Ord + Clone>(items: &[T]) -> BTreeSet<T> {
        items.iter().cloned().collect()
    }

    fn strings(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn everything_selected_is_identity() {
        let records = sample();
        let ds = Dataset::from_records(records.clone());
        let sel = FilterSelection::all_of(&ds);

        let out: Vec<Record> = filter(&records, &sel).into_iter().cloned().collect();
        assert_eq!(out, records);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 2, 3]);
    }

    #[test]
    fn explicit_all_roles_equals_wildcard() {
        let records = sample();
        let ds = Dataset::from_records(records.clone());
        let wildcard = FilterSelection::all_of(&ds);
        let explicit = FilterSelection {
            roles: RoleFilter::Specific(ds.roles().clone()),
            ..wildcard.clone()
        };
        assert_eq!(filter(&records, &wildcard), filter(&records, &explicit));
    }

    #[test]
    fn wildcard_admits_roles_unknown_at_build_time() {
        let records = sample();
        let ds = Dataset::from_records(records.clone());
        let sel = FilterSelection::all_of(&ds);

        let newcomer = record(2024, "ML Ops", "Senior", "M", "Remote", "USA", 1.0);
        assert!(sel.matches(&newcomer));
    }

    #[test]
    fn dimensions_are_conjunctive() {
        let records = sample();
        let sel = FilterSelection {
            years: set(&[2023, 2024]),
            roles: RoleFilter::All,
            seniorities: strings(&["Senior"]),
            company_sizes: strings(&["L"]),
        };
        let out = filter(&records, &sel);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].salary_usd, 150_000.0);
    }

    #[test]
    fn empty_dimension_yields_nothing() {
        let records = sample();
        let ds = Dataset::from_records(records.clone());
        let full = FilterSelection::all_of(&ds);

        let no_years = FilterSelection {
            years: BTreeSet::new(),
            ..full.clone()
        };
        let no_seniority = FilterSelection {
            seniorities: BTreeSet::new(),
            ..full.clone()
        };
        let no_sizes = FilterSelection {
            company_sizes: BTreeSet::new(),
            ..full.clone()
        };
        let no_roles = FilterSelection {
            roles: RoleFilter::Specific(BTreeSet::new()),
            ..full
        };

        for sel in [no_years, no_seniority, no_sizes, no_roles] {
            assert!(sel.is_vacuous());
            assert!(filter(&records, &sel).is_empty());
            assert!(filtered_indices(&ds, &sel).is_empty());
        }
    }

    #[test]
    fn unknown_values_only_narrow() {
        let records = sample();
        let ds = Dataset::from_records(records.clone());
        let sel = FilterSelection {
            years: set(&[1999]),
            ..FilterSelection::all_of(&ds)
        };
        assert!(!sel.is_vacuous());
        assert!(filter(&records, &sel).is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let records = sample();
        let ds = Dataset::from_records(records.clone());
        let sel = FilterSelection {
            roles: RoleFilter::Specific(strings(&["Analyst", "Data Scientist"])),
            ..FilterSelection::all_of(&ds)
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 3]);
    }

    #[test]
    fn role_filter_serde_shape() {
        let json = serde_json::to_string(&RoleFilter::All).unwrap();
        assert_eq!(json, r#""all""#);

        let parsed: RoleFilter = serde_json::from_str(r#"{"specific":["Analyst"]}"#).unwrap();
        assert_eq!(parsed, RoleFilter::Specific(strings(&["Analyst"])));
    }

    #[test]
    fn selected_count_reports_wildcard() {
        let ds = Dataset::from_records(sample());
        let sel = FilterSelection::all_of(&ds);
        assert_eq!(sel.selected_count(Dimension::Role), None);
        assert_eq!(sel.selected_count(Dimension::Year), Some(2));
    }
}
