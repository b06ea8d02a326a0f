use std::collections::BTreeSet;

use crate::config::EngineConfig;
use crate::data::aggregate::{aggregate, Aggregation};
use crate::data::filter::{filtered_indices, FilterSelection, RoleFilter};
use crate::data::model::{Dataset, Dimension, Record};
use crate::error::EngineError;
use crate::report::NO_DATA_MESSAGE;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
///
/// Every mutating method recomputes `visible_indices` and `summary` before
/// returning, so a renderer can read them directly.
#[derive(Debug, Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Dataset>,

    pub config: EngineConfig,

    /// Current filter selection.
    pub selection: FilterSelection,

    /// Indices of records passing the current selection.
    pub visible_indices: Vec<usize>,

    /// Outcome of the last aggregation. Errors are kept for display.
    pub summary: Option<Result<Aggregation, EngineError>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Ingest a newly loaded dataset and select everything.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.selection = FilterSelection::all_of(&dataset);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refresh();
    }

    /// Records passing the current selection, in dataset order.
    pub fn visible_records(&self) -> Vec<&Record> {
        match &self.dataset {
            Some(ds) => self
                .visible_indices
                .iter()
                .map(|&i| &ds.records()[i])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Recompute filter and aggregate from scratch.
    pub fn refresh(&mut self) {
        let Some(ds) = &self.dataset else {
            self.visible_indices.clear();
            self.summary = None;
            return;
        };

        self.visible_indices = filtered_indices(ds, &self.selection);
        let rows = self.visible_records();
        let summary = aggregate(&rows, &self.config).map_err(|e| self.to_dataset_row(e));
        log::debug!(
            "refresh: {} of {} records visible",
            self.visible_indices.len(),
            ds.len()
        );

        self.status_message = match &summary {
            Ok(Aggregation::NoData) => Some(NO_DATA_MESSAGE.to_string()),
            Ok(Aggregation::Data(_)) => None,
            Err(e) => {
                log::error!("aggregation failed: {e}");
                Some(e.to_string())
            }
        };
        self.summary = Some(summary);
    }

    /// Aggregator errors index the filtered rows; point them at the dataset row.
    fn to_dataset_row(&self, err: EngineError) -> EngineError {
        match err {
            EngineError::DataIntegrity { row, field, reason } => EngineError::DataIntegrity {
                row: self.visible_indices.get(row).copied().unwrap_or(row),
                field,
                reason,
            },
            other => other,
        }
    }

    /// Replace the whole selection.
    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
        self.refresh();
    }

    /// Replace the engine config (e.g. a new histogram bin count).
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
        self.refresh();
    }

    /// Toggle a single value in a dimension. Years are given as text.
    ///
    /// Toggling a role while the wildcard is active switches to an explicit
    /// set holding every known role except the toggled one.
    pub fn toggle(&mut self, dimension: Dimension, value: &str) {
        match dimension {
            Dimension::Year => match value.parse::<i32>() {
                Ok(year) => toggle_in(&mut self.selection.years, year),
                Err(_) => {
                    log::warn!("ignoring non-numeric year '{value}'");
                    return;
                }
            },
            Dimension::Role => {
                if self.selection.roles == RoleFilter::All {
                    let known = self
                        .dataset
                        .as_ref()
                        .map(|ds| ds.roles().clone())
                        .unwrap_or_default();
                    self.selection.roles = RoleFilter::Specific(known);
                }
                if let RoleFilter::Specific(roles) = &mut self.selection.roles {
                    toggle_in(roles, value.to_string());
                }
            }
            Dimension::Seniority => toggle_in(&mut self.selection.seniorities, value.to_string()),
            Dimension::CompanySize => {
                toggle_in(&mut self.selection.company_sizes, value.to_string())
            }
        }
        self.refresh();
    }

    /// Select all values in a dimension. For roles this restores the wildcard.
    pub fn select_all(&mut self, dimension: Dimension) {
        let Some(ds) = &self.dataset else {
            return;
        };
        match dimension {
            Dimension::Year => self.selection.years = ds.years().clone(),
            Dimension::Role => self.selection.roles = RoleFilter::All,
            Dimension::Seniority => self.selection.seniorities = ds.seniorities().clone(),
            Dimension::CompanySize => self.selection.company_sizes = ds.company_sizes().clone(),
        }
        self.refresh();
    }

    /// Deselect all values in a dimension.
    pub fn select_none(&mut self, dimension: Dimension) {
        match dimension {
            Dimension::Year => self.selection.years.clear(),
            Dimension::Role => self.selection.roles = RoleFilter::Specific(BTreeSet::new()),
            Dimension::Seniority => self.selection.seniorities.clear(),
            Dimension::CompanySize => self.selection.company_sizes.clear(),
        }
        self.refresh();
    }

    /// The "all roles" checkbox. Unchecking starts from an empty explicit set.
    pub fn set_all_roles(&mut self, all: bool) {
        self.selection.roles = if all {
            RoleFilter::All
        } else {
            RoleFilter::Specific(BTreeSet::new())
        };
        self.refresh();
    }
}

fn toggle_in<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(Dataset::from_records(vec![
            record(2023, "Data Scientist", "Senior", "L", "Remote", "USA", 150_000.0),
            record(2023, "Data Scientist", "Junior", "S", "On-site", "BRA", 50_000.0),
            record(2024, "Analyst", "Mid", "M", "Hybrid", "DEU", 60_000.0),
        ]));
        state
    }

    fn record_count(state: &AppState) -> Option<usize> {
        match state.summary.as_ref()? {
            Ok(Aggregation::Data(r)) => Some(r.record_count),
            _ => None,
        }
    }

    #[test]
    fn empty_state_has_no_summary() {
        let mut state = AppState::default();
        state.refresh();
        assert!(state.summary.is_none());
        assert!(state.visible_records().is_empty());
    }

    #[test]
    fn loading_selects_everything() {
        let state = loaded();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(record_count(&state), Some(3));
        assert!(state.status_message.is_none());
    }

    #[test]
    fn toggling_year_off_narrows() {
        let mut state = loaded();
        state.toggle(Dimension::Year, "2024");
        assert_eq!(state.visible_indices, vec![0, 1]);
        state.toggle(Dimension::Year, "2024");
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn toggling_role_under_wildcard_goes_explicit() {
        let mut state = loaded();
        state.toggle(Dimension::Role, "Analyst");
        assert_eq!(
            state.selection.roles,
            RoleFilter::Specific(["Data Scientist".to_string()].into_iter().collect())
        );
        assert_eq!(state.visible_indices, vec![0, 1]);
    }

    #[test]
    fn unchecking_all_roles_yields_no_data() {
        let mut state = loaded();
        state.set_all_roles(false);
        assert!(state.visible_indices.is_empty());
        assert_eq!(state.summary, Some(Ok(Aggregation::NoData)));
        assert!(state.status_message.is_some());

        state.toggle(Dimension::Role, "Analyst");
        assert_eq!(state.visible_indices, vec![2]);

        state.set_all_roles(true);
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn select_none_then_all() {
        let mut state = loaded();
        state.select_none(Dimension::CompanySize);
        assert_eq!(state.summary, Some(Ok(Aggregation::NoData)));
        state.select_all(Dimension::CompanySize);
        assert_eq!(record_count(&state), Some(3));
    }

    #[test]
    fn bad_year_text_is_ignored() {
        let mut state = loaded();
        state.toggle(Dimension::Year, "twenty");
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn integrity_error_is_stored_then_recovers() {
        let mut state = AppState::default();
        state.set_dataset(Dataset::from_records(vec![
            record(2023, "Analyst", "Mid", "M", "Hybrid", "DEU", 60_000.0),
            record(2024, "Analyst", "Mid", "M", "Hybrid", "DEU", 70_000.0),
            record(2024, "Analyst", "Senior", "L", "Remote", "USA", f64::NAN),
        ]));

        assert!(matches!(
            state.summary,
            Some(Err(EngineError::DataIntegrity { row: 2, field: "salary_usd", .. }))
        ));
        assert!(state.status_message.is_some());

        // Only the bad row is visible: it is first in the filtered sequence
        // but the error still names its dataset row.
        state.toggle(Dimension::Year, "2023");
        state.toggle(Dimension::Seniority, "Mid");
        assert_eq!(state.visible_indices, vec![2]);
        assert!(matches!(
            state.summary,
            Some(Err(EngineError::DataIntegrity { row: 2, .. }))
        ));

        state.toggle(Dimension::Seniority, "Mid");
        state.toggle(Dimension::Seniority, "Senior");
        assert!(matches!(state.summary, Some(Ok(Aggregation::Data(_)))));
        assert!(state.status_message.is_none());
        assert_eq!(state.visible_indices, vec![1]);
    }

    #[test]
    fn no_data_status_uses_report_message() {
        let mut state = loaded();
        state.select_none(Dimension::Year);
        assert_eq!(state.status_message.as_deref(), Some(NO_DATA_MESSAGE));
    }

    #[test]
    fn config_change_recomputes() {
        let mut state = loaded();
        state.set_config(EngineConfig {
            histogram_bins: 4,
            ..Default::default()
        });
        let Some(Ok(Aggregation::Data(r))) = &state.summary else {
            panic!("expected data");
        };
        assert_eq!(r.salary_histogram.len(), 4);
    }
}
