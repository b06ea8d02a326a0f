//! Filter-and-aggregate engine behind a data-salary survey dashboard.
//!
//! The flow is `load_file` → [`filter`] → [`aggregate`]; the presentation
//! layer renders the resulting [`Aggregation`] and the filtered rows. Every
//! selection change recomputes both steps from scratch.
//!
//! ```no_run
//! use std::path::Path;
//! use salary_insights::{aggregate, filter, load_file, EngineConfig, FilterSelection};
//!
//! let dataset = load_file(Path::new("salaries.csv"))?;
//! let selection = FilterSelection::all_of(&dataset);
//! let rows = filter(dataset.records(), &selection);
//! let summary = aggregate(&rows, &EngineConfig::default())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod state;

pub use config::{EngineConfig, TieBreak};
pub use data::aggregate::{
    aggregate, AggregateResult, Aggregation, CategoryCount, CountryMean, HistogramBucket,
    RoleMean,
};
pub use data::filter::{filter, filtered_indices, FilterSelection, RoleFilter};
pub use data::loader::load_file;
pub use data::model::{CellValue, Column, Dataset, Dimension, Record};
pub use error::EngineError;
pub use report::QueryReport;
pub use state::AppState;
