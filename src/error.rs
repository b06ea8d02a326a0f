//! Engine error types.
//!
//! Only the aggregator and configuration validation can fail. An empty
//! filter result is not an error: it is reported as
//! [`Aggregation::NoData`](crate::data::aggregate::Aggregation::NoData).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// A record reached the aggregator with a value no loader should accept.
    #[error("data integrity error in record {row}, field '{field}': {reason}")]
    DataIntegrity {
        /// Position in the sequence handed to the aggregator.
        /// [`AppState`](crate::state::AppState) rewrites it to the dataset row.
        row: usize,
        field: &'static str,
        reason: String,
    },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
