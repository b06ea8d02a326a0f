use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const DEFAULT_HISTOGRAM_BINS: usize = 25;
pub const DEFAULT_MAX_ROLES: usize = 15;

/// How `most_common_role` is chosen when several roles share the top count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The tied role that appears first in the filtered records.
    #[default]
    FirstEncountered,
    /// The lexicographically smallest tied role.
    Lexicographic,
}

/// Presentation-density knobs for the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Number of equal-width salary histogram buckets.
    pub histogram_bins: usize,
    /// Cap on the role-mean series; the highest-paying roles are kept.
    pub max_roles: usize,
    pub tie_break: TieBreak,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            max_roles: DEFAULT_MAX_ROLES,
            tie_break: TieBreak::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.histogram_bins == 0 {
            return Err(EngineError::InvalidConfig(
                "histogram_bins must be at least 1".into(),
            ));
        }
        if self.max_roles == 0 {
            return Err(EngineError::InvalidConfig(
                "max_roles must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Read and validate a JSON config file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        log::debug!("loaded engine config {config:?}");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_layout() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.histogram_bins, 25);
        assert_eq!(cfg.max_roles, 15);
        assert_eq!(cfg.tie_break, TieBreak::FirstEncountered);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"histogram_bins": 20, "tie_break": "lexicographic"}"#)
                .unwrap();
        assert_eq!(cfg.histogram_bins, 20);
        assert_eq!(cfg.max_roles, 15);
        assert_eq!(cfg.tie_break, TieBreak::Lexicographic);
    }

    #[test]
    fn zero_bins_rejected() {
        let cfg = EngineConfig {
            histogram_bins: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn config_file_round_trip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"max_roles": 5}"#)?;

        let cfg = EngineConfig::from_json_file(&path)?;
        assert_eq!(cfg.max_roles, 5);

        std::fs::write(&path, r#"{"max_roles": 0}"#)?;
        assert!(EngineConfig::from_json_file(&path).is_err());
        Ok(())
    }
}
