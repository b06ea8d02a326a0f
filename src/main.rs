use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use salary_insights::report::{render_text, QueryReport};
use salary_insights::{
    aggregate, filter, load_file, Dataset, EngineConfig, FilterSelection, RoleFilter,
};

/// Data-salary insights: filter a survey table and print its summary.
#[derive(Debug, Parser)]
#[command(name = "salary-insights")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Survey table (.csv, .json or .parquet).
    path: PathBuf,

    /// Years to include (repeatable). Default: every year in the table.
    #[arg(long = "year")]
    years: Vec<i32>,

    /// Roles to include (repeatable). Default: all roles.
    #[arg(long = "role")]
    roles: Vec<String>,

    /// Seniority levels to include (repeatable). Default: all.
    #[arg(long = "seniority")]
    seniorities: Vec<String>,

    /// Company sizes to include (repeatable). Default: all.
    #[arg(long = "company-size")]
    company_sizes: Vec<String>,

    /// JSON file holding a full selection; overrides the per-dimension flags.
    #[arg(long, conflicts_with_all = ["years", "roles", "seniorities", "company_sizes"])]
    selection: Option<PathBuf>,

    /// JSON engine config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Histogram bucket count (overrides the config file).
    #[arg(long)]
    bins: Option<usize>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Include the filtered rows in the report (JSON output only).
    #[arg(long)]
    rows: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn check(&self) -> Result<()> {
        if self.rows && self.format != OutputFormat::Json {
            bail!("--rows is only supported with --format json");
        }
        Ok(())
    }

    /// Explicit flags narrow a dimension; omitted dimensions keep every value.
    fn selection(&self, dataset: &Dataset) -> Result<FilterSelection> {
        if let Some(path) = &self.selection {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading selection file {}", path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("parsing selection file {}", path.display()));
        }

        let mut selection = FilterSelection::all_of(dataset);
        if !self.years.is_empty() {
            selection.years = self.years.iter().copied().collect();
        }
        if !self.roles.is_empty() {
            selection.roles = RoleFilter::Specific(self.roles.iter().cloned().collect());
        }
        if !self.seniorities.is_empty() {
            selection.seniorities = to_set(&self.seniorities);
        }
        if !self.company_sizes.is_empty() {
            selection.company_sizes = to_set(&self.company_sizes);
        }
        Ok(selection)
    }

    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(bins) = self.bins {
            config.histogram_bins = bins;
        }
        config.validate()?;
        Ok(config)
    }
}

fn to_set(values: &[String]) -> BTreeSet<String> {
    values.iter().cloned().collect()
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    cli.check()?;
    let config = cli.engine_config()?;
    let dataset = load_file(&cli.path)?;
    let selection = cli.selection(&dataset)?;

    let rows = filter(dataset.records(), &selection);
    log::info!("{} of {} records match", rows.len(), dataset.len());
    let summary = aggregate(&rows, &config)?;

    match cli.format {
        OutputFormat::Text => println!("{}", render_text(&summary)),
        OutputFormat::Json => {
            let mut report = QueryReport::new(&selection, &summary);
            if cli.rows {
                report = report.with_rows(&rows);
            }
            println!("{}", report.to_json()?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_requires_json_output() {
        let cli = Cli::try_parse_from(["salary-insights", "survey.csv", "--rows"]).unwrap();
        assert!(cli.check().is_err());

        let cli = Cli::try_parse_from(["salary-insights", "survey.csv", "--rows", "--format", "json"])
            .unwrap();
        assert!(cli.check().is_ok());
    }

    #[test]
    fn selection_file_conflicts_with_flags() {
        let parsed = Cli::try_parse_from([
            "salary-insights",
            "survey.csv",
            "--selection",
            "sel.json",
            "--year",
            "2023",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn omitted_dimensions_keep_everything() -> Result<()> {
        let dataset = Dataset::from_records(Vec::new());
        let cli = Cli::try_parse_from(["salary-insights", "survey.csv", "--role", "Analyst"])?;
        let selection = cli.selection(&dataset)?;
        assert_eq!(selection.roles, RoleFilter::Specific(to_set(&["Analyst".to_string()])));
        assert_eq!(selection.years, dataset.years().clone());
        Ok(())
    }
}
