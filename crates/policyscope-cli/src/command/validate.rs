use std::path::PathBuf;

use clap::Args;
use policyscope_analysis::{report::generate_validation_report, validation::RecordValidator};
use serde_json::Value;

use crate::util::{self, Output};

const RECORD_PATTERN: &str = "*.json";

#[derive(Debug, Clone, Args)]
pub(crate) struct ValidateArg {
    /// Directory containing one analysis JSON file per app
    pub dir: PathBuf,

    /// Treat warnings as validation failures
    #[arg(long)]
    pub strict: bool,

    /// Skip cross-record anomaly detection
    #[arg(long)]
    pub no_anomalies: bool,

    /// Text report output path (stdout if omitted)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Also write the full validation result as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// JSON config file with "validator" and "analysis" sections
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub(crate) fn run(arg: &ValidateArg) -> anyhow::Result<()> {
    let config = util::read_config_file(arg.config.as_deref())?;
    let mut validator_config = config.validator;
    validator_config.strict_mode |= arg.strict;

    let records = util::load_json_dir::<Value>("analysis", &arg.dir, RECORD_PATTERN)?
        .into_iter()
        .filter_map(|(path, value)| {
            if value.is_object() {
                Some(value)
            } else {
                tracing::warn!(path = %path.display(), "skipping file: not a JSON object");
                None
            }
        })
        .collect::<Vec<_>>();

    let validator = RecordValidator::new(validator_config);
    let result = validator.validate_batch(&records, !arg.no_anomalies)?;

    let mut output = Output::from_output_path(arg.report.clone())?;
    output.write_text(&generate_validation_report(&result))?;
    if let Some(path) = &arg.json {
        Output::save_json(&result, Some(path.clone()))?;
        eprintln!("Validation result written to {}", path.display());
    }

    let summary = &result.summary;
    eprintln!(
        "Validated {} records: {} valid, {} invalid ({:.1}%)",
        summary.total, summary.valid, summary.invalid, summary.validation_rate_percent
    );

    if validator_config.strict_mode && result.has_invalid_records() {
        anyhow::bail!(
            "{} of {} records failed strict validation",
            summary.invalid,
            summary.total
        );
    }
    Ok(())
}
