use std::path::PathBuf;

use clap::Args;
use policyscope_analysis::{comparative::ComparativeStatisticsEngine, record::AnalysisRecord};

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct CompareArg {
    /// Directory containing one analysis JSON file per app
    pub dir: PathBuf,

    /// File name pattern of the records to load (`*` matches any run of characters)
    #[arg(long, default_value = "*_report_*.json")]
    pub pattern: String,

    /// Output file path (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// JSON config file with "validator" and "analysis" sections
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub(crate) fn run(arg: &CompareArg) -> anyhow::Result<()> {
    let config = util::read_config_file(arg.config.as_deref())?;
    let records = util::load_json_dir::<AnalysisRecord>("analysis record", &arg.dir, &arg.pattern)?
        .into_iter()
        .map(|(_, record)| record)
        .collect::<Vec<_>>();
    if records.is_empty() {
        tracing::warn!(
            dir = %arg.dir.display(),
            pattern = %arg.pattern,
            "no analysis records found"
        );
    }

    let engine = ComparativeStatisticsEngine::new(config.analysis);
    let report = engine.generate_comparative_report(&records);
    Output::save_json(&report, arg.output.clone())?;

    eprintln!("Compared {} apps", report.metadata.num_apps_analyzed);
    Ok(())
}
