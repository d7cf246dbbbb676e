use std::path::PathBuf;

use clap::Parser;
use reqflow::{Config, compile, domain::Issue, storage::load_requirements};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Check {
    /// A JSON or YAML file containing a list of requirements
    requirements: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Check {
    /// Exits with status 2 when any issue is found.
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let requirements = load_requirements(&self.requirements)?;
        let graph = compile(&requirements, config.palette);
        let issues = graph.diagnose();

        match self.output {
            OutputFormat::Table => self.output_table(&issues, requirements.len()),
            OutputFormat::Json => Self::output_json(&issues)?,
        }

        if !issues.is_empty() {
            std::process::exit(2);
        }

        Ok(())
    }

    fn output_table(&self, issues: &[Issue], requirements: usize) {
        if self.quiet {
            return;
        }

        if issues.is_empty() {
            println!(
                "{}",
                format!("✓ {requirements} requirements, no issues").success()
            );
            return;
        }

        for issue in issues {
            println!("{} {issue}", "✗".warning());
        }
        println!(
            "\n{}",
            format!("Summary: {} issues found", issues.len()).warning()
        );
    }

    fn output_json(issues: &[Issue]) -> anyhow::Result<()> {
        let output = serde_json::json!({
            "issues": issues,
            "total": issues.len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
