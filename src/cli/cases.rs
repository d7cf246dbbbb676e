use std::path::PathBuf;

use clap::Parser;
use reqflow::{
    Config, TestSuite,
    domain::{Outcome, cases::GenerateError},
    generate_test_cases,
    storage::load_catalog,
};
use tracing::{instrument, warn};

use super::terminal::{Colorize, cell};

#[derive(Debug, Parser)]
pub struct Cases {
    /// A JSON or YAML file containing a list of boolean statements
    catalog: PathBuf,

    /// The target statement whose variables are enumerated, e.g. "T = A AND B"
    expression: String,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Largest number of variables to enumerate
    ///
    /// Overrides the configured limit.
    #[arg(long)]
    max_variables: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Cases {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let catalog = load_catalog(&self.catalog)?;
        for (entry, error) in catalog.malformed() {
            warn!(
                "statement '{}' is malformed, its column will be missing: {error}",
                entry.source()
            );
        }

        let limit = self.max_variables.unwrap_or_else(|| config.max_variables());
        let suite = match generate_test_cases(&self.expression, &catalog, limit) {
            Ok(suite) => suite,
            Err(error @ GenerateError::TooManyVariables { .. }) => {
                anyhow::bail!("{error} (raise it with --max-variables)")
            }
            Err(error) => return Err(error.into()),
        };

        match self.output {
            OutputFormat::Table => output_table(&suite),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suite.cases)?),
        }

        Ok(())
    }
}

fn output_table(suite: &TestSuite) {
    let columns: Vec<&str> = suite
        .variables
        .iter()
        .chain(&suite.outputs)
        .map(String::as_str)
        .collect();
    let widths: Vec<usize> = columns.iter().map(|name| name.chars().count()).collect();

    let header: Vec<String> = suite
        .variables
        .iter()
        .zip(&widths)
        .map(|(name, &width)| format!("{name:>width$}"))
        .collect();
    let outputs: Vec<String> = suite
        .outputs
        .iter()
        .zip(&widths[suite.variables.len()..])
        .map(|(name, &width)| format!("{name:>width$}"))
        .collect();
    println!("{} │ {}", header.join(" "), outputs.join(" "));

    for case in &suite.cases {
        let inputs: Vec<String> = suite
            .variables
            .iter()
            .zip(&widths)
            .map(|(name, &width)| {
                let value = case.input_values.get(name).copied().unwrap_or_default();
                let outcome = Outcome::Value(value);
                pad(&cell(&outcome), &outcome, width)
            })
            .collect();
        let outputs: Vec<String> = suite
            .outputs
            .iter()
            .zip(&widths[suite.variables.len()..])
            .map(|(name, &width)| {
                case.case_output.get(name).map_or_else(
                    || " ".repeat(width),
                    |outcome| pad(&cell(outcome), outcome, width),
                )
            })
            .collect();
        println!("{} │ {}", inputs.join(" "), outputs.join(" "));
    }

    let reasons: Vec<String> = suite
        .cases
        .first()
        .into_iter()
        .flat_map(|case| &case.case_output)
        .filter_map(|(name, outcome)| match outcome {
            Outcome::Missing { missing } => Some(format!("{name}: {missing}")),
            Outcome::Value(_) => None,
        })
        .collect();
    if !reasons.is_empty() {
        println!();
        for reason in reasons {
            println!("{} {}", "?".warning(), reason.dim());
        }
    }
}

/// Right-aligns a coloured cell. Escape codes do not count towards the width.
fn pad(rendered: &str, outcome: &Outcome, width: usize) -> String {
    let visible = outcome.to_string().chars().count();
    format!("{}{rendered}", " ".repeat(width.saturating_sub(visible)))
}
