use std::path::PathBuf;

use clap::Parser;
use reqflow::{Config, Palette, compile, domain::Direction, storage::load_requirements};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Graph {
    /// A JSON or YAML file containing a list of requirements
    requirements: PathBuf,

    /// Output format
    #[arg(long, short, value_name = "FORMAT", default_value = "json")]
    format: Format,

    /// Colour table for requirement priorities (red, blue or pastel)
    ///
    /// Overrides the configured palette.
    #[arg(long)]
    palette: Option<Palette>,

    /// Rank direction for dot output (tb or lr)
    ///
    /// Overrides the configured direction.
    #[arg(long)]
    direction: Option<Direction>,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum Format {
    /// Nodes and edges as JSON
    #[default]
    Json,
    /// Graphviz dot
    Dot,
    /// Node and edge counts
    Summary,
}

impl Graph {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let requirements = load_requirements(&self.requirements)?;
        let palette = self.palette.unwrap_or(config.palette);
        let direction = self.direction.unwrap_or(config.direction);

        let graph = compile(&requirements, palette);

        match self.format {
            Format::Json => println!("{}", serde_json::to_string_pretty(&graph)?),
            Format::Dot => print!("{}", graph.dot(direction)),
            Format::Summary => {
                let intermediates = graph.intermediates().count();
                println!(
                    "{} requirements, {} intermediate nodes, {} edges",
                    graph.nodes().len() - intermediates,
                    intermediates,
                    graph.edges().len()
                );

                let issues = graph.diagnose();
                if issues.is_empty() {
                    println!("{}", "No issues found".success());
                } else {
                    println!(
                        "{}",
                        format!("{} issues found (run `reqflow check` for details)", issues.len())
                            .warning()
                    );
                }
            }
        }

        Ok(())
    }
}
