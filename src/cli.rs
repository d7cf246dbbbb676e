use std::path::{Path, PathBuf};

mod cases;
mod check;
mod graph;
mod init;
mod terminal;

use anyhow::Context;
use cases::Cases;
use check::Check;
use clap::ArgAction;
use graph::Graph;
use init::Init;
use reqflow::Config;
use tracing::instrument;

/// The configuration file picked up from the working directory when no
/// `--config` is given.
const DEFAULT_CONFIG: &str = "reqflow.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(self.config.as_deref())
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[instrument(level = "debug")]
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).is_file() => Path::new(DEFAULT_CONFIG),
        None => return Ok(Config::default()),
    };

    tracing::debug!("loading configuration from {}", path.display());
    Config::load(path)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Write a configuration file with default settings
    ///
    /// Writes to the `--config` path, or `reqflow.toml` in the working
    /// directory.
    Init(Init),

    /// Compile requirements into a dependency graph
    ///
    /// Every nested sub-expression becomes an intermediate node labelled
    /// I1, I2, ... in creation order.
    Graph(Graph),

    /// Report data-quality issues in the dependency graph
    ///
    /// Reports priorities with no style, references to unknown requirements,
    /// repeated edges, duplicate requirement ids and dependency cycles.
    Check(Check),

    /// Generate truth-table test cases for a boolean expression
    Cases(Cases),
}

impl Command {
    fn run(self, config_path: Option<&Path>) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => {
                command.run(config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG)))?;
            }
            Self::Graph(command) => command.run(&load_config(config_path)?)?,
            Self::Check(command) => command.run(&load_config(config_path)?)?,
            Self::Cases(command) => command.run(&load_config(config_path)?)?,
        }
        Ok(())
    }
}
