use std::path::Path;

use clap::Parser;
use reqflow::{Config, Palette, domain::Direction};
use tracing::instrument;

#[derive(Debug, Parser)]
pub struct Init {
    /// Colour table for requirement priorities (red, blue or pastel)
    #[arg(long)]
    palette: Option<Palette>,

    /// Rank direction for dot output (tb or lr)
    #[arg(long)]
    direction: Option<Direction>,

    /// Largest number of variables `cases` will enumerate
    #[arg(long)]
    max_variables: Option<usize>,

    /// Overwrite an existing configuration file
    #[arg(long)]
    force: bool,
}

impl Init {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        if path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite it)",
                path.display()
            );
        }

        self.config()
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", path.display()))?;

        println!("Created {}", path.display());
        Ok(())
    }

    fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(palette) = self.palette {
            config.palette = palette;
        }
        if let Some(direction) = self.direction {
            config.direction = direction;
        }
        if let Some(limit) = self.max_variables {
            config.set_max_variables(limit);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn init(force: bool) -> Init {
        Init {
            palette: Some(Palette::Pastel),
            direction: None,
            max_variables: Some(6),
            force,
        }
    }

    #[test]
    fn writes_a_loadable_config() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("reqflow.toml");

        init(false).run(&path).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.palette, Palette::Pastel);
        assert_eq!(config.direction, Direction::default());
        assert_eq!(config.max_variables(), 6);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("reqflow.toml");
        std::fs::write(&path, "keep me").unwrap();

        assert!(init(false).run(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

        init(true).run(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap().max_variables(), 6);
    }
}
