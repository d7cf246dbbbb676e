use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, Palette, cases::DEFAULT_VARIABLE_LIMIT};

/// Configuration for graph compilation and test-case generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The colour table used to shade requirement nodes by priority.
    pub palette: Palette,

    /// The rank direction for Graphviz output.
    pub direction: Direction,

    /// The largest number of free variables a target expression may have.
    ///
    /// Test cases grow as `2^n`, so this bounds time and memory.
    max_variables: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            direction: Direction::default(),
            max_variables: default_max_variables(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the variable limit for test-case generation.
    #[must_use]
    pub const fn max_variables(&self) -> usize {
        self.max_variables
    }

    /// Sets the variable limit for test-case generation.
    pub const fn set_max_variables(&mut self, value: usize) {
        self.max_variables = value;
    }
}

const fn default_max_variables() -> usize {
    DEFAULT_VARIABLE_LIMIT
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        palette: Palette,

        #[serde(default)]
        direction: Direction,

        #[serde(default = "default_max_variables")]
        max_variables: usize,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                palette,
                direction,
                max_variables,
            } => Self {
                palette,
                direction,
                max_variables,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            palette: config.palette,
            direction: config.direction,
            max_variables: config.max_variables,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = r#"
_version = "1"
palette = "blue"
direction = "left-right"
max_variables = 8
"#;
        file.write_all(content.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.palette, Palette::Blue);
        assert_eq!(config.direction, Direction::LeftRight);
        assert_eq!(config.max_variables(), 8);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\npalette = \"green\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("reqflow.toml");

        let mut config = Config {
            palette: Palette::Pastel,
            ..Config::default()
        };
        config.set_max_variables(12);
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
