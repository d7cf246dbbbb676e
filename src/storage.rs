use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::domain::{Catalog, Requirement};

/// Errors that can occur when loading a data file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened or read.
    #[error("failed to read {}", .path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The file is not valid JSON of the expected shape.
    #[error("failed to parse {} as JSON", .path.display())]
    Json {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// The file is not valid YAML of the expected shape.
    #[error("failed to parse {} as YAML", .path.display())]
    Yaml {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// The file extension is not one of `.json`, `.yaml` or `.yml`.
    #[error("unsupported file format for {}: expected .json, .yaml or .yml", .path.display())]
    UnsupportedFormat {
        /// The file.
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let format = Format::of(path).ok_or_else(|| LoadError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    match format {
        Format::Json => serde_json::from_reader(reader).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Format::Yaml => serde_yaml::from_reader(reader).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads a list of requirements from a JSON or YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unsupported extension,
/// or does not contain a list of requirement records.
#[instrument(level = "debug")]
pub fn load_requirements(path: &Path) -> Result<Vec<Requirement>, LoadError> {
    let requirements: Vec<Requirement> = read(path)?;
    debug!(count = requirements.len(), "loaded requirements");
    Ok(requirements)
}

/// Loads a catalog of boolean statements from a JSON or YAML file containing a
/// list of strings.
///
/// Individual malformed statements do not fail the load; they are kept on the
/// catalog and reported when evaluated.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unsupported extension,
/// or is not a list of strings.
#[instrument(level = "debug")]
pub fn load_catalog(path: &Path) -> Result<Catalog, LoadError> {
    let catalog: Catalog = read(path)?;
    debug!(
        count = catalog.len(),
        malformed = catalog.malformed().count(),
        "loaded catalog"
    );
    Ok(catalog)
}
