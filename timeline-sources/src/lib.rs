//! Event sources (delimited text and JSON records) to `WorkingSet` loader.

mod delimited;
mod loader;
mod structured;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use timeline_core::TimelineError;

pub use delimited::{parse_delimited, parse_row, split_row, DelimitedRow};
pub use loader::{build_working_set, build_working_set_at, load_working_set, parse_source};
pub use structured::{parse_structured_str, parse_structured_value};

/// Input format of a source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        extension.parse().ok()
    }
}

impl FromStr for SourceFormat {
    type Err = TimelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(TimelineError::Other(format!("unknown source format: {other}"))),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// A named source. `name` namespaces the ids of its records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub format: SourceFormat,
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, format: SourceFormat) -> Self {
        Self {
            name: name.into(),
            format,
        }
    }

    pub fn csv(name: impl Into<String>) -> Self {
        Self::new(name, SourceFormat::Csv)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, SourceFormat::Json)
    }
}
