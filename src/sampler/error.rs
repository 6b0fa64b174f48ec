use std::path::Path;

use crate::sampler::Family;

/// Errors raised by the sampler, the CSV codec and the chart adapters.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// A counter source or data file did not have the expected shape
    #[error("Parse error in {origin}: {detail}")]
    Parse { origin: String, detail: String },

    /// Opening, reading or writing a file failed
    #[error("I/O error on {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("Unknown family: {0}")]
    UnknownFamily(String),

    #[error("Unknown key: {family}.{key}")]
    UnknownKey { family: Family, key: String },

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    /// A series has no samples where a base value is needed
    #[error("Series {family}.{key} has no samples")]
    EmptySeries { family: Family, key: String },

    /// A difference from the first sample does not fit a signed 64-bit value
    #[error("Series {family}.{key} changes too much to express as a difference")]
    DeltaOverflow { family: Family, key: String },

    /// A counter read was cancelled or panicked before returning
    #[error("Counter read interrupted: {0}")]
    Interrupted(String),

    /// The chart sink could not produce its image
    #[error("Render failed: {0}")]
    Render(String),
}

impl CollectError {
    pub(crate) fn parse(origin: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn io(path: &Path, error: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            error,
        }
    }

    pub(crate) fn from_csv(path: &Path, err: csv::Error) -> Self {
        let detail = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(error) => Self::io(path, error),
            _ => Self::parse(path.display().to_string(), detail),
        }
    }

    pub(crate) fn unknown_key(family: Family, key: &str) -> Self {
        Self::UnknownKey {
            family,
            key: key.to_string(),
        }
    }
}
