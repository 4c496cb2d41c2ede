//! Error types for loading inputs and writing outputs.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run: unreadable inputs, unwritable outputs and
/// detection tables without the expected columns.
///
/// Per-record problems (a malformed pose line, an unparseable row) are not
/// errors; they are logged and skipped by the parsers.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(
        "detection table is missing columns {missing:?} (expected frame, track_id, class, center_x, center_y; found {found:?})"
    )]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PLY parsing error: {0}")]
    Ply(String),
}

impl DataError {
    /// Attach the offending path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    /// Name `path` on an error raised while streaming from it.
    pub fn at_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            DataError::Stream(source) => DataError::io(path, source),
            other => other,
        }
    }
}
