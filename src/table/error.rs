//! Error types for the table module

use std::path::PathBuf;

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for reading and writing CSV tables
#[derive(Debug, Error)]
pub enum TableError {
    /// A required header is absent
    #[error("{} has no '{column}' column", .path.display())]
    MissingColumn {
        /// The header that was looked for
        column: &'static str,
        /// File being read
        path: PathBuf,
    },

    /// The input file could not be read as CSV
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The output file could not be written
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A JSON column could not be encoded
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TableError> for CrateError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Json(e) => CrateError::Json(e),
            TableError::Io(e) => CrateError::Io(e),
            TableError::Write { .. } => CrateError::Output(err.to_string()),
            _ => CrateError::Input(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message() {
        let err = TableError::MissingColumn {
            column: "website_url",
            path: PathBuf::from("sites.csv"),
        };
        assert_eq!(err.to_string(), "sites.csv has no 'website_url' column");
        assert!(matches!(CrateError::from(err), CrateError::Input(_)));
    }
}
