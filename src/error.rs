//! Error types for the analysis pipeline.
//!
//! Every failure the pipeline can hit on expected bad input is one of
//! these variants. Nothing is retried and no partial result is returned.

use std::path::Path;
use thiserror::Error;

/// Errors returned by loading, analysing, serializing or exporting.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The input could not be read or parsed as a spreadsheet.
    #[error("Failed to load '{source_name}': {reason}")]
    Load { source_name: String, reason: String },

    /// One or more required columns are absent from the header row.
    #[error("'{source_name}' is missing required column(s): {}", .columns.join(", "))]
    Schema {
        source_name: String,
        columns: Vec<String>,
    },

    /// The sheet was read but holds no data rows.
    #[error("'{source_name}' contains no response rows")]
    EmptyDataset { source_name: String },

    /// A value could not be converted to the wire format safely.
    #[error("Serialization error at {path}: {reason}")]
    Serialization { path: String, reason: String },

    /// The spreadsheet export could not be produced.
    #[error("Failed to export '{target}': {reason}")]
    Export { target: String, reason: String },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub(crate) fn load(source_name: impl Into<String>, reason: impl ToString) -> Self {
        AnalysisError::Load {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn serialization(path: impl Into<String>, reason: impl ToString) -> Self {
        AnalysisError::Serialization {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn export(target: &Path, reason: impl ToString) -> Self {
        AnalysisError::Export {
            target: target.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_columns() {
        let err = AnalysisError::Schema {
            source_name: "scores.xlsx".to_string(),
            columns: vec!["Login ID".to_string(), "Attempt ID".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "'scores.xlsx' is missing required column(s): Login ID, Attempt ID"
        );
    }

    #[test]
    fn test_empty_dataset_display() {
        let err = AnalysisError::EmptyDataset {
            source_name: "empty.xlsx".to_string(),
        };
        assert_eq!(err.to_string(), "'empty.xlsx' contains no response rows");
    }

    #[test]
    fn test_load_helper() {
        let err = AnalysisError::load("bad.xlsx", "not a zip archive");
        assert!(matches!(err, AnalysisError::Load { .. }));
        assert!(err.to_string().contains("not a zip archive"));
    }
}
