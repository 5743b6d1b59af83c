//! Analysis pipeline.
//!
//! Loading, cohort aggregation and per-student profiling, joined into the
//! single entry point the CLI (or any other caller) uses.

pub mod aggregator;
pub mod stats;
pub mod student;

pub use aggregator::aggregate_cohort;
pub use student::analyze_students;

use crate::error::{AnalysisError, Result};
use crate::loader::{LoadOptions, SheetLoader};
use crate::models::{AnalysisResult, ResponseTable};
use std::path::Path;

/// Analyse an already loaded table.
///
/// An empty table is an error rather than an empty result.
pub fn analyze_table(table: &ResponseTable) -> Result<AnalysisResult> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyDataset {
            source_name: table.source_name().to_string(),
        });
    }

    let cohort = aggregate_cohort(table);
    let students = analyze_students(table, &cohort);

    Ok(AnalysisResult { cohort, students })
}

/// Load a spreadsheet with default options and analyse it.
pub fn analyze(path: &Path) -> Result<AnalysisResult> {
    analyze_with(path, &LoadOptions::default())
}

/// Load a spreadsheet with explicit options and analyse it.
pub fn analyze_with(path: &Path, options: &LoadOptions) -> Result<AnalysisResult> {
    let table = SheetLoader::new(options.clone()).load_path(path)?;
    analyze_table(&table)
}

/// Analyse spreadsheet bytes, e.g. an uploaded file that never touched disk.
pub fn analyze_bytes(
    bytes: Vec<u8>,
    source_name: &str,
    options: &LoadOptions,
) -> Result<AnalysisResult> {
    let table = SheetLoader::new(options.clone()).load_bytes(bytes, source_name)?;
    analyze_table(&table)
}
