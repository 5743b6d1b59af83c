//! LearnGap - learning-gap analysis for assessment responses.
//!
//! Turns a spreadsheet of student answers into cohort question statistics,
//! per-student weak areas and pacing comparisons, then renders them as
//! text reports, a JSON value tree or a multi-sheet spreadsheet.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let result = learngap::analyze(Path::new("Formative_M1.xlsx"))?;
//! println!("{}", learngap::report::generate_cohort_report(&result));
//! # Ok::<(), learngap::AnalysisError>(())
//! ```
//!
//! The library holds no global state: every call owns its table and result.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod report;

pub use analysis::{analyze, analyze_bytes, analyze_table, analyze_with};
pub use error::{AnalysisError, Result};
pub use loader::{LoadOptions, SheetLoader};
pub use models::{
    AnalysisResult, AnswerStatus, CohortAnalysis, QuestionAccuracy, QuestionStats,
    ResponseRecord, ResponseTable, StudentProfile, TimeComparison, TimingStats,
};
