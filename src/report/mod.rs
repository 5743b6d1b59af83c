//! Report outputs.
//!
//! Text reports for people, a JSON value tree for API consumers and a
//! multi-sheet spreadsheet for facilitators. All three read the same
//! [`AnalysisResult`](crate::models::AnalysisResult) and never modify it.

pub mod export;
pub mod generator;
pub mod json;

pub use export::{export_to_buffer, export_to_path, DEFAULT_EXPORT_NAME};
pub use generator::{generate_cohort_report, generate_full_report, generate_student_reports};
pub use json::{encode, envelope, to_value_tree};
