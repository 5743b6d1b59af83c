//! Multi-sheet spreadsheet export.
//!
//! Sheet and column names are read by downstream tools, so they are kept
//! as constants here and must not change.

use crate::error::{AnalysisError, Result};
use crate::models::AnalysisResult;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_EXPORT_NAME: &str = "learning_gaps_analysis.xlsx";

pub const COHORT_SHEET: &str = "Cohort_Performance";
pub const STUDENT_SHEET: &str = "Student_Summary";
pub const TIMING_SHEET: &str = "Detailed_Timing";

pub const COHORT_COLUMNS: [&str; 5] = [
    "Question ID",
    "Accuracy",
    "Students Attempted",
    "Question Text",
    "Is_Weak",
];
pub const STUDENT_COLUMNS: [&str; 4] = [
    "Student_ID",
    "Overall_Accuracy",
    "Weak_Question_Count",
    "Total_Attempts",
];
pub const TIMING_COLUMNS: [&str; 5] = [
    "Student_ID",
    "Question_ID",
    "Student_Time",
    "Cohort_Time",
    "Time_Difference",
];

/// Build the three-sheet workbook.
pub fn build_workbook(result: &AnalysisResult) -> std::result::Result<Workbook, XlsxError> {
    let header = Format::new().set_bold();
    let mut workbook = Workbook::new();

    workbook.push_worksheet(cohort_sheet(result, &header)?);
    workbook.push_worksheet(student_sheet(result, &header)?);
    workbook.push_worksheet(timing_sheet(result, &header)?);

    Ok(workbook)
}

/// Render the workbook to bytes, e.g. for a download response.
pub fn export_to_buffer(result: &AnalysisResult) -> Result<Vec<u8>> {
    let target = Path::new("<buffer>");
    build_workbook(result)
        .and_then(|mut workbook| workbook.save_to_buffer())
        .map_err(|e| AnalysisError::export(target, e))
}

/// Write the workbook to `path`.
pub fn export_to_path(result: &AnalysisResult, path: &Path) -> Result<()> {
    let mut workbook = build_workbook(result).map_err(|e| AnalysisError::export(path, e))?;
    workbook
        .save(path)
        .map_err(|e| AnalysisError::export(path, e))?;

    debug!("Exported analysis to {}", path.display());
    Ok(())
}

fn write_header(
    sheet: &mut Worksheet,
    columns: &[&str],
    format: &Format,
) -> std::result::Result<(), XlsxError> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, format)?;
    }
    Ok(())
}

fn write_optional(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<f64>,
) -> std::result::Result<(), XlsxError> {
    if let Some(v) = value.filter(|v| v.is_finite()) {
        sheet.write_number(row, col, v)?;
    }
    Ok(())
}

/// One row per question, accuracy on a 0-100 scale.
fn cohort_sheet(
    result: &AnalysisResult,
    header: &Format,
) -> std::result::Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(COHORT_SHEET)?;
    write_header(&mut sheet, &COHORT_COLUMNS, header)?;

    for (i, question) in result.cohort.question_wise().iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &question.question_id)?;
        sheet.write_number(row, 1, question.accuracy * 100.0)?;
        sheet.write_number(row, 2, question.students_attempted as f64)?;
        sheet.write_string(row, 3, &question.question_text)?;
        sheet.write_boolean(row, 4, question.is_weak())?;
    }

    sheet.autofit();
    Ok(sheet)
}

/// One row per student.
fn student_sheet(
    result: &AnalysisResult,
    header: &Format,
) -> std::result::Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(STUDENT_SHEET)?;
    write_header(&mut sheet, &STUDENT_COLUMNS, header)?;

    for (i, student) in result.students.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &student.student_id)?;
        sheet.write_number(row, 1, student.overall_accuracy * 100.0)?;
        sheet.write_number(row, 2, student.weak_question_count() as f64)?;
        write_optional(&mut sheet, row, 3, student.total_attempts.map(|n| n as f64))?;
    }

    sheet.autofit();
    Ok(sheet)
}

/// Every (student, question) time comparison, flattened.
fn timing_sheet(
    result: &AnalysisResult,
    header: &Format,
) -> std::result::Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(TIMING_SHEET)?;
    write_header(&mut sheet, &TIMING_COLUMNS, header)?;

    let rows = result
        .students
        .iter()
        .flat_map(|s| s.time_comparison.iter().map(move |t| (s, t)));

    for (i, (student, timing)) in rows.enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &student.student_id)?;
        sheet.write_string(row, 1, &timing.question_id)?;
        write_optional(&mut sheet, row, 2, timing.student_time)?;
        write_optional(&mut sheet, row, 3, timing.cohort_time)?;
        write_optional(&mut sheet, row, 4, timing.difference)?;
    }

    sheet.autofit();
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_table;
    use crate::models::{AnswerStatus, ResponseRecord, ResponseTable};
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use std::io::Cursor;

    fn record(student: &str, question: &str, status: &str, time: f64) -> ResponseRecord {
        ResponseRecord {
            student_id: student.to_string(),
            question_id: question.to_string(),
            question_text: format!("Text {}", question),
            attempt_id: Some(2),
            answer_status: AnswerStatus::from(status),
            time_spent_seconds: Some(time),
        }
    }

    fn exported() -> Xlsx<Cursor<Vec<u8>>> {
        let table = ResponseTable::new(
            "test",
            vec![
                record("A", "q1", "Correct", 10.0),
                record("B", "q1", "Incorrect", 30.0),
                record("B", "q2", "Correct", 5.0),
            ],
        );
        let result = analyze_table(&table).unwrap();
        let bytes = export_to_buffer(&result).unwrap();
        open_workbook_from_rs(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_sheet_names() {
        let workbook = exported();
        assert_eq!(
            workbook.sheet_names(),
            vec![COHORT_SHEET, STUDENT_SHEET, TIMING_SHEET]
        );
    }

    #[test]
    fn test_cohort_sheet_contents() {
        let mut workbook = exported();
        let range = workbook.worksheet_range(COHORT_SHEET).unwrap();

        let header: Vec<String> = range
            .rows()
            .next()
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(header, COHORT_COLUMNS);

        assert_eq!(range.get((1, 0)), Some(&Data::String("q1".to_string())));
        assert_eq!(range.get((1, 1)), Some(&Data::Float(50.0)));
        assert_eq!(range.get((1, 4)), Some(&Data::Bool(true)));
        assert_eq!(range.get((2, 4)), Some(&Data::Bool(false)));
    }

    #[test]
    fn test_student_and_timing_rows() {
        let mut workbook = exported();

        let students = workbook.worksheet_range(STUDENT_SHEET).unwrap();
        assert_eq!(students.height(), 3);
        assert_eq!(students.get((2, 0)), Some(&Data::String("B".to_string())));
        assert_eq!(students.get((2, 1)), Some(&Data::Float(50.0)));
        assert_eq!(students.get((2, 3)), Some(&Data::Float(2.0)));

        let timing = workbook.worksheet_range(TIMING_SHEET).unwrap();
        // A:q1, B:q1, B:q2
        assert_eq!(timing.height(), 4);
        assert_eq!(timing.get((2, 4)), Some(&Data::Float(10.0)));
        assert_eq!(timing.get((3, 4)), Some(&Data::Float(0.0)));
    }
}
