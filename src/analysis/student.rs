//! Per-student diagnostics.

use super::aggregator::{
    correct_count, first_question_text, group_by_question, group_by_student, present_times,
};
use super::stats::{mean, ratio};
use crate::models::{
    CohortAnalysis, QuestionAccuracy, ResponseRecord, ResponseTable, StudentProfile,
    TimeComparison,
};
use tracing::debug;

/// Build a profile for every student observed in the table.
///
/// Students are returned in order of first appearance. Only students with
/// at least one row are reported.
pub fn analyze_students(table: &ResponseTable, cohort: &CohortAnalysis) -> Vec<StudentProfile> {
    let groups = group_by_student(table.groupable());
    debug!("Profiling {} students", groups.len());

    groups
        .into_iter()
        .map(|(student_id, rows)| profile_student(student_id, &rows, cohort))
        .collect()
}

/// Build the profile for one student's rows.
pub fn profile_student(
    student_id: &str,
    rows: &[&ResponseRecord],
    cohort: &CohortAnalysis,
) -> StudentProfile {
    let by_question = group_by_question(rows.iter().copied());

    let per_question = by_question
        .iter()
        .map(|(question_id, q_rows)| {
            let correct = correct_count(q_rows);
            QuestionAccuracy {
                question_id: question_id.to_string(),
                question_text: first_question_text(q_rows),
                accuracy: ratio(correct, q_rows.len()),
                correct,
                attempts: q_rows.len(),
            }
        })
        .collect();

    let time_comparison = by_question
        .iter()
        .map(|(question_id, q_rows)| compare_time(question_id, q_rows, cohort))
        .collect();

    StudentProfile {
        student_id: student_id.to_string(),
        overall_accuracy: ratio(correct_count(rows), rows.len()),
        total_rows: rows.len(),
        total_attempts: rows.iter().filter_map(|r| r.attempt_id).max(),
        per_question,
        time_comparison,
    }
}

fn compare_time(
    question_id: &str,
    rows: &[&ResponseRecord],
    cohort: &CohortAnalysis,
) -> TimeComparison {
    let student_time = mean(&present_times(rows));
    // No cohort timing for the question: compare the student with themself.
    let cohort_time = cohort
        .timing(question_id)
        .and_then(|t| t.mean)
        .or(student_time);

    let difference = match (student_time, cohort_time) {
        (Some(s), Some(c)) => Some(s - c),
        _ => None,
    };

    TimeComparison {
        question_id: question_id.to_string(),
        student_time,
        cohort_time,
        difference,
    }
}
