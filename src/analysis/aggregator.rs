//! Cohort aggregation and grouping.
//!
//! This module groups response rows by question across every student and
//! computes accuracy, reach and timing distributions per question.

use super::stats::{ratio, timing_stats};
use crate::models::{CohortAnalysis, QuestionStats, ResponseRecord, ResponseTable};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Group rows by a key, keeping groups in order of first appearance.
pub fn group_ordered<'a, I, F>(records: I, key: F) -> Vec<(&'a str, Vec<&'a ResponseRecord>)>
where
    I: IntoIterator<Item = &'a ResponseRecord>,
    F: Fn(&'a ResponseRecord) -> &'a str,
{
    let mut grouped: Vec<(&'a str, Vec<&'a ResponseRecord>)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for record in records {
        let k = key(record);
        match index.get(k) {
            Some(&i) => grouped[i].1.push(record),
            None => {
                index.insert(k, grouped.len());
                grouped.push((k, vec![record]));
            }
        }
    }

    grouped
}

/// Group rows by question id.
pub fn group_by_question<'a, I>(records: I) -> Vec<(&'a str, Vec<&'a ResponseRecord>)>
where
    I: IntoIterator<Item = &'a ResponseRecord>,
{
    group_ordered(records, |r| r.question_id.as_str())
}

/// Group rows by student id.
pub fn group_by_student<'a, I>(records: I) -> Vec<(&'a str, Vec<&'a ResponseRecord>)>
where
    I: IntoIterator<Item = &'a ResponseRecord>,
{
    group_ordered(records, |r| r.student_id.as_str())
}

/// First non-blank question text among the rows.
pub fn first_question_text(rows: &[&ResponseRecord]) -> String {
    rows.iter()
        .map(|r| r.question_text.as_str())
        .find(|t| !t.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Times present on the rows; missing cells are skipped.
pub fn present_times(rows: &[&ResponseRecord]) -> Vec<f64> {
    rows.iter().filter_map(|r| r.time_spent_seconds).collect()
}

/// Count of `Correct` rows.
pub fn correct_count(rows: &[&ResponseRecord]) -> usize {
    rows.iter().filter(|r| r.answer_status.is_correct()).count()
}

/// Compute cohort statistics for every question in the table.
pub fn aggregate_cohort(table: &ResponseTable) -> CohortAnalysis {
    let groups = group_by_question(table.with_question());
    debug!(
        "Aggregating {} questions from {}",
        groups.len(),
        table.source_name()
    );

    let question_wise = groups
        .into_iter()
        .filter(|(_, rows)| !rows.is_empty())
        .map(|(question_id, rows)| question_stats(question_id, &rows))
        .collect();

    CohortAnalysis::new(question_wise)
}

fn question_stats(question_id: &str, rows: &[&ResponseRecord]) -> QuestionStats {
    let correct = correct_count(rows);
    let students: HashSet<&str> = rows
        .iter()
        .map(|r| r.student_id.as_str())
        .filter(|s| !s.is_empty())
        .collect();

    QuestionStats {
        question_id: question_id.to_string(),
        question_text: first_question_text(rows),
        accuracy: ratio(correct, rows.len()),
        correct,
        attempts: rows.len(),
        students_attempted: students.len(),
        timing: timing_stats(&present_times(rows)),
    }
}
