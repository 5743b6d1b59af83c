//! Data models for the learning-gap analysis.
//!
//! This module contains the input row types and the derived analysis
//! structures shared by the aggregators, the report generators, the JSON
//! value tree and the spreadsheet export.

use std::collections::HashMap;
use std::fmt;

/// Cohort-level weak-question bar: accuracy strictly below this is weak.
pub const COHORT_WEAK_THRESHOLD: f64 = 0.70;

/// Per-student weak-question bar, independent of the cohort bar.
pub const STUDENT_WEAK_THRESHOLD: f64 = 0.60;

/// Outcome recorded for a single answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    /// Any other non-blank status (e.g. "Skipped"), kept verbatim.
    Other(String),
    /// Blank cell.
    Missing,
}

impl AnswerStatus {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerStatus::Correct)
    }
}

impl fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerStatus::Correct => write!(f, "Correct"),
            AnswerStatus::Incorrect => write!(f, "Incorrect"),
            AnswerStatus::Other(s) => write!(f, "{}", s),
            AnswerStatus::Missing => Ok(()),
        }
    }
}

impl From<&str> for AnswerStatus {
    fn from(s: &str) -> Self {
        match s.trim() {
            "" => AnswerStatus::Missing,
            "Correct" => AnswerStatus::Correct,
            "Incorrect" => AnswerStatus::Incorrect,
            other => AnswerStatus::Other(other.to_string()),
        }
    }
}

/// One row of the input: a student's answer to a question in one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    /// Login ID. Blank when the cell was empty.
    pub student_id: String,
    /// Question ID. Blank when the cell was empty.
    pub question_id: String,
    pub question_text: String,
    /// Attempt number; `None` when the cell was missing or not an integer.
    pub attempt_id: Option<i64>,
    pub answer_status: AnswerStatus,
    /// Seconds spent; `None` when missing or non-numeric, never zero-filled.
    pub time_spent_seconds: Option<f64>,
}

impl ResponseRecord {
    /// Rows without both identifiers are not attributed to any student.
    pub fn is_groupable(&self) -> bool {
        !self.student_id.is_empty() && !self.question_id.is_empty()
    }
}

/// All rows loaded from one input, in sheet order.
#[derive(Debug, Clone)]
pub struct ResponseTable {
    source_name: String,
    records: Vec<ResponseRecord>,
}

impl ResponseTable {
    pub fn new(source_name: impl Into<String>, records: Vec<ResponseRecord>) -> Self {
        Self {
            source_name: source_name.into(),
            records,
        }
    }

    /// File path or caller-supplied name the rows came from.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows that can be grouped by both student and question.
    pub fn groupable(&self) -> impl Iterator<Item = &ResponseRecord> {
        self.records.iter().filter(|r| r.is_groupable())
    }

    /// Rows with a question id, whether or not a student is named.
    pub fn with_question(&self) -> impl Iterator<Item = &ResponseRecord> {
        self.records.iter().filter(|r| !r.question_id.is_empty())
    }
}

/// Time distribution for one question. Missing times are not counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation; `None` with fewer than 2 observations.
    pub std: Option<f64>,
    /// Number of rows that had a usable time.
    pub samples: usize,
}

/// Cohort statistics for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStats {
    pub question_id: String,
    pub question_text: String,
    /// Fraction of all rows for this question answered `Correct`.
    pub accuracy: f64,
    pub correct: usize,
    pub attempts: usize,
    /// Distinct students with at least one row for this question.
    pub students_attempted: usize,
    pub timing: TimingStats,
}

impl QuestionStats {
    pub fn is_weak(&self) -> bool {
        self.accuracy < COHORT_WEAK_THRESHOLD
    }
}

/// Cohort-wide analysis, questions in first-appearance order.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortAnalysis {
    question_wise: Vec<QuestionStats>,
    index: HashMap<String, usize>,
}

impl CohortAnalysis {
    pub fn new(question_wise: Vec<QuestionStats>) -> Self {
        let index = question_wise
            .iter()
            .enumerate()
            .map(|(i, q)| (q.question_id.clone(), i))
            .collect();
        Self {
            question_wise,
            index,
        }
    }

    pub fn question_wise(&self) -> &[QuestionStats] {
        &self.question_wise
    }

    pub fn question(&self, question_id: &str) -> Option<&QuestionStats> {
        self.index.get(question_id).map(|&i| &self.question_wise[i])
    }

    /// Timing table lookup used by the per-student comparison.
    pub fn timing(&self, question_id: &str) -> Option<&TimingStats> {
        self.question(question_id).map(|q| &q.timing)
    }

    pub fn time_analysis(&self) -> impl Iterator<Item = (&str, &TimingStats)> {
        self.question_wise
            .iter()
            .map(|q| (q.question_id.as_str(), &q.timing))
    }

    /// Questions below the cohort bar, derived on every call.
    pub fn weak_questions(&self) -> impl Iterator<Item = &QuestionStats> {
        self.question_wise.iter().filter(|q| q.is_weak())
    }
}

/// A student's accuracy on one question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionAccuracy {
    pub question_id: String,
    pub question_text: String,
    pub accuracy: f64,
    pub correct: usize,
    pub attempts: usize,
}

impl QuestionAccuracy {
    pub fn is_weak(&self) -> bool {
        self.accuracy < STUDENT_WEAK_THRESHOLD
    }
}

/// A student's mean time on a question against the cohort mean.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeComparison {
    pub question_id: String,
    pub student_time: Option<f64>,
    pub cohort_time: Option<f64>,
    /// `student_time - cohort_time`.
    pub difference: Option<f64>,
}

/// Diagnostics for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub student_id: String,
    pub overall_accuracy: f64,
    /// Rows attributed to this student.
    pub total_rows: usize,
    /// Highest attempt id seen, i.e. how many times the assessment was taken.
    pub total_attempts: Option<i64>,
    pub per_question: Vec<QuestionAccuracy>,
    pub time_comparison: Vec<TimeComparison>,
}

impl StudentProfile {
    pub fn weak_questions(&self) -> impl Iterator<Item = &QuestionAccuracy> {
        self.per_question.iter().filter(|q| q.is_weak())
    }

    pub fn weak_question_count(&self) -> usize {
        self.weak_questions().count()
    }
}

/// The complete output of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub cohort: CohortAnalysis,
    /// Students in first-appearance order.
    pub students: Vec<StudentProfile>,
}

impl AnalysisResult {
    pub fn student(&self, student_id: &str) -> Option<&StudentProfile> {
        self.students.iter().find(|s| s.student_id == student_id)
    }

    /// Mean of the students' overall accuracies.
    pub fn mean_student_accuracy(&self) -> Option<f64> {
        if self.students.is_empty() {
            return None;
        }
        let total: f64 = self.students.iter().map(|s| s.overall_accuracy).sum();
        Some(total / self.students.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, accuracy: f64) -> QuestionStats {
        QuestionStats {
            question_id: id.to_string(),
            question_text: format!("Question {}", id),
            accuracy,
            correct: 0,
            attempts: 0,
            students_attempted: 0,
            timing: TimingStats::default(),
        }
    }

    #[test]
    fn test_answer_status_from_str() {
        assert_eq!(AnswerStatus::from("Correct"), AnswerStatus::Correct);
        assert_eq!(AnswerStatus::from(" Correct "), AnswerStatus::Correct);
        assert_eq!(AnswerStatus::from("Incorrect"), AnswerStatus::Incorrect);
        assert_eq!(AnswerStatus::from(""), AnswerStatus::Missing);
        assert_eq!(
            AnswerStatus::from("correct"),
            AnswerStatus::Other("correct".to_string())
        );
        assert!(!AnswerStatus::from("Skipped").is_correct());
    }

    #[test]
    fn test_cohort_weak_boundary() {
        let cohort = CohortAnalysis::new(vec![
            question("1", 0.70),
            question("2", 0.6999),
            question("3", 1.0),
        ]);
        let weak: Vec<_> = cohort.weak_questions().map(|q| q.question_id.as_str()).collect();
        assert_eq!(weak, vec!["2"]);
    }

    #[test]
    fn test_cohort_lookup() {
        let cohort = CohortAnalysis::new(vec![question("10", 0.5), question("2", 0.9)]);
        assert_eq!(cohort.question("2").map(|q| q.accuracy), Some(0.9));
        assert!(cohort.timing("missing").is_none());
        let ids: Vec<_> = cohort.time_analysis().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["10", "2"]);
    }

    #[test]
    fn test_student_weak_boundary() {
        let entry = |id: &str, accuracy: f64| QuestionAccuracy {
            question_id: id.to_string(),
            question_text: String::new(),
            accuracy,
            correct: 0,
            attempts: 0,
        };
        let profile = StudentProfile {
            student_id: "s1".to_string(),
            overall_accuracy: 0.5,
            total_rows: 3,
            total_attempts: Some(1),
            per_question: vec![entry("a", 0.60), entry("b", 0.59), entry("c", 0.65)],
            time_comparison: Vec::new(),
        };
        assert_eq!(profile.weak_question_count(), 1);
    }

    #[test]
    fn test_groupable() {
        let mut record = ResponseRecord {
            student_id: "s1".to_string(),
            question_id: "q1".to_string(),
            question_text: String::new(),
            attempt_id: None,
            answer_status: AnswerStatus::Missing,
            time_spent_seconds: None,
        };
        assert!(record.is_groupable());
        record.question_id.clear();
        assert!(!record.is_groupable());
    }
}
