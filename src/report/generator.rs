//! Text report generation.
//!
//! This module renders the cohort summary and the per-student reports as
//! plain text, ranking the highlights a facilitator should look at first.

use crate::analysis::stats::quantile;
use crate::models::{AnalysisResult, QuestionStats, StudentProfile};

/// Question text length in the cohort weak-question list.
pub const COHORT_TEXT_LIMIT: usize = 100;

/// Question text length in the slow-question list and student reports.
pub const DETAIL_TEXT_LIMIT: usize = 80;

/// Questions with a mean time above this percentile are "slow".
pub const SLOW_QUESTION_PERCENTILE: f64 = 0.75;

/// Seconds a student must differ from the cohort mean to be flagged.
pub const TIME_DIFFERENCE_THRESHOLD: f64 = 10.0;

/// Timing issues shown per student.
pub const MAX_TIMING_ISSUES: usize = 3;

const SEPARATOR_WIDTH: usize = 80;

/// A flagged per-question time difference.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingIssue<'a> {
    pub question_id: &'a str,
    pub slower: bool,
    pub magnitude: f64,
}

impl TimingIssue<'_> {
    pub fn label(&self) -> &'static str {
        if self.slower {
            "⬆️ Much slower"
        } else {
            "⬇️ Much faster"
        }
    }
}

/// Cohort report followed by every selected student report.
pub fn generate_full_report(result: &AnalysisResult, top_n: Option<usize>) -> String {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    let mut output = generate_cohort_report(result);
    output.push_str(&format!("\n\n{}\n\n", separator));

    for (i, report) in generate_student_reports(result, top_n).iter().enumerate() {
        output.push_str(&format!("STUDENT REPORT {}:\n", i + 1));
        output.push_str(report);
        output.push_str(&format!("\n\n{}\n\n", separator));
    }

    output
}

/// Generate the cohort-level report.
pub fn generate_cohort_report(result: &AnalysisResult) -> String {
    let cohort = &result.cohort;
    let mut lines = Vec::new();

    lines.push("=== COHORT LEARNING GAPS ANALYSIS ===".to_string());
    lines.push(format!("Total Students: {}", result.students.len()));
    lines.push(format!("Total Questions: {}", cohort.question_wise().len()));
    if let Some(mean) = result.mean_student_accuracy() {
        lines.push(format!("Average Student Accuracy: {:.1}%", mean * 100.0));
    }
    lines.push(String::new());

    let weak: Vec<_> = cohort.weak_questions().collect();
    if !weak.is_empty() {
        lines.push("🚨 WEAKEST QUESTIONS (Class Accuracy < 70%):".to_string());
        for question in weak {
            lines.push(format!(
                "   Question {}: {:.1}% correct",
                question.question_id,
                question.accuracy * 100.0
            ));
            lines.push(format!(
                "      '{}'",
                truncate(&question.question_text, COHORT_TEXT_LIMIT)
            ));
        }
        lines.push(String::new());
    }

    lines.push("⏱️ TIME ANALYSIS (Questions taking significantly longer):".to_string());
    for question in slow_questions(result) {
        if let Some(mean) = question.timing.mean {
            lines.push(format!(
                "   Question {}: {:.1} seconds - '{}'",
                question.question_id,
                mean,
                truncate(&question.question_text, DETAIL_TEXT_LIMIT)
            ));
        }
    }

    lines.join("\n")
}

/// Generate one report per student, lowest accuracy first.
///
/// `top_n` caps the number of reports; `None` reports every student.
pub fn generate_student_reports(result: &AnalysisResult, top_n: Option<usize>) -> Vec<String> {
    let mut students: Vec<&StudentProfile> = result.students.iter().collect();
    // Stable: ties keep first-appearance order.
    students.sort_by(|a, b| a.overall_accuracy.total_cmp(&b.overall_accuracy));

    if let Some(n) = top_n {
        students.truncate(n);
    }

    students.into_iter().map(generate_student_report).collect()
}

/// Generate the report for a single student.
pub fn generate_student_report(student: &StudentProfile) -> String {
    let mut lines = Vec::new();

    lines.push(format!("=== STUDENT: {} ===", student.student_id));
    lines.push(format!(
        "Overall Accuracy: {:.1}%",
        student.overall_accuracy * 100.0
    ));
    lines.push(format!(
        "Total Attempts: {}",
        student
            .total_attempts
            .map(|n| n.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    ));
    lines.push(String::new());

    let weak: Vec<_> = student.weak_questions().collect();
    if !weak.is_empty() {
        lines.push("❌ WEAK QUESTIONS:".to_string());
        for question in weak {
            lines.push(format!(
                "   Question {}: {:.1}% correct",
                question.question_id,
                question.accuracy * 100.0
            ));
            lines.push(format!(
                "      '{}'",
                truncate(&question.question_text, DETAIL_TEXT_LIMIT)
            ));
        }
        lines.push(String::new());
    }

    lines.push("⏰ TIME SPENT (vs Class Average):".to_string());
    for issue in timing_issues(student) {
        lines.push(format!(
            "   Question {}: {} ({:.1}s difference)",
            issue.question_id,
            issue.label(),
            issue.magnitude
        ));
    }

    lines.join("\n")
}

/// Questions whose mean time exceeds the slow percentile of all means.
pub fn slow_questions(result: &AnalysisResult) -> Vec<&QuestionStats> {
    let questions = result.cohort.question_wise();
    let means: Vec<f64> = questions.iter().filter_map(|q| q.timing.mean).collect();

    let Some(threshold) = quantile(&means, SLOW_QUESTION_PERCENTILE) else {
        return Vec::new();
    };

    questions
        .iter()
        .filter(|q| q.timing.mean.is_some_and(|m| m > threshold))
        .collect()
}

/// The largest time differences above the threshold, biggest first.
pub fn timing_issues(student: &StudentProfile) -> Vec<TimingIssue<'_>> {
    let mut issues: Vec<TimingIssue<'_>> = student
        .time_comparison
        .iter()
        .filter_map(|t| {
            let diff = t.difference?;
            (diff.abs() > TIME_DIFFERENCE_THRESHOLD).then(|| TimingIssue {
                question_id: &t.question_id,
                slower: diff > 0.0,
                magnitude: diff.abs(),
            })
        })
        .collect();

    issues.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    issues.truncate(MAX_TIMING_ISSUES);
    issues
}

/// Cut text to `limit` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let cut: String = text.chars().take(limit).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
