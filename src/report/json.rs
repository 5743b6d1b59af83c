//! JSON value tree for API consumers.
//!
//! The analysis result is converted into a [`serde_json::Value`] made of
//! string-keyed objects, arrays and primitive scalars only. Missing or
//! non-finite optional numbers become `null`; a required number that is
//! not finite, or two entries colliding on the same key, is an error.
//! Encoded output is decoded again and compared before it is returned.

use crate::error::{AnalysisError, Result};
use crate::models::{AnalysisResult, QuestionStats, StudentProfile};
use serde_json::{json, Map, Number, Value};
use std::fmt::Display;

/// Relative tolerance used when comparing floats after a round trip.
const FLOAT_TOLERANCE: f64 = 1e-9;

/// Build the value tree for a complete analysis.
pub fn to_value_tree(result: &AnalysisResult) -> Result<Value> {
    let cohort = &result.cohort;

    let mut question_wise = Map::new();
    for question in cohort.question_wise() {
        insert_unique(
            &mut question_wise,
            "cohort.question_wise",
            &question.question_id,
            question_entry(question)?,
        )?;
    }

    let mut time_analysis = Map::new();
    for (question_id, timing) in cohort.time_analysis() {
        insert_unique(
            &mut time_analysis,
            "cohort.time_analysis",
            question_id,
            json!({
                "mean": optional_number(timing.mean),
                "median": optional_number(timing.median),
                "std": optional_number(timing.std),
            }),
        )?;
    }

    let mut weak_questions = Map::new();
    for question in cohort.weak_questions() {
        insert_unique(
            &mut weak_questions,
            "cohort.weak_questions",
            &question.question_id,
            question_entry(question)?,
        )?;
    }

    let mut students = Map::new();
    for student in &result.students {
        insert_unique(
            &mut students,
            "students",
            &student.student_id,
            student_entry(student)?,
        )?;
    }

    Ok(json!({
        "cohort": {
            "question_wise": question_wise,
            "time_analysis": time_analysis,
            "weak_questions": weak_questions,
        },
        "students": students,
    }))
}

fn question_entry(question: &QuestionStats) -> Result<Value> {
    let path = format!("cohort.question_wise.{}", question.question_id);
    Ok(json!({
        "Accuracy": required_number(&path, question.accuracy)?,
        "Students Attempted": question.students_attempted,
        "Question Text": question.question_text,
    }))
}

fn student_entry(student: &StudentProfile) -> Result<Value> {
    let path = format!("students.{}", student.student_id);

    let mut weak_questions = Map::new();
    for question in student.weak_questions() {
        let entry = json!({
            "Accuracy": required_number(&path, question.accuracy)?,
            "Question Text": question.question_text,
        });
        insert_unique(&mut weak_questions, &path, &question.question_id, entry)?;
    }

    let mut time_comparison = Map::new();
    for comparison in &student.time_comparison {
        let entry = json!({
            "student_time": optional_number(comparison.student_time),
            "cohort_time": optional_number(comparison.cohort_time),
            "difference": optional_number(comparison.difference),
        });
        insert_unique(&mut time_comparison, &path, &comparison.question_id, entry)?;
    }

    Ok(json!({
        "overall_accuracy": required_number(&path, student.overall_accuracy)?,
        "weak_questions": weak_questions,
        "time_comparison": time_comparison,
        "total_attempts": student.total_attempts,
    }))
}

fn insert_unique(map: &mut Map<String, Value>, path: &str, key: &str, value: Value) -> Result<()> {
    if map.insert(key.to_string(), value).is_some() {
        return Err(AnalysisError::serialization(
            path,
            format!("duplicate key '{}'", key),
        ));
    }
    Ok(())
}

fn optional_number(value: Option<f64>) -> Value {
    value
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn required_number(path: &str, value: f64) -> Result<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| AnalysisError::serialization(path, format!("non-finite value {}", value)))
}

/// Encode the analysis as pretty JSON, verifying it decodes back intact.
pub fn encode(result: &AnalysisResult) -> Result<String> {
    encode_value(&to_value_tree(result)?)
}

/// Encode any value tree, verifying it decodes back intact.
pub fn encode_value(tree: &Value) -> Result<String> {
    let text = serde_json::to_string_pretty(tree)
        .map_err(|e| AnalysisError::serialization("$", e))?;
    let decoded = decode(&text)?;

    if !equivalent(tree, &decoded) {
        return Err(AnalysisError::serialization(
            "$",
            "value changed after a JSON round trip",
        ));
    }
    Ok(text)
}

pub fn decode(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| AnalysisError::serialization("$", e))
}

/// `{"success": true, "data": ...}`
pub fn success_envelope(result: &AnalysisResult) -> Result<Value> {
    Ok(json!({
        "success": true,
        "data": to_value_tree(result)?,
    }))
}

/// `{"success": false, "error": ...}`
pub fn failure_envelope(error: &impl Display) -> Value {
    json!({
        "success": false,
        "error": format!("Analysis failed: {}", error),
    })
}

/// Envelope for an analysis outcome; never fails.
pub fn envelope(outcome: &Result<AnalysisResult>) -> Value {
    match outcome {
        Ok(result) => success_envelope(result).unwrap_or_else(|e| failure_envelope(&e)),
        Err(e) => failure_envelope(e),
    }
}

/// Structural equality with tolerant float comparison.
pub fn equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => match (x.as_f64(), y.as_f64()) {
                (Some(f), Some(g)) => {
                    (f - g).abs() <= FLOAT_TOLERANCE * f.abs().max(g.abs()).max(1.0)
                }
                _ => false,
            },
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| equivalent(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| equivalent(x, y)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_table;
    use crate::models::{AnswerStatus, CohortAnalysis, ResponseRecord, ResponseTable, TimingStats};

    fn record(student: &str, question: &str, status: &str, time: Option<f64>) -> ResponseRecord {
        ResponseRecord {
            student_id: student.to_string(),
            question_id: question.to_string(),
            question_text: format!("Text {}", question),
            attempt_id: Some(1),
            answer_status: AnswerStatus::from(status),
            time_spent_seconds: time,
        }
    }

    fn create_test_result() -> AnalysisResult {
        let table = ResponseTable::new(
            "test",
            vec![
                record("101", "7", "Correct", Some(10.0)),
                record("102", "7", "Incorrect", Some(30.0)),
                record("102", "8", "Correct", None),
            ],
        );
        analyze_table(&table).unwrap()
    }

    #[test]
    fn test_value_tree_shape() {
        let tree = to_value_tree(&create_test_result()).unwrap();

        let q7 = &tree["cohort"]["question_wise"]["7"];
        assert_eq!(q7["Accuracy"], json!(0.5));
        assert_eq!(q7["Students Attempted"], json!(2));
        assert_eq!(q7["Question Text"], json!("Text 7"));

        assert_eq!(tree["cohort"]["time_analysis"]["7"]["mean"], json!(20.0));
        assert!(tree["cohort"]["weak_questions"].get("7").is_some());
        assert!(tree["cohort"]["weak_questions"].get("8").is_none());

        let s102 = &tree["students"]["102"];
        assert_eq!(s102["overall_accuracy"], json!(0.5));
        assert_eq!(s102["total_attempts"], json!(1));
        assert_eq!(s102["time_comparison"]["7"]["difference"], json!(10.0));
    }

    #[test]
    fn test_missing_numbers_become_null() {
        let tree = to_value_tree(&create_test_result()).unwrap();

        let q8 = &tree["cohort"]["time_analysis"]["8"];
        assert!(q8["mean"].is_null());
        assert!(q8["std"].is_null());
        assert!(tree["cohort"]["time_analysis"]["7"]["std"].is_number());
        assert!(tree["students"]["102"]["time_comparison"]["8"]["difference"].is_null());
    }

    #[test]
    fn test_non_finite_required_number_fails() {
        let cohort = CohortAnalysis::new(vec![QuestionStats {
            question_id: "q".to_string(),
            question_text: String::new(),
            accuracy: f64::NAN,
            correct: 0,
            attempts: 0,
            students_attempted: 0,
            timing: TimingStats::default(),
        }]);
        let result = AnalysisResult {
            cohort,
            students: Vec::new(),
        };

        let err = to_value_tree(&result).unwrap_err();
        assert!(matches!(err, AnalysisError::Serialization { .. }));
    }

    #[test]
    fn test_encode_round_trip() {
        let result = create_test_result();
        let tree = to_value_tree(&result).unwrap();
        let text = encode(&result).unwrap();
        assert!(equivalent(&tree, &decode(&text).unwrap()));
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn test_envelopes() {
        let ok = envelope(&Ok(create_test_result()));
        assert_eq!(ok["success"], json!(true));
        assert!(ok["data"]["cohort"].is_object());

        let err: Result<AnalysisResult> = Err(AnalysisError::EmptyDataset {
            source_name: "x.xlsx".to_string(),
        });
        let failed = envelope(&err);
        assert_eq!(failed["success"], json!(false));
        assert!(failed["error"].as_str().unwrap().contains("x.xlsx"));
    }

    #[test]
    fn test_equivalent_tolerates_float_noise() {
        assert!(equivalent(&json!({"a": 0.1 + 0.2}), &json!({"a": 0.3})));
        assert!(!equivalent(&json!({"a": 1.0}), &json!({"a": 1.1})));
        assert!(!equivalent(&json!({"a": 1}), &json!({"b": 1})));
    }
}
