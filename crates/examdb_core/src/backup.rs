//! Flat row-per-student backup projection.
//!
//! # Responsibility
//! - Flatten students with their score and question links into tabular rows.
//! - Map a backup row back into an `add_student` field map.
//!
//! # Invariants
//! - `name`, `birth_date` and `age` survive export/re-import unchanged when
//!   re-imported in the same calendar year.
//! - List columns are JSON text; exam/question ids are not remapped on
//!   re-import, so links only resolve against the same store.

use crate::model::fields::FieldMap;
use crate::model::student::Student;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Column order of the student backup table.
pub const STUDENT_BACKUP_COLUMNS: [&str; 5] =
    ["name", "birth_date", "age", "exam_scores", "exam_questions"];

/// One student flattened for tabular export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentBackupRow {
    pub name: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    pub age: i32,
    /// JSON list of `{"exam_id": .., "score": ..}`.
    pub exam_scores: String,
    /// JSON list of question ids.
    pub exam_questions: String,
}

impl StudentBackupRow {
    pub fn from_student(student: &Student) -> Self {
        let scores: Vec<Value> = student
            .exam_scores
            .iter()
            .map(|score| json!({"exam_id": score.exam_id, "score": score.score}))
            .collect();
        let questions: Vec<i64> = student
            .question_links
            .iter()
            .map(|link| link.question_id)
            .collect();

        Self {
            name: student.name.clone(),
            birth_date: student.birth_date.format("%Y-%m-%d").to_string(),
            age: student.age,
            exam_scores: Value::from(scores).to_string(),
            exam_questions: Value::from(questions).to_string(),
        }
    }

    /// Cells in `STUDENT_BACKUP_COLUMNS` order.
    pub fn cells(&self) -> [String; 5] {
        [
            self.name.clone(),
            self.birth_date.clone(),
            self.age.to_string(),
            self.exam_scores.clone(),
            self.exam_questions.clone(),
        ]
    }

    /// Builds the field map `add_student` accepts. Age is dropped because it
    /// is always recomputed on write.
    ///
    /// List cells that are blank map to empty lists; cells that are not valid
    /// JSON are passed through as strings and fail validation downstream.
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), Value::from(self.name.clone()));
        fields.insert(
            "birth_date".to_string(),
            Value::from(self.birth_date.clone()),
        );
        fields.insert("exam_scores".to_string(), parse_list_cell(&self.exam_scores));
        fields.insert(
            "exam_questions".to_string(),
            parse_list_cell(&self.exam_questions),
        );
        fields
    }
}

/// Flattens every student, preserving input order.
pub fn export_students(students: &[Student]) -> Vec<StudentBackupRow> {
    students.iter().map(StudentBackupRow::from_student).collect()
}

fn parse_list_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Array(Vec::new());
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::from(trimmed))
}
