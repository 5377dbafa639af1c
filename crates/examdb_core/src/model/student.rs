//! Student record, score/question links and age derivation.
//!
//! # Invariants
//! - `age` is always `today.year() - birth_date.year()` as of the last
//!   create/update; it is never edited directly.
//! - A student owns its `ExamScore` and `QuestionLink` rows; they never
//!   outlive the student.

use super::{
    overwrite, present, require_optional_text, require_text, ExamId, QuestionId, StudentId,
    ValidationError,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const ENTITY: &str = "student";

/// Computes student age from year components only.
///
/// Month and day are ignored on purpose: a student born in December counts a
/// full year older from January 1st.
pub fn compute_age(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    today.year() - birth_date.year()
}

/// Persisted student with its resolved association links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub age: i32,
    /// Score links ordered by exam id.
    pub exam_scores: Vec<ExamScore>,
    /// Question links ordered by question id.
    pub question_links: Vec<QuestionLink>,
}

/// One student's result for one exam. `score` stays `None` until recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamScore {
    pub exam_id: ExamId,
    pub exam_number: String,
    pub score: Option<i64>,
}

/// Link between a student and a question, resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionLink {
    pub question_id: QuestionId,
    pub question_number: String,
    pub section: Option<String>,
}

/// Score entry carried by student creation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreEntry {
    pub exam_id: ExamId,
    #[serde(default)]
    pub score: Option<i64>,
}

/// Create input for a student.
///
/// Score and question lists are pre-parsed by the import adapter; entries
/// pointing at missing exams/questions are skipped on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewStudent {
    pub name: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub exam_scores: Vec<ScoreEntry>,
    #[serde(default, alias = "exam_questions")]
    pub question_ids: Vec<QuestionId>,
}

impl NewStudent {
    pub fn new(name: impl Into<String>, birth_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            birth_date,
            exam_scores: Vec::new(),
            question_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(ENTITY, "name", &self.name)
    }
}

/// Sparse update for one student row identified by `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentPatch {
    pub id: StudentId,
    #[serde(default, deserialize_with = "present")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub birth_date: Option<NaiveDate>,
}

impl StudentPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_optional_text(ENTITY, "name", self.name.as_deref())
    }

    /// Applies supplied fields and recomputes age against `today`.
    pub fn apply(&self, student: &mut Student, today: NaiveDate) {
        overwrite(&mut student.name, &self.name);
        overwrite(&mut student.birth_date, &self.birth_date);
        student.age = compute_age(student.birth_date, today);
    }
}
