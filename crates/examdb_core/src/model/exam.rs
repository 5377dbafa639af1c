//! Exam record and its create/patch inputs.

use super::{
    overwrite, present, require_optional_text, require_text, ExamId, QuestionId,
    StudentId, TagId, ValidationError,
};
use serde::{Deserialize, Serialize};

const ENTITY: &str = "exam";

/// Persisted exam with its membership ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    /// Natural lookup key used by delete.
    pub exam_number: String,
    pub organization: Option<String>,
    /// Free-form text, never parsed as a date.
    pub time: Option<String>,
    pub paper_file: Option<String>,
    pub question_ids: Vec<QuestionId>,
    /// Students holding a score link to this exam.
    pub student_ids: Vec<StudentId>,
    pub tag_ids: Vec<TagId>,
}

/// Create input for an exam, optionally pre-populating associations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewExam {
    pub exam_number: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub paper_file: Option<String>,
    /// Each existing student receives an empty score link.
    #[serde(default)]
    pub student_ids: Vec<StudentId>,
    #[serde(default)]
    pub question_ids: Vec<QuestionId>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

impl NewExam {
    pub fn new(exam_number: impl Into<String>) -> Self {
        Self {
            exam_number: exam_number.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(ENTITY, "exam_number", &self.exam_number)
    }
}

/// Sparse update for one exam row identified by `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExamPatch {
    pub id: ExamId,
    #[serde(default, deserialize_with = "present")]
    pub exam_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub paper_file: Option<Option<String>>,
}

impl ExamPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_optional_text(ENTITY, "exam_number", self.exam_number.as_deref())
    }

    pub fn apply(&self, exam: &mut Exam) {
        overwrite(&mut exam.exam_number, &self.exam_number);
        overwrite(&mut exam.organization, &self.organization);
        overwrite(&mut exam.time, &self.time);
        overwrite(&mut exam.paper_file, &self.paper_file);
    }
}
