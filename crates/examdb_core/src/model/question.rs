//! Question record and its create/patch inputs.

use super::{
    overwrite, present, require_optional_text, require_text, ExamId, QuestionId,
    StudentId, TagId, ValidationError,
};
use serde::{Deserialize, Serialize};

const ENTITY: &str = "question";

/// Persisted question with its membership ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// Natural lookup key used by delete.
    pub question_number: String,
    pub section: Option<String>,
    pub difficulty: Option<String>,
    /// Illustration path; loading the image is the caller's concern.
    pub image_path: Option<String>,
    pub content: Option<String>,
    /// Source file reference.
    pub file: Option<String>,
    /// Free-text note about related questions.
    pub related_questions: Option<String>,
    pub exam_ids: Vec<ExamId>,
    pub student_ids: Vec<StudentId>,
    pub tag_ids: Vec<TagId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewQuestion {
    pub question_number: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub related_questions: Option<String>,
    #[serde(default)]
    pub exam_ids: Vec<ExamId>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

impl NewQuestion {
    pub fn new(question_number: impl Into<String>) -> Self {
        Self {
            question_number: question_number.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(ENTITY, "question_number", &self.question_number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionPatch {
    pub id: QuestionId,
    #[serde(default, deserialize_with = "present")]
    pub question_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub section: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub difficulty: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_path: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub file: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub related_questions: Option<Option<String>>,
}

impl QuestionPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_optional_text(ENTITY, "question_number", self.question_number.as_deref())
    }

    pub fn apply(&self, question: &mut Question) {
        overwrite(&mut question.question_number, &self.question_number);
        overwrite(&mut question.section, &self.section);
        overwrite(&mut question.difficulty, &self.difficulty);
        overwrite(&mut question.image_path, &self.image_path);
        overwrite(&mut question.content, &self.content);
        overwrite(&mut question.file, &self.file);
        overwrite(&mut question.related_questions, &self.related_questions);
    }
}
