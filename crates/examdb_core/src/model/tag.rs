//! Tag record and its create/patch inputs.

use super::{
    overwrite, present, require_optional_text, require_text, ExamId, QuestionId, TagId,
    ValidationError,
};
use serde::{Deserialize, Serialize};

const ENTITY: &str = "tag";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    /// Natural lookup key used by delete. Stored as given (no case folding).
    pub content: String,
    pub question_ids: Vec<QuestionId>,
    pub exam_ids: Vec<ExamId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTag {
    pub content: String,
    #[serde(default)]
    pub question_ids: Vec<QuestionId>,
    #[serde(default)]
    pub exam_ids: Vec<ExamId>,
}

impl NewTag {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(ENTITY, "content", &self.content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagPatch {
    pub id: TagId,
    #[serde(default, deserialize_with = "present")]
    pub content: Option<String>,
}

impl TagPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_optional_text(ENTITY, "content", self.content.as_deref())
    }

    pub fn apply(&self, tag: &mut Tag) {
        overwrite(&mut tag.content, &self.content);
    }
}
