//! School-records domain model.
//!
//! # Responsibility
//! - Define the persisted records (students, exams, questions, tags) and the
//!   association payloads linking them.
//! - Define typed create inputs and sparse patches decoded from field maps.
//!
//! # Invariants
//! - Every record is identified by a store-assigned surrogate id.
//! - Natural keys (student name, exam number, question number, tag content)
//!   are never blank.
//! - Deletion is physical; there is no tombstone state.

pub mod exam;
pub mod fields;
pub mod question;
pub mod student;
pub mod tag;

use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Surrogate id of a student row.
pub type StudentId = i64;
/// Surrogate id of an exam row.
pub type ExamId = i64;
/// Surrogate id of a question row.
pub type QuestionId = i64;
/// Surrogate id of a tag row.
pub type TagId = i64;

/// Input shape errors detected before any write begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required natural-key or name field is empty after trimming.
    BlankField {
        entity: &'static str,
        field: &'static str,
    },
    /// Field map could not be decoded into the entity's typed input.
    Malformed {
        entity: &'static str,
        message: String,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { entity, field } => {
                write!(f, "{entity} field `{field}` must not be blank")
            }
            Self::Malformed { entity, message } => {
                write!(f, "malformed {entity} fields: {message}")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { entity, field });
    }
    Ok(())
}

pub(crate) fn require_optional_text(
    entity: &'static str,
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => require_text(entity, field, value),
        None => Ok(()),
    }
}

/// Overwrites `target` only when the patch carries a value.
pub(crate) fn overwrite<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

/// Marks a patch key as supplied.
///
/// With `#[serde(default)]` an absent key stays `None`; a present key becomes
/// `Some`. For nullable columns (`Option<Option<T>>`) an explicit `null`
/// therefore decodes to `Some(None)` and clears the column. For required
/// columns (`Option<T>`) `null` fails to decode.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
