//! Field-map decoding for the loosely typed caller surface.
//!
//! # Responsibility
//! - Turn `name -> value` maps from forms and import adapters into the typed
//!   create inputs and patches.
//!
//! # Invariants
//! - Unknown keys, wrong value types and non-list association fields are
//!   rejected as `ValidationError::Malformed`.
//! - Decoding never touches storage.

use super::ValidationError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Loosely typed record as supplied by forms and import adapters.
pub type FieldMap = serde_json::Map<String, Value>;

/// Decodes a field map into `T`, reporting failures against `entity`.
pub fn decode_fields<T: DeserializeOwned>(
    entity: &'static str,
    fields: &FieldMap,
) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(fields.clone())).map_err(|err| {
        ValidationError::Malformed {
            entity,
            message: err.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_fields, FieldMap};
    use crate::model::exam::{ExamPatch, NewExam};
    use crate::model::student::NewStudent;
    use crate::model::ValidationError;
    use serde_json::json;

    fn map(value: serde_json::Value) -> FieldMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn student_fields_accept_import_aliases() {
        let student: NewStudent = decode_fields(
            "student",
            &map(json!({
                "name": "Zhang San",
                "birth_date": "2010-09-01",
                "exam_scores": [{"exam_id": 3, "score": 88}],
                "exam_questions": [4, 5]
            })),
        )
        .unwrap();
        assert_eq!(student.question_ids, vec![4, 5]);
        assert_eq!(student.exam_scores[0].score, Some(88));
    }

    #[test]
    fn non_list_student_ids_are_rejected() {
        let err = decode_fields::<NewExam>(
            "exam",
            &map(json!({"exam_number": "E-1", "student_ids": 12})),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::Malformed { entity: "exam", .. }));
    }

    #[test]
    fn non_integer_question_ids_are_rejected() {
        let err = decode_fields::<NewExam>(
            "exam",
            &map(json!({"exam_number": "E-1", "question_ids": [1, "two"]})),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::Malformed { .. }));
    }

    #[test]
    fn patch_rejects_unknown_keys() {
        let err = decode_fields::<ExamPatch>(
            "exam",
            &map(json!({"id": 1, "room": "B12"})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("room"));
    }

    #[test]
    fn patch_requires_id() {
        let err = decode_fields::<ExamPatch>("exam", &map(json!({"organization": "PTA"})))
            .unwrap_err();
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn patch_tells_absent_keys_from_null() {
        let patch: ExamPatch = decode_fields(
            "exam",
            &map(json!({"id": 1, "organization": null, "time": "week 3"})),
        )
        .unwrap();
        assert_eq!(patch.organization, Some(None));
        assert_eq!(patch.time, Some(Some("week 3".to_string())));
        assert_eq!(patch.paper_file, None);
        assert_eq!(patch.exam_number, None);
    }

    #[test]
    fn patch_rejects_null_for_required_fields() {
        let err = decode_fields::<ExamPatch>("exam", &map(json!({"id": 1, "exam_number": null})))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Malformed { entity: "exam", .. }));
    }
}
