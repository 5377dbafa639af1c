//! Core records logic for the school examination store.
//! This crate is the single source of truth for the relational model and
//! its consistency rules.

pub mod backup;
pub mod config;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use backup::{export_students, StudentBackupRow, STUDENT_BACKUP_COLUMNS};
pub use config::StoreConfig;
pub use import::{
    import_exams, import_questions, import_records, import_students, import_tags,
    ImportFailure, ImportReport, ImportTarget,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::exam::{Exam, ExamPatch, NewExam};
pub use model::fields::{decode_fields, FieldMap};
pub use model::question::{NewQuestion, Question, QuestionPatch};
pub use model::student::{
    compute_age, ExamScore, NewStudent, QuestionLink, ScoreEntry, Student, StudentPatch,
};
pub use model::tag::{NewTag, Tag, TagPatch};
pub use model::{ExamId, QuestionId, StudentId, TagId, ValidationError};
pub use repo::{RepoError, RepoResult};
pub use service::records_service::{
    ErrorKind, Outcome, RecordsError, RecordsResult, RecordsService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
