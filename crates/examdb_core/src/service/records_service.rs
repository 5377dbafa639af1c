//! Records use-case service.
//!
//! # Responsibility
//! - Own one store connection and route every operation through the
//!   per-entity repositories.
//! - Decode loosely typed field maps into typed inputs before any write.
//! - Report every mutation as a typed result or an `Outcome`, never a panic.
//!
//! # Invariants
//! - A failed mutation leaves persisted state unchanged.
//! - `list_*` never fails; read errors degrade to an empty collection.
//! - Logs carry ids and error kinds only, never record contents.

use crate::config::StoreConfig;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::exam::{Exam, ExamPatch, NewExam};
use crate::model::fields::{decode_fields, FieldMap};
use crate::model::question::{NewQuestion, Question, QuestionPatch};
use crate::model::student::{NewStudent, Student, StudentPatch};
use crate::model::tag::{NewTag, Tag, TagPatch};
use crate::model::{ExamId, QuestionId, StudentId, TagId, ValidationError};
use crate::repo::exam_repo::{ExamRepository, SqliteExamRepository};
use crate::repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
use crate::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::{RepoError, RepoResult};
use chrono::{Local, NaiveDate};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RecordsResult<T> = Result<T, RecordsError>;

/// Closed set of failure categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
        }
    }
}

/// Service error for records use-cases.
#[derive(Debug)]
pub enum RecordsError {
    /// Input was malformed; nothing was written.
    Validation(ValidationError),
    /// Lookup by id or natural key matched nothing.
    NotFound { entity: &'static str, key: String },
    /// Store failure; the transaction was rolled back.
    Storage(RepoError),
}

impl RecordsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl Display for RecordsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for RecordsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ValidationError> for RecordsError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for RecordsError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, key } => Self::NotFound { entity, key },
            other => Self::Storage(other),
        }
    }
}

impl From<DbError> for RecordsError {
    fn from(value: DbError) -> Self {
        Self::Storage(RepoError::Db(value))
    }
}

/// Success flag plus human-readable message for the field-map surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub ok: bool,
    pub message: String,
    /// Set when `ok == false`.
    pub kind: Option<ErrorKind>,
    /// Surrogate id created, updated or deleted, when known.
    pub id: Option<i64>,
}

impl Outcome {
    fn success(message: impl Into<String>, id: i64) -> Self {
        Self {
            ok: true,
            message: message.into(),
            kind: None,
            id: Some(id),
        }
    }

    fn failure(err: &RecordsError) -> Self {
        Self {
            ok: false,
            message: err.to_string(),
            kind: Some(err.kind()),
            id: None,
        }
    }
}

/// Records facade over one SQLite connection.
pub struct RecordsService {
    conn: Connection,
}

impl RecordsService {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (and if needed creates) the store described by `config`.
    pub fn open(config: &StoreConfig) -> RecordsResult<Self> {
        Ok(Self::new(open_db(&config.db_path)?))
    }

    pub fn open_in_memory() -> RecordsResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Raw connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn create_student(&self, student: &NewStudent) -> RecordsResult<StudentId> {
        let repo = SqliteStudentRepository::new(&self.conn);
        logged("create_student", repo.create_student(student, today()))
    }

    pub fn update_student(&self, patch: &StudentPatch) -> RecordsResult<()> {
        let repo = SqliteStudentRepository::new(&self.conn);
        logged(
            "update_student",
            repo.update_student(patch, today()).map(|()| patch.id),
        )?;
        Ok(())
    }

    /// Deletes the first student named `name` with all its links.
    pub fn delete_student_by_name(&self, name: &str) -> RecordsResult<StudentId> {
        let repo = SqliteStudentRepository::new(&self.conn);
        logged("delete_student", repo.delete_student_by_name(name))
    }

    pub fn get_student(&self, id: StudentId) -> RecordsResult<Option<Student>> {
        Ok(SqliteStudentRepository::new(&self.conn).get_student(id)?)
    }

    /// Records a score for an existing student/exam pair, replacing any
    /// previous score.
    pub fn set_exam_score(
        &self,
        student_id: StudentId,
        exam_id: ExamId,
        score: Option<i64>,
    ) -> RecordsResult<()> {
        let repo = SqliteStudentRepository::new(&self.conn);
        logged(
            "set_exam_score",
            repo.set_exam_score(student_id, exam_id, score).map(|()| student_id),
        )?;
        Ok(())
    }

    pub fn link_student_question(
        &self,
        student_id: StudentId,
        question_id: QuestionId,
    ) -> RecordsResult<()> {
        let repo = SqliteStudentRepository::new(&self.conn);
        logged(
            "link_student_question",
            repo.link_question(student_id, question_id).map(|()| student_id),
        )?;
        Ok(())
    }

    pub fn add_student(&self, fields: &FieldMap) -> Outcome {
        let result = decode_fields::<NewStudent>("student", fields)
            .map_err(RecordsError::from)
            .and_then(|student| self.create_student(&student));
        to_outcome(result, "student added")
    }

    pub fn update_student_fields(&self, fields: &FieldMap) -> Outcome {
        let result = decode_fields::<StudentPatch>("student", fields)
            .map_err(RecordsError::from)
            .and_then(|patch| self.update_student(&patch).map(|()| patch.id));
        to_outcome(result, "student updated")
    }

    pub fn delete_student(&self, name: &str) -> Outcome {
        to_outcome(self.delete_student_by_name(name), "student deleted")
    }

    pub fn list_students(&self) -> Vec<Student> {
        degrade("student", SqliteStudentRepository::new(&self.conn).list_students())
    }

    pub fn create_exam(&self, exam: &NewExam) -> RecordsResult<ExamId> {
        let repo = SqliteExamRepository::new(&self.conn);
        logged("create_exam", repo.create_exam(exam))
    }

    pub fn update_exam(&self, patch: &ExamPatch) -> RecordsResult<()> {
        let repo = SqliteExamRepository::new(&self.conn);
        logged("update_exam", repo.update_exam(patch).map(|()| patch.id))?;
        Ok(())
    }

    pub fn delete_exam_by_number(&self, exam_number: &str) -> RecordsResult<ExamId> {
        let repo = SqliteExamRepository::new(&self.conn);
        logged("delete_exam", repo.delete_exam_by_number(exam_number))
    }

    pub fn get_exam(&self, id: ExamId) -> RecordsResult<Option<Exam>> {
        Ok(SqliteExamRepository::new(&self.conn).get_exam(id)?)
    }

    /// Adds an exam; `student_ids`/`question_ids`/`tag_ids` must be integer
    /// lists or the whole call fails without writing.
    pub fn add_exam(&self, fields: &FieldMap) -> Outcome {
        let result = decode_fields::<NewExam>("exam", fields)
            .map_err(RecordsError::from)
            .and_then(|exam| self.create_exam(&exam));
        to_outcome(result, "exam added")
    }

    pub fn update_exam_fields(&self, fields: &FieldMap) -> Outcome {
        let result = decode_fields::<ExamPatch>("exam", fields)
            .map_err(RecordsError::from)
            .and_then(|patch| self.update_exam(&patch).map(|()| patch.id));
        to_outcome(result, "exam updated")
    }

    pub fn delete_exam(&self, exam_number: &str) -> Outcome {
        to_outcome(self.delete_exam_by_number(exam_number), "exam deleted")
    }

    pub fn list_exams(&self) -> Vec<Exam> {
        degrade("exam", SqliteExamRepository::new(&self.conn).list_exams())
    }

    pub fn create_question(&self, question: &NewQuestion) -> RecordsResult<QuestionId> {
        let repo = SqliteQuestionRepository::new(&self.conn);
        logged("create_question", repo.create_question(question))
    }

    pub fn update_question(&self, patch: &QuestionPatch) -> RecordsResult<()> {
        let repo = SqliteQuestionRepository::new(&self.conn);
        logged(
            "update_question",
            repo.update_question(patch).map(|()| patch.id),
        )?;
        Ok(())
    }

    pub fn delete_question_by_number(&self, question_number: &str) -> RecordsResult<QuestionId> {
        let repo = SqliteQuestionRepository::new(&self.conn);
        logged(
            "delete_question",
            repo.delete_question_by_number(question_number),
        )
    }

    pub fn get_question(&self, id: QuestionId) -> RecordsResult<Option<Question>> {
        Ok(SqliteQuestionRepository::new(&self.conn).get_question(id)?)
    }

    pub fn add_question(&self, fields: &FieldMap) -> Outcome {
        let result = decode_fields::<NewQuestion>("question", fields)
            .map_err(RecordsError::from)
            .and_then(|question| self.create_question(&question));
        to_outcome(result, "question added")
    }

    pub fn update_question_fields(&self, fields: &FieldMap) -> Outcome {
        let result = decode_fields::<QuestionPatch>("question", fields)
            .map_err(RecordsError::from)
            .and_then(|patch| self.update_question(&patch).map(|()| patch.id));
        to_outcome(result, "question updated")
    }

    pub fn delete_question(&self, question_number: &str) -> Outcome {
        to_outcome(
            self.delete_question_by_number(question_number),
            "question deleted",
        )
    }

    pub fn list_questions(&self) -> Vec<Question> {
        degrade(
            "question",
            SqliteQuestionRepository::new(&self.conn).list_questions(),
        )
    }

    pub fn create_tag(&self, tag: &NewTag) -> RecordsResult<TagId> {
        let repo = SqliteTagRepository::new(&self.conn);
        logged("create_tag", repo.create_tag(tag))
    }

    pub fn update_tag(&self, patch: &TagPatch) -> RecordsResult<()> {
        let repo = SqliteTagRepository::new(&self.conn);
        logged("update_tag", repo.update_tag(patch).map(|()| patch.id))?;
        Ok(())
    }

    pub fn delete_tag_by_content(&self, content: &str) -> RecordsResult<TagId> {
        let repo = SqliteTagRepository::new(&self.conn);
        logged("delete_tag", repo.delete_tag_by_content(content))
    }

    pub fn get_tag(&self, id: TagId) -> RecordsResult<Option<Tag>> {
        Ok(SqliteTagRepository::new(&self.conn).get_tag(id)?)
    }

    pub fn add_tag(&self, fields: &FieldMap) -> Outcome {
        let result = decode_fields::<NewTag>("tag", fields)
            .map_err(RecordsError::from)
            .and_then(|tag| self.create_tag(&tag));
        to_outcome(result, "tag added")
    }

    pub fn update_tag_fields(&self, fields: &FieldMap) -> Outcome {
        let result = decode_fields::<TagPatch>("tag", fields)
            .map_err(RecordsError::from)
            .and_then(|patch| self.update_tag(&patch).map(|()| patch.id));
        to_outcome(result, "tag updated")
    }

    pub fn delete_tag(&self, content: &str) -> Outcome {
        to_outcome(self.delete_tag_by_content(content), "tag deleted")
    }

    pub fn list_tags(&self) -> Vec<Tag> {
        degrade("tag", SqliteTagRepository::new(&self.conn).list_tags())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Emits one `record_write` event for a repository mutation.
fn logged(op: &'static str, result: RepoResult<i64>) -> RecordsResult<i64> {
    match result {
        Ok(id) => {
            info!(
                "event=record_write module=service op={} status=ok id={}",
                op, id
            );
            Ok(id)
        }
        Err(err) => {
            let err = RecordsError::from(err);
            warn!(
                "event=record_write module=service op={} status=error error_kind={}",
                op,
                err.kind().as_str()
            );
            Err(err)
        }
    }
}

fn degrade<T>(entity: &'static str, result: RepoResult<Vec<T>>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(err) => {
            warn!(
                "event=record_list module=service entity={} status=error error={}",
                entity, err
            );
            Vec::new()
        }
    }
}

fn to_outcome(result: RecordsResult<i64>, success_message: &str) -> Outcome {
    match result {
        Ok(id) => Outcome::success(success_message, id),
        Err(err) => Outcome::failure(&err),
    }
}
