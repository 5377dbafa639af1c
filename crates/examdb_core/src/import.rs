//! Batch application of imported records.
//!
//! # Responsibility
//! - Feed field maps produced by an external tabular reader into the
//!   records service one record at a time.
//! - Collect per-record failures without aborting the batch.
//!
//! # Invariants
//! - Each record is its own all-or-nothing write.
//! - Record indexes in the report are zero-based input positions.

use crate::model::fields::FieldMap;
use crate::service::records_service::{ErrorKind, Outcome, RecordsService};
use log::info;
use serde::Serialize;

/// One record that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub index: usize,
    pub kind: Option<ErrorKind>,
    pub message: String,
}

/// Summary of one batch import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub applied: usize,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, index: usize, outcome: Outcome) {
        if outcome.ok {
            self.applied += 1;
        } else {
            self.failures.push(ImportFailure {
                index,
                kind: outcome.kind,
                message: outcome.message,
            });
        }
    }
}

/// Which service operation a batch drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTarget {
    AddStudents,
    UpdateStudents,
    AddExams,
    UpdateExams,
    AddQuestions,
    UpdateQuestions,
    AddTags,
    UpdateTags,
}

impl ImportTarget {
    fn as_str(self) -> &'static str {
        match self {
            Self::AddStudents => "add_students",
            Self::UpdateStudents => "update_students",
            Self::AddExams => "add_exams",
            Self::UpdateExams => "update_exams",
            Self::AddQuestions => "add_questions",
            Self::UpdateQuestions => "update_questions",
            Self::AddTags => "add_tags",
            Self::UpdateTags => "update_tags",
        }
    }

    fn apply(self, service: &RecordsService, fields: &FieldMap) -> Outcome {
        match self {
            Self::AddStudents => service.add_student(fields),
            Self::UpdateStudents => service.update_student_fields(fields),
            Self::AddExams => service.add_exam(fields),
            Self::UpdateExams => service.update_exam_fields(fields),
            Self::AddQuestions => service.add_question(fields),
            Self::UpdateQuestions => service.update_question_fields(fields),
            Self::AddTags => service.add_tag(fields),
            Self::UpdateTags => service.update_tag_fields(fields),
        }
    }
}

/// Applies every record to `target`, continuing past failures.
pub fn import_records<I>(service: &RecordsService, target: ImportTarget, records: I) -> ImportReport
where
    I: IntoIterator<Item = FieldMap>,
{
    let mut report = ImportReport::default();
    for (index, fields) in records.into_iter().enumerate() {
        report.record(index, target.apply(service, &fields));
    }
    info!(
        "event=import_batch module=import target={} applied={} failed={}",
        target.as_str(),
        report.applied,
        report.failures.len()
    );
    report
}

pub fn import_students<I>(service: &RecordsService, records: I) -> ImportReport
where
    I: IntoIterator<Item = FieldMap>,
{
    import_records(service, ImportTarget::AddStudents, records)
}

pub fn import_exams<I>(service: &RecordsService, records: I) -> ImportReport
where
    I: IntoIterator<Item = FieldMap>,
{
    import_records(service, ImportTarget::AddExams, records)
}

pub fn import_questions<I>(service: &RecordsService, records: I) -> ImportReport
where
    I: IntoIterator<Item = FieldMap>,
{
    import_records(service, ImportTarget::AddQuestions, records)
}

pub fn import_tags<I>(service: &RecordsService, records: I) -> ImportReport
where
    I: IntoIterator<Item = FieldMap>,
{
    import_records(service, ImportTarget::AddTags, records)
}
