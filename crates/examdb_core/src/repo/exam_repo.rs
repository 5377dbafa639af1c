//! Exam repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist exams together with their initial student, question and tag
//!   associations.
//! - Cascade-delete an exam's score links and memberships.
//!
//! # Invariants
//! - Deleting an exam never deletes the questions it contained.
//! - Membership is symmetric: an exam listed on a question is the same
//!   `exam_questions` row the exam lists.

use super::student_repo::upsert_score;
use super::{
    delete_links, existing_ids, first_id_by_key, immediate_tx, insert_memberships, load_link_ids,
    RepoError, RepoResult, Table,
};
use crate::model::exam::{Exam, ExamPatch, NewExam};
use crate::model::ExamId;
use log::debug;
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "exam";
const EXAM_SELECT_SQL: &str = "SELECT id, exam_number, organization, time, paper_file FROM exams";

pub trait ExamRepository {
    /// Inserts an exam; unknown student/question/tag ids are skipped.
    fn create_exam(&self, exam: &NewExam) -> RepoResult<ExamId>;
    fn update_exam(&self, patch: &ExamPatch) -> RepoResult<()>;
    /// Deletes the first exam with `exam_number` plus its links.
    fn delete_exam_by_number(&self, exam_number: &str) -> RepoResult<ExamId>;
    fn get_exam(&self, id: ExamId) -> RepoResult<Option<Exam>>;
    fn list_exams(&self) -> RepoResult<Vec<Exam>>;
}

pub struct SqliteExamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExamRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ExamRepository for SqliteExamRepository<'_> {
    fn create_exam(&self, exam: &NewExam) -> RepoResult<ExamId> {
        exam.validate()?;

        let tx = immediate_tx(self.conn)?;
        tx.execute(
            "INSERT INTO exams (exam_number, organization, time, paper_file)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                exam.exam_number.as_str(),
                exam.organization.as_deref(),
                exam.time.as_deref(),
                exam.paper_file.as_deref(),
            ],
        )?;
        let exam_id = tx.last_insert_rowid();

        for student_id in existing_ids(&tx, Table::Students, &exam.student_ids)? {
            upsert_score(&tx, student_id, exam_id, None)?;
        }

        let question_ids = existing_ids(&tx, Table::Questions, &exam.question_ids)?;
        insert_memberships(
            &tx,
            "exam_questions",
            "exam_id",
            exam_id,
            "question_id",
            &question_ids,
        )?;

        let tag_ids = existing_ids(&tx, Table::Tags, &exam.tag_ids)?;
        for tag_id in tag_ids {
            insert_memberships(&tx, "exam_tags", "tag_id", tag_id, "exam_id", &[exam_id])?;
        }

        tx.commit()?;
        Ok(exam_id)
    }

    fn update_exam(&self, patch: &ExamPatch) -> RepoResult<()> {
        patch.validate()?;

        let tx = immediate_tx(self.conn)?;
        let mut exam = load_exam_row(&tx, patch.id)?
            .ok_or_else(|| RepoError::not_found_id(ENTITY, patch.id))?;
        patch.apply(&mut exam);

        tx.execute(
            "UPDATE exams
             SET exam_number = ?2, organization = ?3, time = ?4, paper_file = ?5
             WHERE id = ?1;",
            params![
                exam.id,
                exam.exam_number.as_str(),
                exam.organization.as_deref(),
                exam.time.as_deref(),
                exam.paper_file.as_deref(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_exam_by_number(&self, exam_number: &str) -> RepoResult<ExamId> {
        let tx = immediate_tx(self.conn)?;
        let exam_id = first_id_by_key(&tx, Table::Exams, "exam_number", exam_number)?
            .ok_or_else(|| RepoError::not_found_key(ENTITY, "exam_number", exam_number))?;

        let scores = delete_links(&tx, "student_exam_scores", "exam_id", exam_id)?;
        let questions = delete_links(&tx, "exam_questions", "exam_id", exam_id)?;
        let tags = delete_links(&tx, "exam_tags", "exam_id", exam_id)?;
        tx.execute("DELETE FROM exams WHERE id = ?1;", [exam_id])?;
        tx.commit()?;

        debug!(
            "event=cascade_delete module=repo entity=exam id={} score_links={} question_links={} tag_links={}",
            exam_id, scores, questions, tags
        );
        Ok(exam_id)
    }

    fn get_exam(&self, id: ExamId) -> RepoResult<Option<Exam>> {
        match load_exam_row(self.conn, id)? {
            Some(exam) => Ok(Some(with_memberships(self.conn, exam)?)),
            None => Ok(None),
        }
    }

    fn list_exams(&self) -> RepoResult<Vec<Exam>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EXAM_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut exams = Vec::new();
        while let Some(row) = rows.next()? {
            let exam = parse_exam_row(row)?;
            exams.push(with_memberships(self.conn, exam)?);
        }
        Ok(exams)
    }
}

fn load_exam_row(conn: &Connection, id: ExamId) -> RepoResult<Option<Exam>> {
    let mut stmt = conn.prepare(&format!("{EXAM_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_exam_row(row)?));
    }
    Ok(None)
}

fn parse_exam_row(row: &Row<'_>) -> RepoResult<Exam> {
    Ok(Exam {
        id: row.get("id")?,
        exam_number: row.get("exam_number")?,
        organization: row.get("organization")?,
        time: row.get("time")?,
        paper_file: row.get("paper_file")?,
        question_ids: Vec::new(),
        student_ids: Vec::new(),
        tag_ids: Vec::new(),
    })
}

fn with_memberships(conn: &Connection, mut exam: Exam) -> RepoResult<Exam> {
    exam.question_ids = load_link_ids(conn, "exam_questions", "exam_id", "question_id", exam.id)?;
    exam.student_ids =
        load_link_ids(conn, "student_exam_scores", "exam_id", "student_id", exam.id)?;
    exam.tag_ids = load_link_ids(conn, "exam_tags", "exam_id", "tag_id", exam.id)?;
    Ok(exam)
}
