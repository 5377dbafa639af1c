//! Question repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist questions with their initial exam and tag memberships.
//! - Cascade-delete a question's student links and memberships.

use super::{
    delete_links, existing_ids, first_id_by_key, immediate_tx, insert_memberships, load_link_ids,
    RepoError, RepoResult, Table,
};
use crate::model::question::{NewQuestion, Question, QuestionPatch};
use crate::model::QuestionId;
use log::debug;
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "question";
const QUESTION_SELECT_SQL: &str = "SELECT
    id,
    question_number,
    section,
    difficulty,
    image_path,
    content,
    file,
    related_questions
FROM questions";

pub trait QuestionRepository {
    fn create_question(&self, question: &NewQuestion) -> RepoResult<QuestionId>;
    fn update_question(&self, patch: &QuestionPatch) -> RepoResult<()>;
    fn delete_question_by_number(&self, question_number: &str) -> RepoResult<QuestionId>;
    fn get_question(&self, id: QuestionId) -> RepoResult<Option<Question>>;
    fn list_questions(&self) -> RepoResult<Vec<Question>>;
}

pub struct SqliteQuestionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl QuestionRepository for SqliteQuestionRepository<'_> {
    fn create_question(&self, question: &NewQuestion) -> RepoResult<QuestionId> {
        question.validate()?;

        let tx = immediate_tx(self.conn)?;
        tx.execute(
            "INSERT INTO questions (
                question_number,
                section,
                difficulty,
                image_path,
                content,
                file,
                related_questions
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                question.question_number.as_str(),
                question.section.as_deref(),
                question.difficulty.as_deref(),
                question.image_path.as_deref(),
                question.content.as_deref(),
                question.file.as_deref(),
                question.related_questions.as_deref(),
            ],
        )?;
        let question_id = tx.last_insert_rowid();

        for exam_id in existing_ids(&tx, Table::Exams, &question.exam_ids)? {
            insert_memberships(
                &tx,
                "exam_questions",
                "exam_id",
                exam_id,
                "question_id",
                &[question_id],
            )?;
        }
        for tag_id in existing_ids(&tx, Table::Tags, &question.tag_ids)? {
            insert_memberships(
                &tx,
                "question_tags",
                "tag_id",
                tag_id,
                "question_id",
                &[question_id],
            )?;
        }

        tx.commit()?;
        Ok(question_id)
    }

    fn update_question(&self, patch: &QuestionPatch) -> RepoResult<()> {
        patch.validate()?;

        let tx = immediate_tx(self.conn)?;
        let mut question = load_question_row(&tx, patch.id)?
            .ok_or_else(|| RepoError::not_found_id(ENTITY, patch.id))?;
        patch.apply(&mut question);

        tx.execute(
            "UPDATE questions
             SET
                question_number = ?2,
                section = ?3,
                difficulty = ?4,
                image_path = ?5,
                content = ?6,
                file = ?7,
                related_questions = ?8
             WHERE id = ?1;",
            params![
                question.id,
                question.question_number.as_str(),
                question.section.as_deref(),
                question.difficulty.as_deref(),
                question.image_path.as_deref(),
                question.content.as_deref(),
                question.file.as_deref(),
                question.related_questions.as_deref(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_question_by_number(&self, question_number: &str) -> RepoResult<QuestionId> {
        let tx = immediate_tx(self.conn)?;
        let question_id =
            first_id_by_key(&tx, Table::Questions, "question_number", question_number)?.ok_or_else(
                || RepoError::not_found_key(ENTITY, "question_number", question_number),
            )?;

        let students = delete_links(&tx, "student_questions", "question_id", question_id)?;
        let exams = delete_links(&tx, "exam_questions", "question_id", question_id)?;
        let tags = delete_links(&tx, "question_tags", "question_id", question_id)?;
        tx.execute("DELETE FROM questions WHERE id = ?1;", [question_id])?;
        tx.commit()?;

        debug!(
            "event=cascade_delete module=repo entity=question id={} student_links={} exam_links={} tag_links={}",
            question_id, students, exams, tags
        );
        Ok(question_id)
    }

    fn get_question(&self, id: QuestionId) -> RepoResult<Option<Question>> {
        match load_question_row(self.conn, id)? {
            Some(question) => Ok(Some(with_memberships(self.conn, question)?)),
            None => Ok(None),
        }
    }

    fn list_questions(&self) -> RepoResult<Vec<Question>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{QUESTION_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            let question = parse_question_row(row)?;
            questions.push(with_memberships(self.conn, question)?);
        }
        Ok(questions)
    }
}

fn load_question_row(conn: &Connection, id: QuestionId) -> RepoResult<Option<Question>> {
    let mut stmt = conn.prepare(&format!("{QUESTION_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_question_row(row)?));
    }
    Ok(None)
}

fn parse_question_row(row: &Row<'_>) -> RepoResult<Question> {
    Ok(Question {
        id: row.get("id")?,
        question_number: row.get("question_number")?,
        section: row.get("section")?,
        difficulty: row.get("difficulty")?,
        image_path: row.get("image_path")?,
        content: row.get("content")?,
        file: row.get("file")?,
        related_questions: row.get("related_questions")?,
        exam_ids: Vec::new(),
        student_ids: Vec::new(),
        tag_ids: Vec::new(),
    })
}

fn with_memberships(conn: &Connection, mut question: Question) -> RepoResult<Question> {
    question.exam_ids =
        load_link_ids(conn, "exam_questions", "question_id", "exam_id", question.id)?;
    question.student_ids =
        load_link_ids(conn, "student_questions", "question_id", "student_id", question.id)?;
    question.tag_ids = load_link_ids(conn, "question_tags", "question_id", "tag_id", question.id)?;
    Ok(question)
}
