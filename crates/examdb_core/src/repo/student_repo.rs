//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist students and their score/question links.
//! - Recompute stored age on every create/update.
//! - Cascade-delete a student's links together with the student row.
//!
//! # Invariants
//! - Links are only created against existing exams/questions; unknown ids
//!   in create input are skipped.
//! - At most one score link exists per `(student, exam)` pair.

use super::{
    delete_links, existing_ids, first_id_by_key, immediate_tx, row_exists, RepoError, RepoResult,
    Table,
};
use crate::model::student::{
    compute_age, ExamScore, NewStudent, QuestionLink, Student, StudentPatch,
};
use crate::model::{ExamId, QuestionId, StudentId};
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "student";
const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository interface for student operations.
pub trait StudentRepository {
    /// Inserts a student plus any valid score/question links.
    fn create_student(&self, student: &NewStudent, today: NaiveDate) -> RepoResult<StudentId>;
    /// Overwrites supplied fields of one student and recomputes age.
    fn update_student(&self, patch: &StudentPatch, today: NaiveDate) -> RepoResult<()>;
    /// Deletes the first student with `name` and all of its links.
    fn delete_student_by_name(&self, name: &str) -> RepoResult<StudentId>;
    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Lists all students ordered by id.
    fn list_students(&self) -> RepoResult<Vec<Student>>;
    /// Records (or overwrites) one exam score for a student.
    fn set_exam_score(
        &self,
        student_id: StudentId,
        exam_id: ExamId,
        score: Option<i64>,
    ) -> RepoResult<()>;
    /// Links a student to a question. Linking twice is a no-op.
    fn link_question(&self, student_id: StudentId, question_id: QuestionId) -> RepoResult<()>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create_student(&self, student: &NewStudent, today: NaiveDate) -> RepoResult<StudentId> {
        student.validate()?;

        let tx = immediate_tx(self.conn)?;
        tx.execute(
            "INSERT INTO students (name, birth_date, age) VALUES (?1, ?2, ?3);",
            params![
                student.name.as_str(),
                format_birth_date(student.birth_date),
                compute_age(student.birth_date, today),
            ],
        )?;
        let student_id = tx.last_insert_rowid();

        for entry in &student.exam_scores {
            if !row_exists(&tx, Table::Exams, entry.exam_id)? {
                debug!(
                    "event=link_skipped module=repo entity=student exam_id={}",
                    entry.exam_id
                );
                continue;
            }
            upsert_score(&tx, student_id, entry.exam_id, entry.score)?;
        }

        for question_id in existing_ids(&tx, Table::Questions, &student.question_ids)? {
            insert_question_link(&tx, student_id, question_id)?;
        }

        tx.commit()?;
        Ok(student_id)
    }

    fn update_student(&self, patch: &StudentPatch, today: NaiveDate) -> RepoResult<()> {
        patch.validate()?;

        let tx = immediate_tx(self.conn)?;
        let mut student = load_student_row(&tx, patch.id)?
            .ok_or_else(|| RepoError::not_found_id(ENTITY, patch.id))?;
        patch.apply(&mut student, today);

        tx.execute(
            "UPDATE students
             SET name = ?2, birth_date = ?3, age = ?4
             WHERE id = ?1;",
            params![
                student.id,
                student.name.as_str(),
                format_birth_date(student.birth_date),
                student.age,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_student_by_name(&self, name: &str) -> RepoResult<StudentId> {
        let tx = immediate_tx(self.conn)?;
        let student_id = first_id_by_key(&tx, Table::Students, "name", name)?
            .ok_or_else(|| RepoError::not_found_key(ENTITY, "name", name))?;

        let scores = delete_links(&tx, "student_exam_scores", "student_id", student_id)?;
        let questions = delete_links(&tx, "student_questions", "student_id", student_id)?;
        tx.execute("DELETE FROM students WHERE id = ?1;", [student_id])?;
        tx.commit()?;

        debug!(
            "event=cascade_delete module=repo entity=student id={} score_links={} question_links={}",
            student_id, scores, questions
        );
        Ok(student_id)
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>> {
        match load_student_row(self.conn, id)? {
            Some(student) => Ok(Some(with_links(self.conn, student)?)),
            None => Ok(None),
        }
    }

    fn list_students(&self) -> RepoResult<Vec<Student>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, birth_date, age FROM students ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            let student = parse_student_row(row)?;
            students.push(with_links(self.conn, student)?);
        }
        Ok(students)
    }

    fn set_exam_score(
        &self,
        student_id: StudentId,
        exam_id: ExamId,
        score: Option<i64>,
    ) -> RepoResult<()> {
        let tx = immediate_tx(self.conn)?;
        if !row_exists(&tx, Table::Students, student_id)? {
            return Err(RepoError::not_found_id(ENTITY, student_id));
        }
        if !row_exists(&tx, Table::Exams, exam_id)? {
            return Err(RepoError::not_found_id("exam", exam_id));
        }
        upsert_score(&tx, student_id, exam_id, score)?;
        tx.commit()?;
        Ok(())
    }

    fn link_question(&self, student_id: StudentId, question_id: QuestionId) -> RepoResult<()> {
        let tx = immediate_tx(self.conn)?;
        if !row_exists(&tx, Table::Students, student_id)? {
            return Err(RepoError::not_found_id(ENTITY, student_id));
        }
        if !row_exists(&tx, Table::Questions, question_id)? {
            return Err(RepoError::not_found_id("question", question_id));
        }
        insert_question_link(&tx, student_id, question_id)?;
        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn upsert_score(
    conn: &Connection,
    student_id: StudentId,
    exam_id: ExamId,
    score: Option<i64>,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO student_exam_scores (student_id, exam_id, score)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (student_id, exam_id) DO UPDATE SET score = excluded.score;",
        params![student_id, exam_id, score],
    )?;
    Ok(())
}

fn insert_question_link(
    conn: &Connection,
    student_id: StudentId,
    question_id: QuestionId,
) -> RepoResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO student_questions (student_id, question_id) VALUES (?1, ?2);",
        params![student_id, question_id],
    )?;
    Ok(())
}

fn load_student_row(conn: &Connection, id: StudentId) -> RepoResult<Option<Student>> {
    let mut stmt =
        conn.prepare("SELECT id, name, birth_date, age FROM students WHERE id = ?1;")?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_student_row(row)?));
    }
    Ok(None)
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let birth_text: String = row.get("birth_date")?;
    let birth_date = NaiveDate::parse_from_str(&birth_text, BIRTH_DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid birth date `{birth_text}` in students.birth_date"
        ))
    })?;

    Ok(Student {
        id: row.get("id")?,
        name: row.get("name")?,
        birth_date,
        age: row.get("age")?,
        exam_scores: Vec::new(),
        question_links: Vec::new(),
    })
}

fn with_links(conn: &Connection, mut student: Student) -> RepoResult<Student> {
    student.exam_scores = load_exam_scores(conn, student.id)?;
    student.question_links = load_question_links(conn, student.id)?;
    Ok(student)
}

fn load_exam_scores(conn: &Connection, student_id: StudentId) -> RepoResult<Vec<ExamScore>> {
    let mut stmt = conn.prepare(
        "SELECT s.exam_id, e.exam_number, s.score
         FROM student_exam_scores s
         INNER JOIN exams e ON e.id = s.exam_id
         WHERE s.student_id = ?1
         ORDER BY s.exam_id ASC;",
    )?;
    let mut rows = stmt.query([student_id])?;
    let mut scores = Vec::new();
    while let Some(row) = rows.next()? {
        scores.push(ExamScore {
            exam_id: row.get(0)?,
            exam_number: row.get(1)?,
            score: row.get(2)?,
        });
    }
    Ok(scores)
}

fn load_question_links(conn: &Connection, student_id: StudentId) -> RepoResult<Vec<QuestionLink>> {
    let mut stmt = conn.prepare(
        "SELECT l.question_id, q.question_number, q.section
         FROM student_questions l
         INNER JOIN questions q ON q.id = l.question_id
         WHERE l.student_id = ?1
         ORDER BY l.question_id ASC;",
    )?;
    let mut rows = stmt.query([student_id])?;
    let mut links = Vec::new();
    while let Some(row) = rows.next()? {
        links.push(QuestionLink {
            question_id: row.get(0)?,
            question_number: row.get(1)?,
            section: row.get(2)?,
        });
    }
    Ok(links)
}

fn format_birth_date(date: NaiveDate) -> String {
    date.format(BIRTH_DATE_FORMAT).to_string()
}

