//! Tag repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Tag content is stored verbatim; lookups by content are exact matches.
//! - Deleting a tag removes its question/exam memberships in the same
//!   transaction.

use super::{
    delete_links, existing_ids, first_id_by_key, immediate_tx, insert_memberships, load_link_ids,
    RepoError, RepoResult, Table,
};
use crate::model::tag::{NewTag, Tag, TagPatch};
use crate::model::TagId;
use log::debug;
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "tag";

pub trait TagRepository {
    fn create_tag(&self, tag: &NewTag) -> RepoResult<TagId>;
    fn update_tag(&self, patch: &TagPatch) -> RepoResult<()>;
    fn delete_tag_by_content(&self, content: &str) -> RepoResult<TagId>;
    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>>;
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
}

pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn create_tag(&self, tag: &NewTag) -> RepoResult<TagId> {
        tag.validate()?;

        let tx = immediate_tx(self.conn)?;
        tx.execute(
            "INSERT INTO tags (content) VALUES (?1);",
            [tag.content.as_str()],
        )?;
        let tag_id = tx.last_insert_rowid();

        let question_ids = existing_ids(&tx, Table::Questions, &tag.question_ids)?;
        insert_memberships(
            &tx,
            "question_tags",
            "tag_id",
            tag_id,
            "question_id",
            &question_ids,
        )?;
        let exam_ids = existing_ids(&tx, Table::Exams, &tag.exam_ids)?;
        insert_memberships(&tx, "exam_tags", "tag_id", tag_id, "exam_id", &exam_ids)?;

        tx.commit()?;
        Ok(tag_id)
    }

    fn update_tag(&self, patch: &TagPatch) -> RepoResult<()> {
        patch.validate()?;

        let tx = immediate_tx(self.conn)?;
        let mut tag = load_tag_row(&tx, patch.id)?
            .ok_or_else(|| RepoError::not_found_id(ENTITY, patch.id))?;
        patch.apply(&mut tag);

        tx.execute(
            "UPDATE tags SET content = ?2 WHERE id = ?1;",
            params![tag.id, tag.content.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_tag_by_content(&self, content: &str) -> RepoResult<TagId> {
        let tx = immediate_tx(self.conn)?;
        let tag_id = first_id_by_key(&tx, Table::Tags, "content", content)?
            .ok_or_else(|| RepoError::not_found_key(ENTITY, "content", content))?;

        let questions = delete_links(&tx, "question_tags", "tag_id", tag_id)?;
        let exams = delete_links(&tx, "exam_tags", "tag_id", tag_id)?;
        tx.execute("DELETE FROM tags WHERE id = ?1;", [tag_id])?;
        tx.commit()?;

        debug!(
            "event=cascade_delete module=repo entity=tag id={} question_links={} exam_links={}",
            tag_id, questions, exams
        );
        Ok(tag_id)
    }

    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>> {
        match load_tag_row(self.conn, id)? {
            Some(tag) => Ok(Some(with_memberships(self.conn, tag)?)),
            None => Ok(None),
        }
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, content FROM tags ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let tag = parse_tag_row(row)?;
            tags.push(with_memberships(self.conn, tag)?);
        }
        Ok(tags)
    }
}

fn load_tag_row(conn: &Connection, id: TagId) -> RepoResult<Option<Tag>> {
    let mut stmt = conn.prepare("SELECT id, content FROM tags WHERE id = ?1;")?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_tag_row(row)?));
    }
    Ok(None)
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        content: row.get("content")?,
        question_ids: Vec::new(),
        exam_ids: Vec::new(),
    })
}

fn with_memberships(conn: &Connection, mut tag: Tag) -> RepoResult<Tag> {
    tag.question_ids = load_link_ids(conn, "question_tags", "tag_id", "question_id", tag.id)?;
    tag.exam_ids = load_link_ids(conn, "exam_tags", "tag_id", "exam_id", tag.id)?;
    Ok(tag)
}
