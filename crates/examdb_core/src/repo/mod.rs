//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Own association maintenance and cascade deletes.
//!
//! # Invariants
//! - Repository writes call the input's `validate()` before SQL mutations.
//! - Every mutating call runs inside one IMMEDIATE transaction; a failure
//!   leaves persisted state unchanged.
//! - Natural-key lookups resolve to the lowest surrogate id on duplicates.

pub mod exam_repo;
pub mod question_repo;
pub mod student_repo;
pub mod tag_repo;

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// No row matched the lookup. `key` is rendered as `id=7` or `name=...`.
    NotFound {
        entity: &'static str,
        key: String,
    },
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found_id(entity: &'static str, id: i64) -> Self {
        Self::NotFound {
            entity,
            key: format!("id={id}"),
        }
    }

    pub(crate) fn not_found_key(entity: &'static str, field: &str, value: &str) -> Self {
        Self::NotFound {
            entity,
            key: format!("{field}={value}"),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Entity tables addressable by the shared lookup helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Table {
    Students,
    Exams,
    Questions,
    Tags,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Exams => "exams",
            Self::Questions => "questions",
            Self::Tags => "tags",
        }
    }
}

/// Opens an IMMEDIATE write transaction on a shared connection borrow.
///
/// Repository calls never nest, so at most one transaction is open per handle.
pub(crate) fn immediate_tx(conn: &Connection) -> RepoResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?)
}

pub(crate) fn row_exists(conn: &Connection, table: Table, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);", table.name()),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Keeps only ids that resolve to live rows, preserving input order.
///
/// Missing ids are skipped rather than reported.
pub(crate) fn existing_ids(conn: &Connection, table: Table, ids: &[i64]) -> RepoResult<Vec<i64>> {
    let mut found = Vec::with_capacity(ids.len());
    for &id in ids {
        if row_exists(conn, table, id)? && !found.contains(&id) {
            found.push(id);
        }
    }
    Ok(found)
}

/// Resolves a natural key to the first matching row by ascending id.
pub(crate) fn first_id_by_key(
    conn: &Connection,
    table: Table,
    column: &'static str,
    value: &str,
) -> RepoResult<Option<i64>> {
    let id = conn
        .query_row(
            &format!(
                "SELECT id FROM {} WHERE {column} = ?1 ORDER BY id ASC LIMIT 1;",
                table.name()
            ),
            params![value],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Loads one integer column for all link rows matching `owner_id`.
pub(crate) fn load_link_ids(
    conn: &Connection,
    link_table: &'static str,
    owner_column: &'static str,
    target_column: &'static str,
    owner_id: i64,
) -> RepoResult<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {target_column} FROM {link_table}
         WHERE {owner_column} = ?1
         ORDER BY {target_column} ASC;"
    ))?;
    let mut rows = stmt.query([owner_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

/// Inserts membership pairs, ignoring pairs that already exist.
pub(crate) fn insert_memberships(
    conn: &Connection,
    link_table: &'static str,
    left_column: &'static str,
    left_id: i64,
    right_column: &'static str,
    right_ids: &[i64],
) -> RepoResult<()> {
    for &right_id in right_ids {
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {link_table} ({left_column}, {right_column})
                 VALUES (?1, ?2);"
            ),
            params![left_id, right_id],
        )?;
    }
    Ok(())
}

/// Deletes every link row referencing `owner_id`, returning the count.
pub(crate) fn delete_links(
    conn: &Connection,
    link_table: &'static str,
    owner_column: &'static str,
    owner_id: i64,
) -> RepoResult<usize> {
    let removed = conn.execute(
        &format!("DELETE FROM {link_table} WHERE {owner_column} = ?1;"),
        [owner_id],
    )?;
    Ok(removed)
}
