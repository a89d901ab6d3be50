use crate::error::{is_foreign_key_violation, is_unique_violation};
use crate::models::{MessageRow, UserRow};
use crate::{Database, DbError};
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    /// Insert a user and return its id. Uniqueness is left to the UNIQUE
    /// constraint so that racing inserts of one username resolve here.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::DuplicateUsername
                } else {
                    e.into()
                }
            })?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>, DbError> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>, DbError> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    // -- Messages --

    pub fn create_message(&self, writer_user_id: i64, content: &str) -> Result<i64, DbError> {
        if content.trim().is_empty() {
            return Err(DbError::ContentEmpty);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (content, writer_user_id) VALUES (?1, ?2)",
                rusqlite::params![content, writer_user_id],
            )
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DbError::OwnerNotFound(writer_user_id)
                } else {
                    e.into()
                }
            })?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
    }

    /// The first `limit` messages in creation order, oldest first.
    pub fn list_recent(&self, limit: u32) -> Result<Vec<MessageRow>, DbError> {
        self.with_conn(|conn| query_messages(conn, limit, 0))
    }

    /// A 1-indexed page of messages. Pages past the end, and page 0, are empty.
    pub fn list_page(&self, page_number: u32, page_size: u32) -> Result<Vec<MessageRow>, DbError> {
        if page_number == 0 {
            return Ok(vec![]);
        }
        let offset = i64::from(page_number - 1) * i64::from(page_size);
        self.with_conn(|conn| query_messages(conn, page_size, offset))
    }

    pub fn count_messages(&self) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?)
        })
    }
}

fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    filter: &str,
    value: P,
) -> Result<Option<UserRow>, DbError> {
    let sql = format!("SELECT id, username, password, created_at FROM users WHERE {filter}");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_messages(conn: &Connection, limit: u32, offset: i64) -> Result<Vec<MessageRow>, DbError> {
    // JOIN users to fetch the writer's username in a single query
    let mut stmt = conn.prepare(
        "SELECT m.id, m.content, m.writer_user_id, u.username, m.created_at
         FROM messages m
         LEFT JOIN users u ON m.writer_user_id = u.id
         ORDER BY m.id ASC
         LIMIT ?1 OFFSET ?2",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![limit, offset], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                content: row.get(1)?,
                writer_user_id: row.get(2)?,
                writer_username: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
