use crate::Database;
use crate::models::{DocumentRow, DocumentSummaryRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

/// Parameters for inserting a new user row.
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub created_at: &'a str,
}

const USER_COLUMNS: &str = "id, username, name, email, password, role, is_deleted, created_at";
const DOCUMENT_COLUMNS: &str = "id, owner_id, title, content, last_edited, created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, name, email, password, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    user.id,
                    user.username,
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role,
                    user.created_at
                ],
            )?;
            Ok(())
        })
    }

    /// True if either the username or the email already belongs to an account,
    /// deleted or not.
    pub fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
                [username, email],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Look up an active user by username or email.
    pub fn get_user_by_login(&self, login: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE (username = ?1 OR email = ?1) AND is_deleted = 0"
                ),
                login,
            )
        })
    }

    /// Active user by id. Soft-deleted accounts resolve to `None`.
    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND is_deleted = 0"),
                id,
            )
        })
    }

    pub fn soft_delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
                [id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Documents --

    /// Active documents of `owner_id`, most recently edited first.
    pub fn list_documents(&self, owner_id: &str) -> Result<Vec<DocumentSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, last_edited, created_at FROM documents
                 WHERE owner_id = ?1 AND is_deleted = 0
                 ORDER BY last_edited DESC",
            )?;

            let rows = stmt
                .query_map([owner_id], |row| {
                    Ok(DocumentSummaryRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        last_edited: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_document(&self, id: &str, owner_id: &str) -> Result<Option<DocumentRow>> {
        self.with_conn(|conn| query_document(conn, id, owner_id))
    }

    pub fn insert_document(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        content: &str,
        now: &str,
    ) -> Result<DocumentRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO documents (id, owner_id, title, content, last_edited, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, owner_id, title, content, now],
            )?;
            Ok(DocumentRow {
                id: id.to_string(),
                owner_id: owner_id.to_string(),
                title: title.to_string(),
                content: content.to_string(),
                last_edited: now.to_string(),
                created_at: now.to_string(),
            })
        })
    }

    /// Apply a partial update and bump `last_edited`. Returns `None` when the
    /// document is missing, deleted, or owned by someone else.
    pub fn update_document(
        &self,
        id: &str,
        owner_id: &str,
        title: Option<&str>,
        content: Option<&str>,
        now: &str,
    ) -> Result<Option<DocumentRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE documents
                 SET title = COALESCE(?3, title),
                     content = COALESCE(?4, content),
                     last_edited = ?5
                 WHERE id = ?1 AND owner_id = ?2 AND is_deleted = 0",
                rusqlite::params![id, owner_id, title, content, now],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let row = query_document(&tx, id, owner_id)?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn soft_delete_document(&self, id: &str, owner_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE documents SET is_deleted = 1
                 WHERE id = ?1 AND owner_id = ?2 AND is_deleted = 0",
                [id, owner_id],
            )?;
            Ok(changed > 0)
        })
    }
}

fn query_user(conn: &Connection, sql: &str, key: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(sql)?;

    let row = stmt
        .query_row([key], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                password: row.get(4)?,
                role: row.get(5)?,
                is_deleted: row.get(6)?,
                created_at: row.get(7)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_document(conn: &Connection, id: &str, owner_id: &str) -> Result<Option<DocumentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents
         WHERE id = ?1 AND owner_id = ?2 AND is_deleted = 0"
    ))?;

    let row = stmt
        .query_row([id, owner_id], |row| {
            Ok(DocumentRow {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                title: row.get(2)?,
                content: row.get(3)?,
                last_edited: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
