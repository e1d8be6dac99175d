/// Database row types. These map directly to SQLite rows.
/// Distinct from quill-types models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub is_deleted: bool,
    pub created_at: String,
}

pub struct DocumentRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub last_edited: String,
    pub created_at: String,
}

pub struct DocumentSummaryRow {
    pub id: String,
    pub title: String,
    pub last_edited: String,
    pub created_at: String,
}
