//! Row-to-model conversion. Rows that fail to parse are logged and skipped
//! rather than failing the whole request.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use quill_db::models::{DocumentRow, DocumentSummaryRow, UserRow};
use quill_types::{Document, DocumentSummary, Role, User};

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

pub fn user_from_row(row: UserRow) -> Option<User> {
    let (Ok(id), Some(created_at)) = (row.id.parse::<Uuid>(), parse_time(&row.created_at)) else {
        warn!(user_id = %row.id, "Skipping corrupt user row");
        return None;
    };
    Some(User {
        id,
        username: row.username,
        name: row.name,
        email: row.email,
        role: Role::parse(&row.role),
        created_at,
    })
}

pub fn document_from_row(row: DocumentRow) -> Option<Document> {
    let parsed = (
        row.id.parse::<Uuid>(),
        row.owner_id.parse::<Uuid>(),
        parse_time(&row.last_edited),
        parse_time(&row.created_at),
    );
    let (Ok(id), Ok(owner_id), Some(last_edited), Some(created_at)) = parsed else {
        warn!(document_id = %row.id, "Skipping corrupt document row");
        return None;
    };
    Some(Document {
        id,
        owner_id,
        title: row.title,
        content: row.content,
        last_edited,
        created_at,
    })
}

pub fn summary_from_row(row: DocumentSummaryRow) -> Option<DocumentSummary> {
    let parsed = (
        row.id.parse::<Uuid>(),
        parse_time(&row.last_edited),
        parse_time(&row.created_at),
    );
    let (Ok(id), Some(last_edited), Some(created_at)) = parsed else {
        warn!(document_id = %row.id, "Skipping corrupt document row");
        return None;
    };
    Some(DocumentSummary {
        id,
        title: row.title,
        last_edited,
        created_at,
    })
}

/// Timestamp format stored in the database.
pub fn now_string() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
