use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use super::{parse_note_id, NoteStore, StoreError};
use crate::models::{now_millis, CreateNoteRequest, Note, UpdateNoteRequest};

const CREATE_NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    id UUID PRIMARY KEY,
    title TEXT NOT NULL DEFAULT 'Untitled Page',
    content TEXT NOT NULL CHECK (btrim(content) <> ''),
    "date" TEXT NOT NULL CHECK ("date" <> ''),
    "timestamp" BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_TIMESTAMP_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS notes_timestamp_idx ON notes ("timestamp" DESC)"#;

/// Same rule as `models::next_timestamp`: the previous value plus one
/// saturates at `i64::MAX` instead of overflowing `BIGINT`.
const NEXT_TIMESTAMP_SQL: &str =
    r#"GREATEST($5, LEAST("timestamp", 9223372036854775806) + 1)"#;

const NOTE_COLUMNS: &str = r#"id, title, content, "date", "timestamp", created_at, updated_at"#;

/// Notes persisted in a PostgreSQL `notes` table.
pub struct PgNoteStore {
    db: PgPool,
}

impl PgNoteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Connects and makes sure the `notes` table exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::query(CREATE_NOTES_TABLE).execute(&db).await?;
        sqlx::query(CREATE_TIMESTAMP_INDEX).execute(&db).await?;
        log::info!("Postgres store ready, collection: notes");

        Ok(Self::new(db))
    }
}

fn note_from_row(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        date: row.get("date"),
        timestamp: row.get("timestamp"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Constraint violations raised by the table are schema errors, not faults.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(db_err.kind(), ErrorKind::CheckViolation | ErrorKind::NotNullViolation) {
            return StoreError::Validation(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl NoteStore for PgNoteStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, draft: CreateNoteRequest) -> Result<Note, StoreError> {
        let note = draft.into_new_note(now_millis())?;

        let sql = format!(
            r#"INSERT INTO notes (id, title, content, "date", "timestamp")
               VALUES ($1, $2, $3, $4, $5) RETURNING {}"#,
            NOTE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(note.id)
            .bind(&note.title)
            .bind(&note.content)
            .bind(&note.date)
            .bind(note.timestamp)
            .fetch_one(&self.db)
            .await
            .map_err(map_db_error)?;

        Ok(note_from_row(&row))
    }

    async fn find_all(&self) -> Result<Vec<Note>, StoreError> {
        let sql = format!(
            r#"SELECT {} FROM notes ORDER BY "timestamp" DESC, created_at DESC"#,
            NOTE_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let id = parse_note_id(id)?;

        let sql = format!("SELECT {} FROM notes WHERE id = $1", NOTE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn update_by_id(
        &self,
        id: &str,
        changes: UpdateNoteRequest,
    ) -> Result<Option<Note>, StoreError> {
        let id = parse_note_id(id)?;
        let changes = changes.into_changes()?;

        let sql = format!(
            r#"UPDATE notes SET
                   title = COALESCE($2, title),
                   content = COALESCE($3, content),
                   "date" = COALESCE($4, "date"),
                   "timestamp" = {},
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {}"#,
            NEXT_TIMESTAMP_SQL, NOTE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.content)
            .bind(changes.date)
            .bind(now_millis())
            .fetch_optional(&self.db)
            .await
            .map_err(map_db_error)?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, StoreError> {
        let id = parse_note_id(id)?;

        let deleted = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let deleted = sqlx::query("DELETE FROM notes").execute(&self.db).await?;
        Ok(deleted.rows_affected())
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_bump_cannot_overflow_bigint() {
        assert_eq!(i64::MAX - 1, 9223372036854775806);
        assert!(NEXT_TIMESTAMP_SQL.contains("LEAST(\"timestamp\", 9223372036854775806) + 1"));
    }
}
