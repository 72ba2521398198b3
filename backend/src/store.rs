use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CreateNoteRequest, Note, UpdateNoteRequest};

mod memory;
mod postgres;

pub use memory::MemoryNoteStore;
pub use postgres::PgNoteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field is missing or empty, or an identifier is malformed.
    #[error("Note validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Database(#[from] sqlx::Error),
}

/// The `notes` collection. Every handler issues exactly one call on it.
#[async_trait]
pub trait NoteStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn insert(&self, draft: CreateNoteRequest) -> Result<Note, StoreError>;

    /// All notes, most recent `timestamp` first.
    async fn find_all(&self) -> Result<Vec<Note>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Note>, StoreError>;

    async fn update_by_id(
        &self,
        id: &str,
        changes: UpdateNoteRequest,
    ) -> Result<Option<Note>, StoreError>;

    /// Returns false when no note had this id.
    async fn delete_by_id(&self, id: &str) -> Result<bool, StoreError>;

    async fn delete_all(&self) -> Result<u64, StoreError>;

    async fn ping(&self) -> bool;
}

pub fn parse_note_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| {
        StoreError::Validation(format!("Cast to note id failed for value \"{}\"", id))
    })
}

/// Opens the store named by a connection string: `memory://` or a Postgres URL.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
) -> Result<Arc<dyn NoteStore>, StoreError> {
    if database_url.starts_with("memory://") {
        return Ok(Arc::new(MemoryNoteStore::default()));
    }
    let store = PgNoteStore::connect(database_url, max_connections).await?;
    Ok(Arc::new(store))
}
