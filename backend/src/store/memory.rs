use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{parse_note_id, NoteStore, StoreError};
use crate::models::{now_millis, CreateNoteRequest, Note, UpdateNoteRequest};

/// Process-local note collection. Contents are lost on exit.
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: RwLock<HashMap<Uuid, Note>>,
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, draft: CreateNoteRequest) -> Result<Note, StoreError> {
        let new_note = draft.into_new_note(now_millis())?;
        let now = Utc::now();
        let note = Note {
            id: new_note.id,
            title: new_note.title,
            content: new_note.content,
            date: new_note.date,
            timestamp: new_note.timestamp,
            created_at: now,
            updated_at: now,
        };
        self.notes.write().await.insert(note.id, note.clone());
        Ok(note)
    }

    async fn find_all(&self) -> Result<Vec<Note>, StoreError> {
        let mut notes: Vec<Note> = self.notes.read().await.values().cloned().collect();
        notes.sort_by_key(|note| Reverse((note.timestamp, note.created_at)));
        Ok(notes)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let id = parse_note_id(id)?;
        Ok(self.notes.read().await.get(&id).cloned())
    }

    async fn update_by_id(
        &self,
        id: &str,
        changes: UpdateNoteRequest,
    ) -> Result<Option<Note>, StoreError> {
        let id = parse_note_id(id)?;
        let changes = changes.into_changes()?;
        let mut notes = self.notes.write().await;
        Ok(notes.get_mut(&id).map(|note| {
            changes.apply(note, Utc::now());
            note.clone()
        }))
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, StoreError> {
        let id = parse_note_id(id)?;
        Ok(self.notes.write().await.remove(&id).is_some())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut notes = self.notes.write().await;
        let count = notes.len() as u64;
        notes.clear();
        Ok(count)
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_TITLE;

    fn draft(content: &str, timestamp: i64) -> CreateNoteRequest {
        CreateNoteRequest {
            content: Some(content.to_string()),
            date: Some("Jan 1".to_string()),
            timestamp: Some(timestamp),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryNoteStore::default();
        let note = store.insert(draft("hello", 10)).await.unwrap();
        assert_eq!(note.title, DEFAULT_TITLE);

        let found = store.find_by_id(&note.id.to_string()).await.unwrap();
        assert_eq!(found, Some(note));
    }

    #[tokio::test]
    async fn invalid_insert_stores_nothing() {
        let store = MemoryNoteStore::default();
        let result = store.insert(draft("  ", 10)).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_all_is_newest_first() {
        let store = MemoryNoteStore::default();
        store.insert(draft("old", 1)).await.unwrap();
        store.insert(draft("newest", 3)).await.unwrap();
        store.insert(draft("middle", 2)).await.unwrap();

        let contents: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|note| note.content)
            .collect();
        assert_eq!(contents, ["newest", "middle", "old"]);
    }

    #[tokio::test]
    async fn update_merges_and_advances_timestamp() {
        let store = MemoryNoteStore::default();
        let note = store.insert(draft("hello", i64::MAX / 2)).await.unwrap();

        let changes = UpdateNoteRequest {
            title: Some(Some("Hi".to_string())),
            ..Default::default()
        };
        let updated = store
            .update_by_id(&note.id.to_string(), changes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, note.id);
        assert_eq!(updated.title, "Hi");
        assert_eq!(updated.content, "hello");
        assert!(updated.timestamp > note.timestamp);
    }

    #[tokio::test]
    async fn update_of_max_timestamp_note_saturates() {
        let store = MemoryNoteStore::default();
        let note = store.insert(draft("hello", i64::MAX)).await.unwrap();

        let updated = store
            .update_by_id(&note.id.to_string(), UpdateNoteRequest::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.timestamp, i64::MAX);
    }

    #[tokio::test]
    async fn missing_and_malformed_ids() {
        let store = MemoryNoteStore::default();
        let missing = Uuid::new_v4().to_string();
        assert_eq!(store.find_by_id(&missing).await.unwrap(), None);
        assert!(!store.delete_by_id(&missing).await.unwrap());
        assert!(store
            .update_by_id(&missing, UpdateNoteRequest::default())
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            store.find_by_id("abc").await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_all_reports_count() {
        let store = MemoryNoteStore::default();
        for i in 0..3 {
            store.insert(draft("n", i + 1)).await.unwrap();
        }
        assert_eq!(store.delete_all().await.unwrap(), 3);
        assert!(store.find_all().await.unwrap().is_empty());
        assert_eq!(store.delete_all().await.unwrap(), 0);
    }
}
