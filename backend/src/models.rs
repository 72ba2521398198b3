use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::store::StoreError;

pub const DEFAULT_TITLE: &str = "Untitled Page";

/// A stored note as it goes over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub date: String,
    /// Epoch milliseconds, refreshed on every write.
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/notes`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
    pub timestamp: Option<i64>,
}

/// Body of `PUT /api/notes/:id`. Only these fields are merged; anything else
/// in the body is ignored and `timestamp` is always server-assigned.
///
/// Outer `None` means the field was absent, `Some(None)` that it was `null`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub date: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// A note that passed schema checks and is ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub date: String,
    pub timestamp: i64,
}

/// Field changes that passed schema checks, to be merged onto a stored note.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp for a note being rewritten: wall clock, but never at or behind
/// the previous value.
pub fn next_timestamp(previous: i64, now: i64) -> i64 {
    now.max(previous.saturating_add(1))
}

fn required(path: &str) -> StoreError {
    StoreError::Validation(format!("Path `{}` is required.", path))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl CreateNoteRequest {
    /// Applies defaults and required-field checks, assigning a fresh id.
    pub fn into_new_note(self, now: i64) -> Result<NewNote, StoreError> {
        let content = match self.content {
            Some(content) if !is_blank(&content) => content,
            _ => return Err(required("content")),
        };
        let date = match self.date {
            Some(date) if !date.is_empty() => date,
            _ => return Err(required("date")),
        };
        let title = self
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        Ok(NewNote {
            id: Uuid::new_v4(),
            title,
            content,
            date,
            timestamp: self.timestamp.filter(|ts| *ts > 0).unwrap_or(now),
        })
    }
}

impl UpdateNoteRequest {
    pub fn into_changes(self) -> Result<NoteChanges, StoreError> {
        let content = match self.content {
            None => None,
            Some(Some(content)) if !is_blank(&content) => Some(content),
            Some(_) => return Err(required("content")),
        };
        let date = match self.date {
            None => None,
            Some(Some(date)) if !date.is_empty() => Some(date),
            Some(_) => return Err(required("date")),
        };
        // A cleared title falls back to the default rather than failing.
        let title = self.title.map(|title| {
            title
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string())
        });

        Ok(NoteChanges {
            title,
            content,
            date,
        })
    }
}

impl NoteChanges {
    /// Merges the changes onto `note` and refreshes its timestamps.
    pub fn apply(self, note: &mut Note, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(date) = self.date {
            note.date = date;
        }
        note.timestamp = next_timestamp(note.timestamp, now.timestamp_millis());
        note.updated_at = now;
    }
}
