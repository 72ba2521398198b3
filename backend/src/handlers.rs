use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use log::{error, info, warn};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::errors::ApiError;
use crate::models::{CreateNoteRequest, Note, UpdateNoteRequest};
use crate::store::StoreError;

const LOG_TARGET: &str = "luminar_notes::notes";

fn store_failure(operation: &str, err: StoreError, fault_status: StatusCode) -> ApiError {
    let api_error = ApiError::from_store(err, fault_status);
    if api_error.status.is_server_error() {
        error!(target: LOG_TARGET, "{} failed: {}", operation, api_error.message);
    } else {
        warn!(target: LOG_TARGET, "{} rejected: {}", operation, api_error.message);
    }
    api_error
}

pub async fn get_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state
        .store
        .find_all()
        .await
        .map_err(|e| store_failure("list notes", e, StatusCode::INTERNAL_SERVER_ERROR))?;

    info!(target: LOG_TARGET, "listed {} notes", notes.len());
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<AppState>,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let Json(req) = payload?;

    if req.content.as_deref().map_or(true, |c| c.trim().is_empty()) {
        warn!(target: LOG_TARGET, "create rejected: content is empty");
        return Err(ApiError::bad_request("Note content cannot be empty"));
    }
    if req.date.as_deref().map_or(true, str::is_empty) {
        warn!(target: LOG_TARGET, "create rejected: date is missing");
        return Err(ApiError::bad_request("Date is required"));
    }

    let note = state
        .store
        .insert(req)
        .await
        .map_err(|e| store_failure("create note", e, StatusCode::BAD_REQUEST))?;

    info!(target: LOG_TARGET, "created note {} ({:?}, {})", note.id, note.title, note.date);
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .store
        .find_by_id(&id)
        .await
        .map_err(|e| store_failure("get note", e, StatusCode::INTERNAL_SERVER_ERROR))?;

    match note {
        Some(note) => Ok(Json(note)),
        None => {
            warn!(target: LOG_TARGET, "get note {}: not found", id);
            Err(ApiError::not_found())
        }
    }
}

pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Result<Json<Note>, ApiError> {
    let Json(changes) = payload?;

    let note = state
        .store
        .update_by_id(&id, changes)
        .await
        .map_err(|e| store_failure("update note", e, StatusCode::BAD_REQUEST))?;

    match note {
        Some(note) => {
            info!(target: LOG_TARGET, "updated note {} ({:?}, {})", note.id, note.title, note.date);
            Ok(Json(note))
        }
        None => {
            warn!(target: LOG_TARGET, "update note {}: not found", id);
            Err(ApiError::not_found())
        }
    }
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .store
        .delete_by_id(&id)
        .await
        .map_err(|e| store_failure("delete note", e, StatusCode::BAD_REQUEST))?;

    if !deleted {
        warn!(target: LOG_TARGET, "delete note {}: not found", id);
        return Err(ApiError::not_found());
    }

    info!(target: LOG_TARGET, "deleted note {}", id);
    Ok(Json(json!({ "message": "Note deleted successfully" })))
}

pub async fn delete_all_notes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let count = state
        .store
        .delete_all()
        .await
        .map_err(|e| store_failure("delete all notes", e, StatusCode::INTERNAL_SERVER_ERROR))?;

    warn!(target: LOG_TARGET, "deleted all {} notes", count);
    Ok(Json(json!({
        "message": format!("Deleted {} notes", count),
        "deletedCount": count,
    })))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let connected = state.store.ping().await;
    Json(json!({
        "message": "Server running",
        "db": if connected { "connected" } else { "disconnected" },
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Route not found")
}
