//! Notes CRUD, scoped to the authenticated caller.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use inkpad_api::{ApiError, ApiResult, MessageResponse};
use inkpad_auth::BearerAuth;
use inkpad_core::{parse_id, require_non_empty};
use inkpad_storage::{DynNoteStorage, NewNote, Note, StorageError};
use serde::Deserialize;
use tracing::{debug, error, info};
use uuid::Uuid;

const NOTE_NOT_FOUND: &str = "Note not found";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotePayload {
    pub content: String,
}

impl NotePayload {
    fn into_content(self) -> ApiResult<String> {
        require_non_empty("content", &self.content)?;
        Ok(self.content)
    }
}

fn read_payload(payload: Result<Json<NotePayload>, JsonRejection>) -> ApiResult<NotePayload> {
    payload.map(|Json(p)| p).map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(e.body_text())
        } else {
            ApiError::bad_request(e.body_text())
        }
    })
}

/// Unparsable ids can never match a stored note.
fn note_id(raw: &str) -> ApiResult<Uuid> {
    parse_id(raw).map_err(|_| ApiError::not_found(NOTE_NOT_FOUND))
}

/// Logs the storage failure and replaces it with `public_message`.
fn failed(public_message: &'static str) -> impl FnOnce(StorageError) -> ApiError {
    move |err| {
        error!(error = %err, category = %err.category(), "{public_message}");
        ApiError::internal(public_message)
    }
}

/// `GET /api/notes/get`
pub async fn list_notes(
    State(notes): State<DynNoteStorage>,
    BearerAuth(auth): BearerAuth,
) -> ApiResult<Json<Vec<Note>>> {
    let list = notes
        .list_for_owner(auth.user_id)
        .await
        .map_err(failed("Error fetching notes"))?;
    debug!(user_id = %auth.user_id, count = list.len(), "listed notes");
    Ok(Json(list))
}

/// `POST /api/notes/post`
pub async fn create_note(
    State(notes): State<DynNoteStorage>,
    BearerAuth(auth): BearerAuth,
    payload: Result<Json<NotePayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let content = read_payload(payload)?.into_content()?;
    let note = notes
        .create(NewNote::new(auth.user_id, content))
        .await
        .map_err(failed("Error creating note"))?;
    info!(user_id = %auth.user_id, note_id = %note.id, "note created");
    Ok((StatusCode::CREATED, Json(note)))
}

/// `PUT /api/notes/{id}`
pub async fn update_note(
    State(notes): State<DynNoteStorage>,
    BearerAuth(auth): BearerAuth,
    Path(id): Path<String>,
    payload: Result<Json<NotePayload>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let id = note_id(&id)?;
    let content = read_payload(payload)?.into_content()?;
    let note = notes
        .update_owned(id, auth.user_id, content)
        .await
        .map_err(failed("Error updating note"))?
        .ok_or_else(|| ApiError::not_found(NOTE_NOT_FOUND))?;
    info!(user_id = %auth.user_id, note_id = %note.id, "note updated");
    Ok(Json(note))
}

/// `DELETE /api/notes/{id}`
pub async fn delete_note(
    State(notes): State<DynNoteStorage>,
    BearerAuth(auth): BearerAuth,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = note_id(&id)?;
    notes
        .delete_owned(id, auth.user_id)
        .await
        .map_err(failed("Error deleting note"))?
        .ok_or_else(|| ApiError::not_found(NOTE_NOT_FOUND))?;
    info!(user_id = %auth.user_id, note_id = %id, "note deleted");
    Ok(Json(MessageResponse::new("Note deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_content_is_rejected() {
        let err = NotePayload {
            content: "   ".into(),
        }
        .into_content()
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rich_text_content_is_kept_verbatim() {
        let content = NotePayload {
            content: "<p> spaced </p>".into(),
        }
        .into_content()
        .unwrap();
        assert_eq!(content, "<p> spaced </p>");
    }

    #[test]
    fn unparsable_id_reads_as_missing_note() {
        let err = note_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), NOTE_NOT_FOUND);
    }

    #[test]
    fn storage_failures_use_operation_message() {
        let err = failed("Error creating note")(StorageError::internal("disk on fire"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Error creating note");
    }
}
