use crate::state::AppState;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use duet_core::{SessionKey, participant_dir_name};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

const UNKNOWN_SESSION: &str = "unknown-room";
const UNKNOWN_PARTICIPANT: &str = "unknown-user";
const AUDIO_FIELD: &str = "audio";

/// Query string of `POST /upload`. The older `roomId`/`userId`/`userName`
/// spellings are accepted too.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    #[serde(alias = "roomId")]
    pub session_key: Option<String>,
    #[serde(alias = "userId")]
    pub participant_id: Option<String>,
    #[serde(alias = "userName")]
    pub display_name: Option<String>,
    /// Set on a participant's last chunk.
    #[serde(rename = "final", default)]
    pub is_final: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub status: String,
    pub file: String,
    pub path: String,
    pub sequence: u64,
    pub session_key: String,
    pub participant_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadError {
    pub status: String,
    pub message: String,
    pub session_key: String,
    pub participant_id: String,
}

/// POST /upload
/// Stores one recorded audio chunk sent as multipart field `audio`.
pub async fn upload_chunk(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Response {
    let raw_session = params
        .session_key
        .unwrap_or_else(|| UNKNOWN_SESSION.to_owned());
    let participant_id = params
        .participant_id
        .unwrap_or_else(|| UNKNOWN_PARTICIPANT.to_owned());

    let failure = |code: StatusCode, message: String| {
        (
            code,
            Json(UploadError {
                status: "error".to_owned(),
                message,
                session_key: raw_session.clone(),
                participant_id: participant_id.clone(),
            }),
        )
            .into_response()
    };

    let key = match SessionKey::parse(&raw_session) {
        Ok(key) => key,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let dir_name = match participant_dir_name(params.display_name.as_deref(), &participant_id) {
        Ok(name) => name,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let data = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(AUDIO_FIELD) => match field.bytes().await {
                Ok(data) => break data,
                Err(e) => {
                    warn!("Upload body from {} in '{}' broke off: {}", participant_id, key, e);
                    return failure(StatusCode::BAD_REQUEST, e.to_string());
                }
            },
            Ok(Some(_)) => continue,
            Ok(None) => {
                return failure(
                    StatusCode::BAD_REQUEST,
                    format!("no '{AUDIO_FIELD}' field in upload"),
                );
            }
            Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
        }
    };

    match state.chunks.store(&key, &dir_name, data).await {
        Ok(chunk) => {
            info!(
                "Upload from {} stored at {} in session '{}'",
                participant_id,
                chunk.path.display(),
                key
            );
            if params.is_final {
                state.coordinator.uploads_complete(&key);
            }
            (
                StatusCode::OK,
                Json(UploadResponse {
                    status: "ok".to_owned(),
                    file: chunk.file_name,
                    path: chunk.path.display().to_string(),
                    sequence: chunk.sequence,
                    session_key: key.to_string(),
                    participant_id: participant_id.clone(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Upload from {} in '{}' failed: {}", participant_id, key, e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
