use crate::interface_adapters::http::{ApiError, error_response};
use crate::interface_adapters::net::client::spawn_session_serializer;
use crate::interface_adapters::state::AppState;
use crate::use_cases::SessionError;

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use std::sync::Arc;

#[derive(Debug, serde::Deserialize)]
pub struct SessionInitRequest {
    session_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct SessionInitResponse {
    session_id: String,
}

pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SessionInitRequest>,
) -> Result<(StatusCode, Json<SessionInitResponse>), ApiError> {
    let session_id = payload.session_id.trim().to_string();
    if session_id.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "invalid_session_id",
            "session_id is required",
        ));
    }

    // Created sessions are not pinned and are removed on last disconnect.
    match state
        .session_registry
        .create_session(session_id.clone(), false)
        .await
    {
        Ok(session) => {
            // Serializer first so clients can subscribe immediately.
            spawn_session_serializer(&session);
            Ok((StatusCode::CREATED, Json(SessionInitResponse { session_id })))
        }
        Err(SessionError::AlreadyExists) => Err(error_response(
            StatusCode::CONFLICT,
            "session_exists",
            "session already exists",
        )),
    }
}
