//! Meeting session endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::meeting::{MeetingPhase, MeetingState, MeetingStatusHandle};

#[derive(Debug, Clone, Copy)]
pub enum ApiCommand {
    Start,
    Stop,
    Cancel,
    Toggle,
}

#[derive(Clone)]
pub struct MeetingApiState {
    pub tx: mpsc::Sender<ApiCommand>,
    pub status: MeetingStatusHandle,
}

pub fn router(state: MeetingApiState) -> Router {
    Router::new()
        .route("/meetings/start", post(start_session))
        .route("/meetings/stop", post(stop_session))
        .route("/meetings/cancel", post(cancel_session))
        .route("/meetings/toggle", post(toggle_session))
        .route("/meetings/status", get(session_status))
        .with_state(state)
}

async fn start_session(
    State(state): State<MeetingApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    info!("Session start command received via API");
    let status = state.status.get().await;
    if status.phase.is_busy() {
        return Err(conflict(&status));
    }

    dispatch(&state, ApiCommand::Start).await?;

    let status = state.status.get().await;
    if status.phase == MeetingPhase::Recording {
        Ok(Json(json!({
            "success": true,
            "message": status.message,
            "session_id": status.session_id.map(|id| id.to_string()),
        })))
    } else {
        Err((
            StatusCode::CONFLICT,
            Json(json!({
                "success": false,
                "phase": status.phase,
                "message": "Recording did not start; check the service logs",
            })),
        ))
    }
}

async fn stop_session(
    State(state): State<MeetingApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    info!("Session stop command received via API");
    let status = state.status.get().await;
    if status.phase != MeetingPhase::Recording {
        return Err(conflict(&status));
    }

    dispatch(&state, ApiCommand::Stop).await?;

    let status = state.status.get().await;
    Ok(Json(json!({
        "success": status.phase != MeetingPhase::Error,
        "phase": status.phase,
        "message": status.message,
        "duration_seconds": status.duration_seconds(),
    })))
}

async fn cancel_session(
    State(state): State<MeetingApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    info!("Session cancel command received via API");
    let status = state.status.get().await;
    if status.phase != MeetingPhase::Recording {
        return Err(conflict(&status));
    }

    dispatch(&state, ApiCommand::Cancel).await?;

    let status = state.status.get().await;
    Ok(Json(json!({
        "success": true,
        "phase": status.phase,
        "message": status.message,
    })))
}

async fn toggle_session(
    State(state): State<MeetingApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    info!("Session toggle command received via API");
    dispatch(&state, ApiCommand::Toggle).await?;

    let status = state.status.get().await;
    Ok(Json(json!({
        "success": status.phase != MeetingPhase::Error,
        "phase": status.phase,
        "message": status.message,
    })))
}

async fn session_status(State(state): State<MeetingApiState>) -> Json<Value> {
    let status = state.status.get().await;
    Json(status_json(&status))
}

/// Hand the command to the machine loop and give it a moment to settle so
/// the response can report the updated state.
async fn dispatch(
    state: &MeetingApiState,
    command: ApiCommand,
) -> Result<(), (StatusCode, Json<Value>)> {
    if let Err(e) = state.tx.send(command).await {
        error!("Failed to dispatch API command: {}", e);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "service loop is gone" })),
        ));
    }
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    Ok(())
}

fn conflict(status: &MeetingState) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CONFLICT,
        Json(json!({
            "success": false,
            "phase": status.phase,
            "message": format!(
                "Cannot do that while the session is {}",
                status.phase.as_str()
            ),
        })),
    )
}

fn status_json(status: &MeetingState) -> Value {
    json!({
        "phase": status.phase,
        "message": status.message,
        "session_id": status.session_id.map(|id| id.to_string()),
        "started_at": status.started_at.map(|t| t.to_rfc3339()),
        "duration_seconds": status.duration_seconds(),
        "audio_path": status.audio_path.as_ref().map(|p| p.display().to_string()),
        "transcript_path": status.transcript_path.as_ref().map(|p| p.display().to_string()),
        "note_path": status.note_path.as_ref().map(|p| p.display().to_string()),
        "last_error": status.last_error,
    })
}
