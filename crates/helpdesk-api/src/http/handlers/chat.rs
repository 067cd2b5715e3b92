//! Chat HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/chat/active - List the caller's chats (empty for guests)
//! - POST   /api/v1/chat/start  - Start a chat for an organization
//! - POST   /api/v1/chat/msg    - Send a question, get the reply
//! - POST   /api/v1/chat/load   - Load a page of history before a cursor
//! - DELETE /api/v1/chat/{id}   - Delete a chat

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_types::chat::{HistoryPage, MessageView, SessionView};
use helpdesk_types::organization::OrganizationRef;

use crate::http::error::AppError;
use crate::http::extractors::identity::{Caller, GuestCookie};
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

type Reply<T> = Result<(GuestCookie, ApiResponse<T>), AppError>;

#[derive(Debug, Deserialize)]
pub struct StartChatRequest {
    pub org: OrganizationRef,
    pub title: String,
}

/// `isAsk` and `createdAt` may be sent by older clients; the server ignores
/// them and stamps its own values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub chat_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadHistoryRequest {
    pub chat_id: Uuid,
    /// Oldest `createdAt` the client already holds; omit for the newest page.
    #[serde(default)]
    pub last_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DeletedChat {
    pub id: Uuid,
    pub deleted: bool,
}

/// GET /api/v1/chat/active
///
/// A missing or unusable credential yields an empty list rather than an error.
pub async fn list_active(
    State(state): State<AppState>,
    caller: Result<Caller, AppError>,
) -> Reply<Vec<SessionView>> {
    let clock = RequestClock::start();

    let Ok(caller) = caller else {
        return Ok((GuestCookie::default(), clock.respond(Vec::new())));
    };

    let sessions = state.chat_service.active(&caller.identity).await?;
    Ok((caller.guest_cookie, clock.respond(sessions)))
}

/// POST /api/v1/chat/start
pub async fn start_chat(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<StartChatRequest>,
) -> Reply<SessionView> {
    let clock = RequestClock::start();

    let session = state
        .chat_service
        .start(&caller.identity, body.org.id, &body.title)
        .await?;

    let self_link = format!("/api/v1/chat/{}", session.id);
    Ok((
        caller.guest_cookie,
        clock.respond(session).with_link("self", &self_link),
    ))
}

/// POST /api/v1/chat/msg
///
/// The exchange runs on its own task: if the client disconnects mid-answer
/// the question and reply are still stored.
pub async fn send_message(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<SendMessageRequest>,
) -> Reply<MessageView> {
    let clock = RequestClock::start();

    let service = Arc::clone(&state.chat_service);
    let identity = caller.identity.clone();
    let reply = tokio::spawn(async move {
        service
            .send(&identity, body.chat_id, &body.content)
            .await
    })
    .await
    .map_err(|e| AppError::Internal(format!("message task failed: {e}")))??;

    Ok((caller.guest_cookie, clock.respond(reply)))
}

/// POST /api/v1/chat/load
pub async fn load_history(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<LoadHistoryRequest>,
) -> Reply<HistoryPage> {
    let clock = RequestClock::start();

    let page = state
        .chat_service
        .load(&caller.identity, &body.chat_id, body.last_time)
        .await?;

    Ok((caller.guest_cookie, clock.respond(page)))
}

/// DELETE /api/v1/chat/{id}
pub async fn delete_chat(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Reply<DeletedChat> {
    let clock = RequestClock::start();
    let id = parse_uuid(&id)?;

    state.chat_service.delete(&caller.identity, &id).await?;

    Ok((
        caller.guest_cookie,
        clock.respond(DeletedChat { id, deleted: true }),
    ))
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid chat id: {s}")))
}
