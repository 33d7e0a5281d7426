//! Chat API endpoints.
//!
//! One-shot turns return the whole answer; streamed turns are sent as SSE
//! events shaped like `{"type": "text", "content": "..."}`.

use axum::{
    Json,
    extract::State,
    response::{Sse, sse::Event, sse::KeepAlive},
};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;
use uuid::Uuid;

use crate::error::I18nError;
use crate::service::TurnRequest;

use super::AppState;

/// Response for POST /api/chat/send
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub response: String,
    pub conversation_id: String,
}

/// POST /api/chat/send - answer one turn
pub async fn send_handler(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<TurnRequest>,
) -> Result<Json<SendResponse>, I18nError> {
    let conversation_id = request
        .conversation_id
        .get_or_insert_with(|| Uuid::new_v4().to_string())
        .clone();

    let response = state
        .service
        .respond(request)
        .await
        .map_err(|e| state.i18n_error(e))?;

    Ok(Json(SendResponse {
        response,
        conversation_id,
    }))
}

/// POST /api/chat/stream - answer one turn as server-sent events
pub async fn stream_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TurnRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(conversation_id = ?request.conversation_id, "Streaming chat turn");

    let events = ReceiverStream::new(state.service.respond_stream(request)).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| {
            r#"{"type":"error","content":"unserializable event"}"#.to_string()
        });
        Ok::<_, Infallible>(Event::default().data(data))
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
