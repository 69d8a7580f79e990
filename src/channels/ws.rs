//! WebSocket chat transport + health endpoint.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dialog::{Choice, Inbound, Response};
use crate::error::ChannelError;
use crate::orchestrator::{Orchestrator, SessionRouteState, session_routes};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the Axum router with the chat WebSocket and REST routes.
pub fn chat_routes(orchestrator: Arc<Orchestrator>) -> Router {
    let sessions = session_routes(SessionRouteState {
        orchestrator: Arc::clone(&orchestrator),
    });
    let state = AppState { orchestrator };

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
        .merge(sessions)
        .layer(CorsLayer::permissive())
}

// ── Wire format ─────────────────────────────────────────────────────────

/// Messages sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    PlainMessage {
        content: String,
        timestamp: DateTime<Utc>,
    },
    ButtonedMessage {
        content: String,
        buttons: Vec<Choice>,
        timestamp: DateTime<Utc>,
    },
    /// Tells the client to show the name prompt again.
    ResetToMain {
        content: String,
        timestamp: DateTime<Utc>,
    },
}

impl From<Response> for ServerMessage {
    fn from(response: Response) -> Self {
        let timestamp = Utc::now();
        match response {
            Response::Message { text } => Self::PlainMessage {
                content: text,
                timestamp,
            },
            Response::Buttons { text, choices } => Self::ButtonedMessage {
                content: text,
                buttons: choices,
                timestamp,
            },
            Response::Control { text, .. } => Self::ResetToMain {
                content: text,
                timestamp,
            },
        }
    }
}

/// A JSON frame from the client. Button clicks carry `value`; typed text
/// arrives as `text` or `content`.
#[derive(Debug, Deserialize)]
struct ClientFrame {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Decode a text frame. Anything that is not a JSON object is plain text.
pub fn parse_client_frame(raw: &str) -> Result<Inbound, ChannelError> {
    let Ok(frame) = serde_json::from_str::<ClientFrame>(raw) else {
        return Ok(Inbound::text(raw));
    };
    if let Some(value) = frame.value {
        return Ok(Inbound::Choice {
            value,
            label: frame.label,
        });
    }
    frame
        .text
        .or(frame.content)
        .map(Inbound::Text)
        .ok_or_else(|| ChannelError::InvalidMessage("frame has no value, text or content".into()))
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lead-assist"
    }))
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    debug!("WebSocket client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.orchestrator))
}

async fn send(socket: &mut WebSocket, response: Response) -> bool {
    match serde_json::to_string(&ServerMessage::from(response)) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize outbound message");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, orchestrator: Arc<Orchestrator>) {
    let session_id = Uuid::new_v4().to_string();
    info!(session_id, "WebSocket client connected");

    let greeting = orchestrator.open(&session_id).await;
    if !send(&mut socket, greeting).await {
        warn!(session_id, "Failed to send greeting, client disconnected");
        orchestrator.close(&session_id).await;
        return;
    }

    loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => {
                let inbound = match parse_client_frame(&text) {
                    Ok(inbound) => inbound,
                    Err(e) => {
                        debug!(session_id, error = %e, "Unrecognized WS message from client");
                        continue;
                    }
                };
                let response = orchestrator.advance(&session_id, &inbound).await;
                if !send(&mut socket, response).await {
                    debug!(session_id, "Client disconnected during send");
                    break;
                }
            }
            Some(Ok(Message::Ping(data))) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                info!(session_id, "WebSocket client disconnected");
                break;
            }
            Some(Err(e)) => {
                warn!(session_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    orchestrator.close(&session_id).await;
    debug!(session_id, "WebSocket connection closed");
}
