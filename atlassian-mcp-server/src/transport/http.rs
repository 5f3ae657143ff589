//! Streamable HTTP and SSE front-ends
//!
//! Both decode JSON-RPC messages, build an [`InvocationContext`] from the
//! request headers and hand off to [`handle_message`].

use super::jsonrpc::{handle_message, parse_error};
use crate::config::{AtlassianConfig, TransportKind};
use crate::context::InvocationContext;
use crate::registry::ToolRegistry;
use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SESSION_HEADER: &str = "mcp-session-id";

type SessionMap = HashMap<String, mpsc::Sender<Event>>;
type Sessions = Arc<RwLock<SessionMap>>;

#[derive(Clone)]
pub struct AppState {
    registry: Arc<ToolRegistry>,
    sessions: Sessions,
}

fn read(sessions: &Sessions) -> RwLockReadGuard<'_, SessionMap> {
    sessions.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(sessions: &Sessions) -> RwLockWriteGuard<'_, SessionMap> {
    sessions.write().unwrap_or_else(PoisonError::into_inner)
}

/// Router for one HTTP transport kind. `/health` is always present.
pub fn router(registry: Arc<ToolRegistry>, kind: TransportKind) -> Router {
    let state = AppState {
        registry,
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    let routes = Router::new().route("/health", get(health));
    let routes = match kind {
        TransportKind::Sse => routes
            .route("/sse", get(sse_connect))
            .route("/message", post(sse_message)),
        _ => routes.route(
            "/mcp",
            post(mcp_post)
                .get(|| async { StatusCode::METHOD_NOT_ALLOWED })
                .delete(|| async { StatusCode::OK }),
        ),
    };
    routes.with_state(state)
}

/// Bind and serve until the listener fails
pub async fn serve(config: &AtlassianConfig, registry: Arc<ToolRegistry>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    match config.transport {
        TransportKind::Sse => info!("SSE transport listening on http://{}/sse", addr),
        _ => info!("Streamable HTTP transport listening on http://{}/mcp", addr),
    }

    axum::serve(listener, router(registry, config.transport))
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn mcp_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(parse_error(e))).into_response(),
    };

    let initialize = message.get("method").and_then(Value::as_str) == Some("initialize");
    let ctx = InvocationContext::from_headers(&headers);

    let Some(reply) = handle_message(&state.registry, message, ctx).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    let mut response = Json(reply).into_response();
    if initialize {
        let session_id = Uuid::new_v4().to_string();
        debug!("New streamable HTTP session {}", session_id);
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
    }
    response
}

/// Removes its session when the event stream is dropped
struct SessionGuard {
    id: String,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        write(&self.sessions).remove(&self.id);
        debug!("SSE session {} closed", self.id);
    }
}

async fn sse_connect(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel::<Event>(64);

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/message?sessionId={}", session_id));
    // Fresh channel with capacity; cannot fail.
    let _ = tx.try_send(endpoint);

    write(&state.sessions).insert(session_id.clone(), tx);
    info!("SSE session {} opened", session_id);

    let guard = SessionGuard {
        id: session_id,
        sessions: Arc::clone(&state.sessions),
    };
    let stream = ReceiverStream::new(rx).map(move |event| {
        let _session = &guard;
        Ok::<_, Infallible>(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

async fn sse_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let sender = read(&state.sessions).get(&query.session_id).cloned();
    let Some(sender) = sender else {
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(parse_error(e))).into_response(),
    };

    let ctx = InvocationContext::from_headers(&headers);
    if let Some(reply) = handle_message(&state.registry, message, ctx).await {
        let event = Event::default().event("message").data(reply.to_string());
        if sender.send(event).await.is_err() {
            warn!("SSE session {} went away before its response", query.session_id);
        }
    }
    StatusCode::ACCEPTED.into_response()
}
