use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use vibe_core::types::{BoredomMessage, GlobalState, VisualMetrics};

use crate::hub::Hub;
use crate::store::StateStore;
use crate::upstream::RelaySender;

/// First frame every subscriber receives.
pub const WELCOME_FRAME: &str = r#"{"type":"WELCOME","message":"VIBES WS GATEWAY ACTIVE"}"#;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StateStore>,
    pub hub: Arc<Hub>,
    pub relay: RelaySender,
    pub shutdown: CancellationToken,
}

#[derive(Debug, Serialize)]
struct Envelope<T> {
    status: &'static str,
    message: &'static str,
    data: T,
}

fn success<T: Serialize>(message: &'static str, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        status: "success",
        message,
        data,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/v1/vibe/status", get(vibe_status))
        .route("/api/v1/vibe/latest", get(vibe_latest))
        .route("/api/v1/telemetry/visual", get(visual_latest).post(visual_record))
        .fallback(not_found)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    success(
        "System Operational",
        json!({ "timestamp": chrono::Utc::now().to_rfc3339() }),
    )
}

#[derive(Debug, Serialize)]
struct VibeStatus {
    vibe_score: i64,
    chaos_level: i64,
    active_connections: usize,
    uptime: f64,
    live_telemetry: Option<Value>,
}

fn percent(state: Option<&Value>, field: &str) -> i64 {
    state
        .and_then(|s| s.get(field))
        .and_then(Value::as_f64)
        .map(|v| (v * 100.0).round() as i64)
        .unwrap_or(0)
}

async fn vibe_status(State(app): State<AppState>) -> impl IntoResponse {
    let live = app.store.latest();
    let status = VibeStatus {
        vibe_score: percent(live.as_ref(), "low_energy"),
        chaos_level: percent(live.as_ref(), "glitch_factor"),
        active_connections: app.hub.len(),
        uptime: app.store.uptime_secs(),
        live_telemetry: live,
    };
    success("Vibe status retrieved (Live Telemetry)", status)
}

async fn vibe_latest(State(app): State<AppState>) -> impl IntoResponse {
    match app.store.latest() {
        Some(state) => success("Latest vibe state", state),
        None => success(
            "No backend state received yet",
            serde_json::to_value(GlobalState::offline()).unwrap_or(Value::Null),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct VisualPayload {
    #[serde(default)]
    fps: Option<f32>,
    #[serde(default)]
    resolution: Option<String>,
}

async fn visual_record(
    State(app): State<AppState>,
    Json(body): Json<VisualPayload>,
) -> impl IntoResponse {
    let metrics = VisualMetrics {
        fps: body.fps.unwrap_or(0.0),
        resolution: body.resolution.unwrap_or_else(|| "0x0".into()),
    };
    success("Visual telemetry received", app.store.record_visual(metrics))
}

async fn visual_latest(State(app): State<AppState>) -> impl IntoResponse {
    success("Latest visual telemetry retrieved", app.store.visual())
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "message": "Route not found" })),
    )
}

async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_subscriber(socket, app))
}

async fn handle_subscriber(socket: WebSocket, app: AppState) {
    let mut sub = app.hub.subscribe();
    let id = sub.id;
    let (mut sink, mut stream) = socket.split();

    if sink.send(Message::Text(WELCOME_FRAME.into())).await.is_err() {
        app.hub.unsubscribe(id);
        return;
    }

    loop {
        tokio::select! {
            _ = app.shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            outbound = sub.rx.recv() => {
                let Some(text) = outbound else { break };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::debug!(%id, error = %e, "subscriber write failed");
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let text = text.as_str();
                    tracing::debug!(%id, len = text.len(), "subscriber frame");
                    app.hub.broadcast_except(id, text);
                    relay_upstream(&app.relay, text);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(%id, error = %e, "subscriber socket error");
                    break;
                }
            },
        }
    }
    app.hub.unsubscribe(id);
}

/// Only boredom reports travel to the backend; every other frame stays local.
fn relay_upstream(relay: &RelaySender, text: &str) {
    if BoredomMessage::parse(text).is_none() {
        return;
    }
    match relay.try_send(text.to_owned()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => tracing::debug!("backend relay full, boredom report dropped"),
        Err(TrySendError::Closed(_)) => tracing::debug!("backend relay closed"),
    }
}
