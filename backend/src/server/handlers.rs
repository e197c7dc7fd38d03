//! HTTP request handlers

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use http::StatusCode;
use serde::Serialize;

use crate::models::chat::{ChatRequest, ChatResponse, ChatSession, ChatTurn};
use crate::monitoring::MonitoringStats;
use crate::server::state::ServerState;
use crate::telemetry::{collect_metrics, SystemMetrics};
use crate::utils::{extract_repo_url, generate_session_id, version_info};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "servergem".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Stats response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub active_sessions: usize,
    pub deployments: MonitoringStats,
    pub system: SystemMetrics,
}

/// Stats handler
pub async fn stats_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.activity_tracker.mark_active();

    Json(StatsResponse {
        active_sessions: state.sessions.len(),
        deployments: state.monitoring.stats(),
        system: collect_metrics(),
    })
}

/// One-shot chat handler
pub async fn chat_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    state.activity_tracker.mark_active();

    let message = request.message.trim();
    if message.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let session_id = match request.session_id {
        Some(id) if state.sessions.get(&id).is_some() => id,
        _ => {
            let id = generate_session_id();
            state.sessions.insert(ChatSession::new(&id));
            id
        }
    };
    state.sessions.push_turn(&session_id, ChatTurn::user(message));

    let response = match extract_repo_url(message) {
        Some(repo_url) => format!(
            "Ready to deploy {}. Open a WebSocket session at /ws/chat to follow the deployment live.",
            repo_url
        ),
        None => "Share a GitHub repository URL and I will deploy it for you.".to_string(),
    };
    state
        .sessions
        .push_turn(&session_id, ChatTurn::assistant(&response));

    Ok(Json(ChatResponse {
        response,
        session_id,
        timestamp: chrono::Utc::now(),
    }))
}
