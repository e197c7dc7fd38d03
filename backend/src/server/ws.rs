//! WebSocket chat sessions
//!
//! Each connection gets its own chat session and, when the user shares a
//! repository URL, its own deployment. The deployment runs in a spawned
//! task; progress snapshots flow back over the feed's broadcast channel
//! and are forwarded to the client as typed events.

use std::sync::Arc;

use axum::{
    extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use servergem_protocol::{ClientMessage, DeploymentUpdatePayload, ServerEvent};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::deploy::pipeline::{run_pipeline, DeployRequest};
use crate::errors::BackendError;
use crate::models::chat::{ChatSession, ChatTurn};
use crate::models::deployment::DeploymentProgress;
use crate::progress::feed::ProgressFeed;
use crate::server::state::ServerState;
use crate::utils::{extract_repo_url, generate_session_id, parse_repo_parts};

type WsSender = SplitSink<WebSocket, WsMessage>;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| chat_session(socket, state))
}

/// Run one chat session over a WebSocket connection
async fn chat_session(socket: WebSocket, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = socket.split();

    let session_id = generate_session_id();
    state.sessions.insert(ChatSession::new(&session_id));
    state.activity_tracker.mark_active();
    info!(session = %session_id, "Chat session opened");

    let connected = ServerEvent::Connected {
        session_id: session_id.clone(),
        message: "Connected to ServerGem. Share a GitHub repository URL to deploy it."
            .to_string(),
    };
    if let Err(e) = send_event(&mut sender, &connected).await {
        warn!(session = %session_id, "Failed to greet client: {}", e);
        state.sessions.remove(&session_id);
        return;
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(WsMessage::Text(text)) => {
                if let Err(e) = handle_text(&state, &session_id, &text, &mut sender).await {
                    warn!(session = %session_id, "Chat turn failed: {}", e);
                    break;
                }
            }
            Ok(WsMessage::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    state.sessions.remove(&session_id);
    info!(session = %session_id, "Chat session closed");
}

/// Handle one inbound text frame
async fn handle_text(
    state: &Arc<ServerState>,
    session_id: &str,
    text: &str,
    sender: &mut WsSender,
) -> Result<(), BackendError> {
    state.activity_tracker.mark_active();

    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(parsed) => parsed.content,
        Err(_) => text.to_string(),
    };
    state
        .sessions
        .push_turn(session_id, ChatTurn::user(&message));

    let Some(repo_url) = extract_repo_url(&message) else {
        let reply = "Share a GitHub repository URL and I will deploy it for you.";
        state
            .sessions
            .push_turn(session_id, ChatTurn::assistant(reply));
        return send_event(sender, &ServerEvent::message_now(reply)).await;
    };

    send_event(sender, &ServerEvent::typing_now()).await?;

    let Some((owner, repo)) = parse_repo_parts(&repo_url) else {
        return send_event(
            sender,
            &ServerEvent::error_now("Could not parse the repository URL", None),
        )
        .await;
    };

    let branch = match state.github.get_repo(&owner, &repo).await {
        Ok(info) => info.default_branch,
        Err(e) => {
            warn!(
                "Could not fetch metadata for {}/{}: {}, assuming main",
                owner, repo, e
            );
            "main".to_string()
        }
    };

    let request = DeployRequest {
        repo_url,
        branch,
        service_name: repo,
    };
    run_deployment(state, session_id, request, sender).await
}

/// Drive one deployment, forwarding progress to the client
async fn run_deployment(
    state: &Arc<ServerState>,
    session_id: &str,
    request: DeployRequest,
    sender: &mut WsSender,
) -> Result<(), BackendError> {
    let feed = ProgressFeed::new(64);
    let mut rx = feed.subscribe();

    let options = state.deploy_options.clone();
    let mut task = tokio::spawn(async move {
        let mut feed = feed;
        let result = run_pipeline(&options, &request, &mut feed).await;
        (feed, result)
    });

    let mut started = false;
    let (mut feed, result) = loop {
        tokio::select! {
            snapshot = rx.recv() => match snapshot {
                Ok(snapshot) => {
                    if !started {
                        started = true;
                        state
                            .monitoring
                            .record_started(&snapshot.id, &snapshot.service_name);
                        state.sessions.set_deployment(session_id, &snapshot.id);
                    }
                    forward_snapshot(sender, &snapshot).await?;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(session = %session_id, skipped, "Progress feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {}
            },
            joined = &mut task => {
                break joined
                    .map_err(|e| BackendError::DeployError(e.to_string()))?;
            }
        }
    };

    // Snapshots published between the last recv and task completion
    while let Ok(snapshot) = rx.try_recv() {
        forward_snapshot(sender, &snapshot).await?;
    }

    let deployment_id = feed.snapshot().map(|p| p.id).unwrap_or_default();

    match result {
        Ok(service) => {
            let event = ServerEvent::DeploymentComplete {
                content: format!(
                    "Deployment successful! Your service is live at {}",
                    service.url
                ),
                deployment_url: service.url.clone(),
                data: servergem_protocol::DeploymentCompletePayload {
                    url: service.url,
                    service_name: service.service_name,
                    region: Some(service.region),
                },
            };
            let outcome = feed.apply_event(&event);
            if outcome.just_succeeded {
                state.monitoring.record_finished(&deployment_id, true, None);
            }
            send_event(sender, &event).await?;
        }
        Err(e) => {
            let message = e.to_string();
            let event = ServerEvent::error_now(&message, Some("DEPLOY_FAILED"));
            let outcome = feed.apply_event(&event);
            if outcome.just_failed {
                state
                    .monitoring
                    .record_finished(&deployment_id, false, Some(&message));
            }
            send_event(sender, &event).await?;
        }
    }

    Ok(())
}

/// Forward one progress snapshot as a deployment_update event
async fn forward_snapshot(
    sender: &mut WsSender,
    snapshot: &DeploymentProgress,
) -> Result<(), BackendError> {
    let message = snapshot
        .current_stage
        .and_then(|id| snapshot.stage(id))
        .and_then(|s| s.details.last().cloned())
        .unwrap_or_else(|| format!("Deploying {}", snapshot.service_name));

    let event = ServerEvent::DeploymentUpdate {
        data: DeploymentUpdatePayload {
            stage: snapshot.current_stage.map(|s| s.key().to_string()),
            progress: snapshot.progress,
            message,
            logs: Vec::new(),
        },
    };
    send_event(sender, &event).await
}

/// Serialize and send one event frame
async fn send_event(sender: &mut WsSender, event: &ServerEvent) -> Result<(), BackendError> {
    let payload = serde_json::to_string(event)?;
    sender
        .send(WsMessage::Text(payload.into()))
        .await
        .map_err(|e| BackendError::ServerError(e.to_string()))
}
