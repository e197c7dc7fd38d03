//! Wire-format tests: the protocol crate against the backend state machine

use servergem::models::deployment::{DeploymentStatus, StageStatus};
use servergem::progress::stages::StageId;
use servergem::progress::tracker::ProgressTracker;
use servergem_protocol::{
    ClientMessage, DeploymentCompletePayload, DeploymentUpdatePayload, MessagePayload, ServerEvent,
};

#[test]
fn test_event_tags_match_wire_format() {
    let cases: [(ServerEvent, &str); 6] = [
        (
            ServerEvent::Connected {
                session_id: "sess-1".to_string(),
                message: "hello".to_string(),
            },
            "connected",
        ),
        (ServerEvent::typing_now(), "typing"),
        (ServerEvent::message_now("hi"), "message"),
        (
            ServerEvent::DeploymentUpdate {
                data: DeploymentUpdatePayload {
                    stage: None,
                    progress: 0,
                    message: "starting".to_string(),
                    logs: Vec::new(),
                },
            },
            "deployment_update",
        ),
        (
            ServerEvent::DeploymentComplete {
                content: "done".to_string(),
                deployment_url: "https://x.run.app".to_string(),
                data: DeploymentCompletePayload {
                    url: "https://x.run.app".to_string(),
                    service_name: "demo".to_string(),
                    region: None,
                },
            },
            "deployment_complete",
        ),
        (ServerEvent::error_now("boom", None), "error"),
    ];

    for (event, tag) in cases {
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], tag, "event: {:?}", event);
    }
}

#[test]
fn test_every_stage_key_is_addressable_over_the_wire() {
    let mut tracker = ProgressTracker::new();
    tracker.initialize("demo");

    for stage in StageId::ALL {
        let event = ServerEvent::DeploymentUpdate {
            data: DeploymentUpdatePayload {
                stage: Some(stage.key().to_string()),
                progress: stage.entry_progress(),
                message: format!("entering {}", stage.label()),
                logs: Vec::new(),
            },
        };
        let outcome = tracker.apply_event(&event);
        assert!(outcome.changed, "stage key not accepted: {}", stage.key());
    }

    let progress = tracker.snapshot().unwrap();
    for stage in StageId::ALL {
        assert_eq!(
            progress.stage(stage).unwrap().status,
            StageStatus::InProgress,
            "stage: {}",
            stage.key()
        );
    }
    assert_eq!(progress.progress, 85);
}

#[test]
fn test_stage_key_matches_serde_representation() {
    for stage in StageId::ALL {
        let json = serde_json::to_string(&stage).unwrap();
        assert_eq!(json, format!("\"{}\"", stage.key()));
    }
}

#[test]
fn test_snapshot_serializes_without_absent_fields() {
    let mut tracker = ProgressTracker::new();
    tracker.initialize("demo");

    let json = serde_json::to_value(tracker.snapshot().unwrap()).unwrap();
    assert_eq!(json["status"], "deploying");
    assert_eq!(json["progress"], 0);
    assert_eq!(json["stages"][0]["id"], "repo_access");
    assert_eq!(json["stages"][0]["status"], "waiting");
    assert!(json.get("current_stage").is_none());
    assert!(json.get("url").is_none());
    assert!(json.get("error").is_none());

    tracker.apply_event(&complete_event("https://demo.run.app"));
    let json = serde_json::to_value(tracker.snapshot().unwrap()).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["url"], "https://demo.run.app");
}

#[test]
fn test_raw_json_event_stream_drives_tracker() {
    let frames = [
        r#"{"type": "connected", "session_id": "sess-1", "message": "hello"}"#,
        r#"{"type": "deployment_update", "data": {"progress": 5, "message": "Cloning repository from https://github.com/acme/demo..."}}"#,
        r#"{"type": "deployment_update", "data": {"progress": 10, "message": "Repository cloned"}}"#,
        r#"{"type": "deployment_update", "data": {"stage": "container_build", "progress": 72, "message": "Building... 50%", "logs": ["Step 4/9 : COPY . ."]}}"#,
        r#"{"type": "deployment_complete", "content": "done", "deployment_url": "https://demo.run.app", "data": {"url": "https://demo.run.app", "service_name": "demo"}}"#,
    ];

    let mut tracker = ProgressTracker::new();
    tracker.initialize("demo");

    for frame in frames {
        let event: ServerEvent = serde_json::from_str(frame).unwrap();
        tracker.apply_event(&event);
    }

    let progress = tracker.snapshot().unwrap();
    assert_eq!(progress.status, DeploymentStatus::Success);
    assert_eq!(progress.progress, 100);
    assert_eq!(progress.url.as_deref(), Some("https://demo.run.app"));
    assert_eq!(
        progress.stage(StageId::RepoAccess).unwrap().status,
        StageStatus::Success
    );
    let build = progress.stage(StageId::ContainerBuild).unwrap();
    assert_eq!(build.status, StageStatus::InProgress);
    assert!(build.details.iter().any(|d| d.contains("COPY . .")));
}

#[test]
fn test_client_message_accepts_both_shapes() {
    let bare: ClientMessage =
        serde_json::from_str(r#"{"content": "deploy https://github.com/acme/demo"}"#).unwrap();
    assert!(bare.session_id.is_none());

    let with_session: ClientMessage = serde_json::from_str(
        r#"{"content": "status?", "session_id": "sess-abcdef123456"}"#,
    )
    .unwrap();
    assert_eq!(with_session.session_id.as_deref(), Some("sess-abcdef123456"));
}

#[test]
fn test_message_metadata_round_trips_through_value() {
    let event = ServerEvent::Message {
        data: MessagePayload {
            content: "Deploying your repository now.".to_string(),
            metadata: None,
        },
        timestamp: chrono::Utc::now(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert!(json["data"].get("metadata").is_none());

    let parsed: ServerEvent = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, event);
}

fn complete_event(url: &str) -> ServerEvent {
    ServerEvent::DeploymentComplete {
        content: format!("Deployment successful! Your service is live at {}", url),
        deployment_url: url.to_string(),
        data: DeploymentCompletePayload {
            url: url.to_string(),
            service_name: "demo".to_string(),
            region: Some("us-central1".to_string()),
        },
    }
}
