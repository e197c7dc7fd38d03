//! Chat channel wire events.
//!
//! Every frame on the WebSocket chat channel is one of these shapes,
//! serialized as JSON with a `type` discriminator field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound message from a chat client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Assistant message body carried by [`ServerEvent::Message`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagePayload {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

/// Optional deployment context attached to an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MessageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

/// Incremental deployment status carried by [`ServerEvent::DeploymentUpdate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentUpdatePayload {
    /// Stage key the update refers to. Absent when the message text alone
    /// identifies the stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
}

/// Final deployment result carried by [`ServerEvent::DeploymentComplete`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentCompletePayload {
    pub url: String,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Outbound event from the backend to a chat client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected {
        session_id: String,
        message: String,
    },
    Typing {
        timestamp: DateTime<Utc>,
    },
    Message {
        data: MessagePayload,
        timestamp: DateTime<Utc>,
    },
    DeploymentUpdate {
        data: DeploymentUpdatePayload,
    },
    DeploymentComplete {
        content: String,
        deployment_url: String,
        data: DeploymentCompletePayload,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl ServerEvent {
    /// Assistant message with the current timestamp and no metadata.
    pub fn message_now(content: &str) -> Self {
        ServerEvent::Message {
            data: MessagePayload {
                content: content.to_string(),
                metadata: None,
            },
            timestamp: Utc::now(),
        }
    }

    /// Typing indicator with the current timestamp.
    pub fn typing_now() -> Self {
        ServerEvent::Typing {
            timestamp: Utc::now(),
        }
    }

    /// Error event with the current timestamp.
    pub fn error_now(message: &str, code: Option<&str>) -> Self {
        ServerEvent::Error {
            message: message.to_string(),
            code: code.map(|c| c.to_string()),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_event_tagged_by_type() {
        let event = ServerEvent::Connected {
            session_id: "sess-1234".to_string(),
            message: "welcome".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["session_id"], "sess-1234");
    }

    #[test]
    fn test_deployment_update_logs_default_when_missing() {
        let raw = r#"{
            "type": "deployment_update",
            "data": {"stage": "container_build", "progress": 72, "message": "Building... 50%"}
        }"#;
        let event: ServerEvent = serde_json::from_str(raw).unwrap();
        match event {
            ServerEvent::DeploymentUpdate { data } => {
                assert_eq!(data.stage.as_deref(), Some("container_build"));
                assert_eq!(data.progress, 72);
                assert!(data.logs.is_empty());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_error_code_skipped_when_none() {
        let event = ServerEvent::error_now("boom", None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert!(json.get("code").is_none());
    }

    #[test]
    fn test_deployment_complete_round_trip() {
        let event = ServerEvent::DeploymentComplete {
            content: "Deployment successful!".to_string(),
            deployment_url: "https://demo-abc123.run.app".to_string(),
            data: DeploymentCompletePayload {
                url: "https://demo-abc123.run.app".to_string(),
                service_name: "demo".to_string(),
                region: Some("us-central1".to_string()),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_client_message_without_session() {
        let raw = r#"{"content": "deploy https://github.com/acme/demo"}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert!(msg.session_id.is_none());
        assert!(msg.content.contains("github.com"));
    }
}
