//! Chat session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A chat session and its transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub turns: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
}

impl ChatSession {
    pub fn new(id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            created_at: now,
            last_active_at: now,
            turns: Vec::new(),
            deployment_id: None,
        }
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    pub fn push_turn(&mut self, turn: ChatTurn) {
        self.last_active_at = turn.timestamp;
        self.turns.push(turn);
    }
}

/// One-shot chat request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// One-shot chat response body
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}
