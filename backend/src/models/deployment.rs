//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::stages::StageId;
use crate::utils::generate_deployment_id;

/// Lifecycle status of a single pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Waiting,
    InProgress,
    Success,
    Error,
}

impl StageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageStatus::Success | StageStatus::Error)
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StageStatus::Waiting => "waiting",
            StageStatus::InProgress => "in_progress",
            StageStatus::Success => "success",
            StageStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// One stage of a deployment, with its observed history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub label: String,
    pub status: StageStatus,
    pub details: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Stage {
    pub fn new(id: StageId) -> Self {
        Self {
            id,
            label: id.label().to_string(),
            status: StageStatus::Waiting,
            details: Vec::new(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Wall-clock duration of the stage, when both timestamps are set
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// Overall status of a deployment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Deploying,
    Success,
    Failed,
}

impl DeploymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Success | DeploymentStatus::Failed)
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Structured failure report attached to a failed deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub auto_fixable: bool,
    pub rollback_offered: bool,
}

/// Canonical state of one deployment attempt.
///
/// Overall progress only ever increases; each stage moves forward through
/// waiting, in_progress and a terminal status; once the deployment itself
/// is terminal the state no longer changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentProgress {
    pub id: String,
    pub service_name: String,
    pub stages: Vec<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<StageId>,
    pub progress: u8,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
    pub status: DeploymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DeploymentError>,
}

impl DeploymentProgress {
    pub fn new(service_name: &str) -> Self {
        Self {
            id: generate_deployment_id(),
            service_name: service_name.to_string(),
            stages: StageId::ALL.iter().map(|id| Stage::new(*id)).collect(),
            current_stage: None,
            progress: 0,
            started_at: Utc::now(),
            eta_seconds: None,
            status: DeploymentStatus::Deploying,
            url: None,
            error: None,
        }
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
