//! Deployment progress tracker
//!
//! Owns the canonical `DeploymentProgress` for one deployment attempt and
//! folds classified lines and typed events into it. The tracker enforces
//! the state invariants: overall progress never decreases, stages never
//! move backwards, and a terminal deployment status never changes.

use chrono::Utc;
use servergem_protocol::ServerEvent;
use tracing::warn;

use crate::models::deployment::{
    DeploymentError, DeploymentProgress, DeploymentStatus, StageStatus,
};
use crate::progress::classifier::{classify, ClassifiedUpdate};
use crate::progress::stages::StageId;

/// What one apply call changed, edge-triggered.
///
/// `just_succeeded` and `just_failed` fire exactly once, on the apply that
/// moved the deployment into that terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub changed: bool,
    pub just_succeeded: bool,
    pub just_failed: bool,
}

/// Single-writer state machine for one deployment attempt
#[derive(Debug, Default)]
pub struct ProgressTracker {
    progress: Option<DeploymentProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the deployment state, or return the existing one.
    ///
    /// Idempotent while a deployment is running: repeat calls are no-ops.
    /// After a terminal state a new call starts a fresh attempt.
    pub fn initialize(&mut self, service_name: &str) -> DeploymentProgress {
        match &mut self.progress {
            Some(progress) if progress.status == DeploymentStatus::Deploying => progress.clone(),
            slot => {
                let fresh = DeploymentProgress::new(service_name);
                *slot = Some(fresh.clone());
                fresh
            }
        }
    }

    /// Classify a free-text line and fold the result in.
    ///
    /// Lines the classifier does not recognize leave the state untouched.
    pub fn apply_line(&mut self, line: &str) -> ApplyOutcome {
        match classify(line) {
            Some(update) => self.apply_update(update),
            None => ApplyOutcome::default(),
        }
    }

    /// Fold a structured update into the deployment state
    pub fn apply_update(&mut self, update: ClassifiedUpdate) -> ApplyOutcome {
        let Some(progress) = self.progress.as_mut() else {
            warn!("progress update before initialization dropped");
            return ApplyOutcome::default();
        };
        if progress.is_terminal() {
            return ApplyOutcome::default();
        }

        let mut changed = false;

        let target = update.stage.or(progress.current_stage);
        if let Some(stage_id) = target {
            changed |= fold_stage(progress, stage_id, update.status, &update.details);
        }

        if let Some(pct) = update.progress {
            let pct = pct.min(100);
            if pct > progress.progress {
                progress.progress = pct;
                changed = true;
            }
        }

        ApplyOutcome {
            changed,
            ..ApplyOutcome::default()
        }
    }

    /// Dispatch a typed wire event into the deployment state
    pub fn apply_event(&mut self, event: &ServerEvent) -> ApplyOutcome {
        match event {
            ServerEvent::Connected { .. } | ServerEvent::Typing { .. } => ApplyOutcome::default(),
            ServerEvent::Message { data, .. } => self.apply_line(&data.content),
            ServerEvent::DeploymentUpdate { data } => {
                let update = match data.stage.as_deref() {
                    Some(key) => match StageId::from_key(key) {
                        Some(stage_id) => {
                            let mut details = vec![data.message.clone()];
                            details.extend(data.logs.iter().cloned());
                            ClassifiedUpdate {
                                stage: Some(stage_id),
                                status: StageStatus::InProgress,
                                details,
                                progress: Some(data.progress),
                            }
                        }
                        None => {
                            warn!(stage = key, "unknown stage reference ignored");
                            return ApplyOutcome::default();
                        }
                    },
                    None => {
                        let mut update =
                            classify(&data.message).unwrap_or_else(|| ClassifiedUpdate {
                                stage: None,
                                status: StageStatus::InProgress,
                                details: vec![data.message.clone()],
                                progress: None,
                            });
                        update.progress =
                            Some(update.progress.unwrap_or(0).max(data.progress));
                        update
                    }
                };
                self.apply_update(update)
            }
            ServerEvent::DeploymentComplete {
                deployment_url,
                data,
                ..
            } => self.complete(if data.url.is_empty() {
                deployment_url
            } else {
                &data.url
            }),
            ServerEvent::Error { message, code, .. } => self.fail(message, code.as_deref()),
        }
    }

    /// Mark the deployment as successfully completed
    pub fn complete(&mut self, url: &str) -> ApplyOutcome {
        let Some(progress) = self.progress.as_mut() else {
            warn!("completion event before initialization dropped");
            return ApplyOutcome::default();
        };
        if progress.is_terminal() {
            warn!(
                status = %progress.status,
                "terminal event after terminal state dropped (protocol violation)"
            );
            return ApplyOutcome::default();
        }

        progress.status = DeploymentStatus::Success;
        progress.progress = 100;
        progress.url = Some(url.to_string());
        progress.error = None;

        ApplyOutcome {
            changed: true,
            just_succeeded: true,
            just_failed: false,
        }
    }

    /// Mark the deployment as failed, attributing the error to the
    /// currently active stage
    pub fn fail(&mut self, message: &str, code: Option<&str>) -> ApplyOutcome {
        let Some(progress) = self.progress.as_mut() else {
            warn!("error event before initialization dropped");
            return ApplyOutcome::default();
        };
        if progress.is_terminal() {
            warn!(
                status = %progress.status,
                "terminal event after terminal state dropped (protocol violation)"
            );
            return ApplyOutcome::default();
        }

        let stage = progress.current_stage;
        if let Some(stage_id) = stage {
            fold_stage(progress, stage_id, StageStatus::Error, &[message.to_string()]);
        }

        progress.status = DeploymentStatus::Failed;
        progress.error = Some(DeploymentError {
            message: message.to_string(),
            stage,
            code: code.map(|c| c.to_string()),
            auto_fixable: false,
            rollback_offered: false,
        });

        ApplyOutcome {
            changed: true,
            just_succeeded: false,
            just_failed: true,
        }
    }

    /// Copy of the current deployment state, if initialized
    pub fn snapshot(&self) -> Option<DeploymentProgress> {
        self.progress.clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.progress.as_ref().is_some_and(|p| p.is_terminal())
    }
}

/// Fold a status observation into one stage. Returns whether anything
/// changed.
fn fold_stage(
    progress: &mut DeploymentProgress,
    stage_id: StageId,
    status: StageStatus,
    details: &[String],
) -> bool {
    // An in-progress report for a stage that a later stage has already
    // moved past is stale output arriving out of order. Keep the detail
    // lines, skip the transition.
    let stale_entry = status == StageStatus::InProgress
        && progress
            .stages
            .iter()
            .any(|s| s.id > stage_id && s.status != StageStatus::Waiting);

    let Some(idx) = progress.stages.iter().position(|s| s.id == stage_id) else {
        warn!(stage = %stage_id, "unknown stage reference ignored");
        return false;
    };

    let mut changed = false;
    let now = Utc::now();
    {
        let stage = &mut progress.stages[idx];
        match (stage.status, status) {
            (StageStatus::Waiting, StageStatus::InProgress) if !stale_entry => {
                stage.status = StageStatus::InProgress;
                stage.started_at = Some(now);
                changed = true;
            }
            (StageStatus::Waiting, StageStatus::Success) => {
                // Completion observed without a start: backfill the start
                // at the completion timestamp.
                stage.status = StageStatus::Success;
                stage.started_at = Some(now);
                stage.ended_at = Some(now);
                changed = true;
            }
            (StageStatus::Waiting, StageStatus::Error) => {
                stage.status = StageStatus::Error;
                stage.started_at = Some(now);
                stage.ended_at = Some(now);
                changed = true;
            }
            (StageStatus::InProgress, StageStatus::Success)
            | (StageStatus::InProgress, StageStatus::Error) => {
                stage.status = status;
                stage.ended_at = Some(now);
                changed = true;
            }
            _ => {}
        }

        for detail in details {
            if !detail.is_empty() {
                stage.details.push(detail.clone());
                changed = true;
            }
        }
    }

    if status == StageStatus::InProgress
        && !stale_entry
        && progress.stages[idx].status == StageStatus::InProgress
        && progress.current_stage != Some(stage_id)
    {
        progress.current_stage = Some(stage_id);
        changed = true;
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_creates_waiting_stages() {
        let mut tracker = ProgressTracker::new();
        let progress = tracker.initialize("demo");
        assert_eq!(progress.service_name, "demo");
        assert_eq!(progress.stages.len(), 6);
        assert!(progress
            .stages
            .iter()
            .all(|s| s.status == StageStatus::Waiting));
        assert_eq!(progress.progress, 0);
        assert_eq!(progress.status, DeploymentStatus::Deploying);
    }

    #[test]
    fn test_initialize_is_idempotent_while_deploying() {
        let mut tracker = ProgressTracker::new();
        let first = tracker.initialize("demo");
        tracker.apply_line("Cloning repository...");
        let second = tracker.initialize("other");
        assert_eq!(second.id, first.id);
        assert_eq!(second.service_name, "demo");
    }

    #[test]
    fn test_apply_before_initialize_is_dropped() {
        let mut tracker = ProgressTracker::new();
        let outcome = tracker.apply_line("Cloning repository...");
        assert_eq!(outcome, ApplyOutcome::default());
        assert!(tracker.snapshot().is_none());
    }
}
