//! Progress change feed
//!
//! Wraps a [`ProgressTracker`] with a broadcast channel so that interested
//! tasks receive a fresh snapshot after every apply that changed state.

use servergem_protocol::ServerEvent;
use tokio::sync::broadcast;

use crate::models::deployment::DeploymentProgress;
use crate::progress::classifier::ClassifiedUpdate;
use crate::progress::tracker::{ApplyOutcome, ProgressTracker};

/// Tracker plus snapshot broadcast
#[derive(Debug)]
pub struct ProgressFeed {
    tracker: ProgressTracker,
    tx: broadcast::Sender<DeploymentProgress>,
}

impl ProgressFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tracker: ProgressTracker::new(),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeploymentProgress> {
        self.tx.subscribe()
    }

    pub fn initialize(&mut self, service_name: &str) -> DeploymentProgress {
        let progress = self.tracker.initialize(service_name);
        let _ = self.tx.send(progress.clone());
        progress
    }

    pub fn apply_line(&mut self, line: &str) -> ApplyOutcome {
        let outcome = self.tracker.apply_line(line);
        self.publish_if(outcome);
        outcome
    }

    pub fn apply_update(&mut self, update: ClassifiedUpdate) -> ApplyOutcome {
        let outcome = self.tracker.apply_update(update);
        self.publish_if(outcome);
        outcome
    }

    pub fn apply_event(&mut self, event: &ServerEvent) -> ApplyOutcome {
        let outcome = self.tracker.apply_event(event);
        self.publish_if(outcome);
        outcome
    }

    pub fn snapshot(&self) -> Option<DeploymentProgress> {
        self.tracker.snapshot()
    }

    pub fn is_terminal(&self) -> bool {
        self.tracker.is_terminal()
    }

    fn publish_if(&self, outcome: ApplyOutcome) {
        if outcome.changed {
            if let Some(snapshot) = self.tracker.snapshot() {
                // Send fails only when no subscriber is listening.
                let _ = self.tx.send(snapshot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publishes_only_on_change() {
        tokio_test::block_on(async {
            let mut feed = ProgressFeed::new(8);
            let mut rx = feed.subscribe();

            feed.initialize("demo");
            assert_eq!(rx.recv().await.unwrap().progress, 0);

            feed.apply_line("Repository cloned");
            assert_eq!(rx.recv().await.unwrap().progress, 15);

            feed.apply_line("lorem ipsum dolor sit amet");
            assert!(rx.try_recv().is_err());
        });
    }
}
