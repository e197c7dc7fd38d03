//! Shared service state and activity tracking

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::app::options::AppOptions;
use crate::cache::session::SessionCache;
use crate::errors::BackendError;
use crate::http::github::GithubClient;
use crate::monitoring::MonitoringService;

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Records when the service last did useful work, for idle-timeout detection
pub struct ActivityTracker {
    last_active: AtomicU64,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            last_active: AtomicU64::new(unix_now()),
        }
    }

    pub fn mark_active(&self) {
        self.last_active.store(unix_now(), Ordering::SeqCst);
    }

    /// Time elapsed since the last recorded activity
    pub fn idle_for(&self) -> Duration {
        let last = self.last_active.load(Ordering::SeqCst);
        Duration::from_secs(unix_now().saturating_sub(last))
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Services shared across the server and workers
pub struct AppState {
    /// Chat session cache
    pub sessions: Arc<SessionCache>,

    /// Deployment monitoring
    pub monitoring: Arc<MonitoringService>,

    /// GitHub metadata client
    pub github: Arc<GithubClient>,

    /// Activity tracker
    pub activity_tracker: Arc<ActivityTracker>,
}

impl AppState {
    /// Wire up the shared services
    pub fn init(options: &AppOptions) -> Result<Self, BackendError> {
        info!("Wiring up shared services...");

        Ok(Self {
            sessions: Arc::new(SessionCache::new(options.sessions.capacity)),
            monitoring: Arc::new(MonitoringService::new()),
            github: Arc::new(GithubClient::new(
                options.github.clone(),
                options.github_token.clone(),
            )?),
            activity_tracker: Arc::new(ActivityTracker::new()),
        })
    }

    /// Release shared services on shutdown
    pub async fn shutdown(&self) -> Result<(), BackendError> {
        info!("Releasing shared services...");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_tracker_starts_fresh() {
        let tracker = ActivityTracker::new();
        assert!(tracker.idle_for() < Duration::from_secs(2));
    }

    #[test]
    fn test_mark_active_resets_idle_clock() {
        let tracker = ActivityTracker::new();
        tracker.last_active.store(0, Ordering::SeqCst);
        assert!(tracker.idle_for() > Duration::from_secs(60));
        tracker.mark_active();
        assert!(tracker.idle_for() < Duration::from_secs(2));
    }
}
