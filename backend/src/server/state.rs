//! Server state

use std::sync::Arc;

use crate::app::state::ActivityTracker;
use crate::cache::session::SessionCache;
use crate::deploy::pipeline;
use crate::http::github::GithubClient;
use crate::monitoring::MonitoringService;

/// Server state shared across handlers
pub struct ServerState {
    pub sessions: Arc<SessionCache>,
    pub monitoring: Arc<MonitoringService>,
    pub github: Arc<GithubClient>,
    pub activity_tracker: Arc<ActivityTracker>,
    pub deploy_options: pipeline::Options,
}

impl ServerState {
    pub fn new(
        sessions: Arc<SessionCache>,
        monitoring: Arc<MonitoringService>,
        github: Arc<GithubClient>,
        activity_tracker: Arc<ActivityTracker>,
        deploy_options: pipeline::Options,
    ) -> Self {
        Self {
            sessions,
            monitoring,
            github,
            activity_tracker,
            deploy_options,
        }
    }
}
