//! Options tree assembled at startup

use std::time::Duration;

use secrecy::SecretString;

use crate::deploy::pipeline;
use crate::http::github;
use crate::workers::session_reaper;

/// Top-level backend options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Process lifecycle settings
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Enable the session reaper worker
    pub enable_reaper: bool,

    /// GitHub client options
    pub github: github::Options,

    /// GitHub API token
    pub github_token: Option<SecretString>,

    /// Deployment pipeline options
    pub deploy: pipeline::Options,

    /// Session cache options
    pub sessions: SessionOptions,

    /// Session reaper worker options
    pub reaper: session_reaper::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions::default(),
            enable_reaper: true,
            github: github::Options::default(),
            github_token: None,
            deploy: pipeline::Options::default(),
            sessions: SessionOptions::default(),
            reaper: session_reaper::Options::default(),
        }
    }
}

/// When and how the process stops
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Run until signalled; when false, idle/runtime limits apply
    pub is_persistent: bool,

    /// Stop after this much inactivity (transient mode)
    pub idle_timeout: Duration,

    /// How often the idle clock is checked
    pub idle_timeout_poll_interval: Duration,

    /// Hard cap on total runtime (transient mode)
    pub max_runtime: Duration,

    /// Grace period for draining services before force-exit
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            is_persistent: true,
            idle_timeout: Duration::from_secs(300), // 5 minutes
            idle_timeout_poll_interval: Duration::from_secs(10),
            max_runtime: Duration::from_secs(3600), // 1 hour
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Session cache options
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Maximum cached chat sessions
    pub capacity: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { capacity: 500 }
    }
}
