//! Session reaper worker for idle chat sessions

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::session::SessionCache;

/// Session reaper worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Sweep interval
    pub interval: Duration,

    /// Initial delay before first sweep
    pub initial_delay: Duration,

    /// Idle time after which a session is evicted
    pub max_idle: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            initial_delay: Duration::from_secs(30),
            max_idle: Duration::from_secs(1800), // 30 minutes
        }
    }
}

/// Run the session reaper worker
pub async fn run<S, F>(
    options: &Options,
    sessions: &SessionCache,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Session reaper worker starting...");

    // Initial delay
    sleep_fn(options.initial_delay).await;

    loop {
        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Session reaper worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with sweep
            }
        }

        let evicted = sessions.evict_idle(options.max_idle);
        if evicted > 0 {
            debug!("Evicted {} idle sessions", evicted);
        }
    }
}
