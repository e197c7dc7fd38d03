//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::{ActivityTracker, AppState};
use crate::cache::session::SessionCache;
use crate::errors::BackendError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::workers::session_reaper;

/// Run the ServerGem backend until a stop condition fires, then drain
/// all services in order.
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), BackendError> {
    info!("Starting ServerGem backend...");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let services = match init(&options, &shutdown_tx).await {
        Ok(services) => services,
        Err(e) => {
            error!("Backend failed to start: {}", e);
            return Err(e);
        }
    };

    let tracker = services.app_state.activity_tracker.clone();
    let lifecycle = &options.lifecycle;

    if lifecycle.is_persistent {
        shutdown_signal.await;
        info!("Shutdown signal received, stopping...");
    } else {
        tokio::select! {
            _ = shutdown_signal => {
                info!("Shutdown signal received, stopping...");
            }
            _ = watch_idle(tracker, lifecycle) => {
                info!("No activity for {:?}, stopping...", lifecycle.idle_timeout);
            }
            _ = tokio::time::sleep(lifecycle.max_runtime) => {
                info!("Runtime limit of {:?} reached, stopping...", lifecycle.max_runtime);
            }
        }
    }

    ShutdownManager::new(shutdown_tx, lifecycle.clone(), services)
        .shutdown()
        .await
}

async fn watch_idle(tracker: Arc<ActivityTracker>, lifecycle: &LifecycleOptions) {
    loop {
        tokio::time::sleep(lifecycle.idle_timeout_poll_interval).await;
        if tracker.idle_for() >= lifecycle.idle_timeout {
            return;
        }
    }
}

// =============================== INITIALIZATION ================================== //

/// Handles to everything `init` started, in the order shutdown drains them
struct Services {
    reaper_handle: Option<JoinHandle<()>>,
    server_handle: JoinHandle<Result<(), BackendError>>,
    app_state: Arc<AppState>,
}

async fn init(
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
) -> Result<Services, BackendError> {
    let app_state = Arc::new(AppState::init(options)?);

    info!("Starting HTTP server...");
    let server_state = ServerState::new(
        app_state.sessions.clone(),
        app_state.monitoring.clone(),
        app_state.github.clone(),
        app_state.activity_tracker.clone(),
        options.deploy.clone(),
    );
    let mut server_rx = shutdown_tx.subscribe();
    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = server_rx.recv().await;
    })
    .await?;

    let reaper_handle = options.enable_reaper.then(|| {
        spawn_reaper(
            options.reaper.clone(),
            app_state.sessions.clone(),
            shutdown_tx.subscribe(),
        )
    });

    Ok(Services {
        reaper_handle,
        server_handle,
        app_state,
    })
}

fn spawn_reaper(
    options: session_reaper::Options,
    sessions: Arc<SessionCache>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    info!("Starting session reaper worker...");
    tokio::spawn(async move {
        session_reaper::run(
            &options,
            sessions.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    })
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle: LifecycleOptions,
    services: Services,
}

impl ShutdownManager {
    fn new(
        shutdown_tx: broadcast::Sender<()>,
        lifecycle: LifecycleOptions,
        services: Services,
    ) -> Self {
        Self {
            shutdown_tx,
            lifecycle,
            services,
        }
    }

    /// Broadcast the stop signal and drain every service, force-exiting
    /// if the drain exceeds the configured deadline.
    async fn shutdown(self) -> Result<(), BackendError> {
        let _ = self.shutdown_tx.send(());

        let deadline = self.lifecycle.max_shutdown_delay;
        match tokio::time::timeout(deadline, Self::drain(self.services)).await {
            Ok(result) => result,
            Err(_) => {
                error!("Services did not stop within {:?}, exiting", deadline);
                std::process::exit(1);
            }
        }
    }

    async fn drain(services: Services) -> Result<(), BackendError> {
        info!("Stopping backend services...");

        if let Some(handle) = services.reaper_handle {
            handle
                .await
                .map_err(|e| BackendError::ShutdownError(e.to_string()))?;
        }

        services
            .server_handle
            .await
            .map_err(|e| BackendError::ShutdownError(e.to_string()))??;

        services.app_state.shutdown().await?;

        info!("All services stopped");
        Ok(())
    }
}
