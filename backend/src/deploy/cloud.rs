//! Cloud CLI execution
//!
//! Drives the cloud provider CLI for container builds and service
//! deployments, streaming build output line by line to the caller.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::BackendError;

/// Cloud deployment options
#[derive(Debug, Clone)]
pub struct Options {
    pub region: String,
    pub registry: String,
    pub allow_unauthenticated: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            region: "us-central1".to_string(),
            registry: "gcr.io/servergem".to_string(),
            allow_unauthenticated: true,
        }
    }
}

/// Submit a container build, forwarding each output line to `on_line`
pub async fn submit_build(
    dir: &Path,
    image: &str,
    mut on_line: impl FnMut(&str),
) -> Result<(), BackendError> {
    info!("Submitting container build for {}", image);

    let mut child = Command::new("gcloud")
        .current_dir(dir)
        .args(["builds", "submit", "--tag", image, "--quiet"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BackendError::DeployError(format!("Failed to run gcloud builds: {}", e)))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| BackendError::DeployError("No stdout from build process".to_string()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| BackendError::DeployError("No stderr from build process".to_string()))?;

    // stderr must drain while stdout is being read, or the child blocks
    // on a full pipe
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf).await;
        buf
    });

    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| BackendError::DeployError(format!("Failed reading build output: {}", e)))?
    {
        debug!("build: {}", line);
        on_line(&line);
    }

    let status = child
        .wait()
        .await
        .map_err(|e| BackendError::DeployError(format!("Build process failed: {}", e)))?;
    let stderr_output = stderr_task.await.unwrap_or_default();

    if !status.success() {
        return Err(BackendError::DeployError(format!(
            "Container build failed: {}",
            stderr_output.trim()
        )));
    }

    Ok(())
}

/// Deploy a built image as a managed service, returning its public URL
pub async fn deploy_service(
    options: &Options,
    service_name: &str,
    image: &str,
) -> Result<String, BackendError> {
    info!("Deploying {} to region {}", service_name, options.region);

    let mut args = vec![
        "run",
        "deploy",
        service_name,
        "--image",
        image,
        "--region",
        &options.region,
        "--quiet",
    ];
    if options.allow_unauthenticated {
        args.push("--allow-unauthenticated");
    }

    let status = Command::new("gcloud")
        .args(&args)
        .status()
        .await
        .map_err(|e| BackendError::DeployError(format!("Failed to run gcloud deploy: {}", e)))?;

    if !status.success() {
        return Err(BackendError::DeployError(
            "Cloud deployment failed".to_string(),
        ));
    }

    let output = Command::new("gcloud")
        .args([
            "run",
            "services",
            "describe",
            service_name,
            "--region",
            &options.region,
            "--format",
            "value(status.url)",
        ])
        .output()
        .await
        .map_err(|e| BackendError::DeployError(format!("Failed to read service URL: {}", e)))?;

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if url.is_empty() {
        return Err(BackendError::DeployError(
            "Deployed service has no URL".to_string(),
        ));
    }

    Ok(url)
}
