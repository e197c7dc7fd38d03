//! Git repository access

use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::BackendError;

/// Clone a repository, or pull if the target directory already exists
pub async fn clone_repository(
    repo_url: &str,
    branch: &str,
    target_dir: &Path,
) -> Result<(), BackendError> {
    info!(
        "Fetching repository: {} (branch: {}) to {}",
        repo_url,
        branch,
        target_dir.display()
    );

    if target_dir.exists() {
        debug!("Target directory exists, pulling updates...");
        let status = Command::new("git")
            .current_dir(target_dir)
            .args(["pull", "origin", branch])
            .status()
            .await
            .map_err(|e| BackendError::DeployError(format!("Failed to run git pull: {}", e)))?;

        if !status.success() {
            return Err(BackendError::DeployError("Git pull failed".to_string()));
        }
    } else {
        debug!("Cloning repository to {}...", target_dir.display());
        let target = target_dir.to_string_lossy();
        let status = Command::new("git")
            .args(["clone", "--depth", "1", "-b", branch, repo_url, &target])
            .status()
            .await
            .map_err(|e| BackendError::DeployError(format!("Failed to run git clone: {}", e)))?;

        if !status.success() {
            return Err(BackendError::DeployError("Git clone failed".to_string()));
        }
    }

    Ok(())
}
