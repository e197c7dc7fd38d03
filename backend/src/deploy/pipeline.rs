//! Deployment pipeline
//!
//! Runs a deployment end to end: clone, analyze, build, deploy. Progress
//! is reported by feeding the same free-text lines a human would read into
//! the progress feed, which classifies them into stage updates.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::deploy::{analyze, cloud, git};
use crate::errors::BackendError;
use crate::progress::feed::ProgressFeed;
use crate::utils::sanitize_service_name;

/// Pipeline options
#[derive(Debug, Clone)]
pub struct Options {
    pub workspace_dir: PathBuf,
    pub cloud: cloud::Options,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("/var/lib/servergem/workspaces"),
            cloud: cloud::Options::default(),
        }
    }
}

/// One deployment request
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub repo_url: String,
    pub branch: String,
    pub service_name: String,
}

/// Result of a successful deployment
#[derive(Debug, Clone)]
pub struct DeployedService {
    pub url: String,
    pub service_name: String,
    pub region: String,
}

/// Run the full deployment pipeline, reporting progress through `feed`
pub async fn run_pipeline(
    options: &Options,
    request: &DeployRequest,
    feed: &mut ProgressFeed,
) -> Result<DeployedService, BackendError> {
    let service_name = sanitize_service_name(&request.service_name);
    let progress = feed.initialize(&service_name);
    let target_dir = options.workspace_dir.join(&progress.id);

    info!(
        deployment_id = %progress.id,
        service = %service_name,
        repo = %request.repo_url,
        "Starting deployment pipeline"
    );

    feed.apply_line(&format!(
        "Cloning repository from {}...",
        request.repo_url
    ));
    git::clone_repository(&request.repo_url, &request.branch, &target_dir).await?;
    feed.apply_line("Repository cloned");

    feed.apply_line(&format!("Analyzing project at {}", target_dir.display()));
    let profile = analyze::analyze_project(&target_dir);
    feed.apply_line(&format!(
        "Analysis complete: {} project detected",
        profile.framework.name()
    ));

    feed.apply_line(&format!(
        "Generating Dockerfile for {}...",
        profile.framework.name()
    ));
    if !profile.has_dockerfile {
        feed.apply_line("Error: No Dockerfile found in repository");
        return Err(BackendError::DeployError(
            "No Dockerfile found in repository".to_string(),
        ));
    }
    feed.apply_line("Dockerfile ready");

    feed.apply_line("Running security scan...");
    let warnings = analyze::scan_for_secrets(&target_dir);
    for warning in &warnings {
        warn!(deployment_id = %progress.id, "{}", warning);
    }
    feed.apply_line(&format!("Scan complete: {} findings", warnings.len()));

    let image = format!("{}/{}", options.cloud.registry, service_name);
    feed.apply_line("Building container image...");
    cloud::submit_build(&target_dir, &image, |line| {
        feed.apply_line(line);
    })
    .await?;
    feed.apply_line("Build complete");

    feed.apply_line(&format!(
        "Deploying {} to {}...",
        service_name, options.cloud.region
    ));
    let url = cloud::deploy_service(&options.cloud, &service_name, &image).await?;
    feed.apply_line("Deployment successful");

    Ok(DeployedService {
        url,
        service_name,
        region: options.cloud.region.clone(),
    })
}
