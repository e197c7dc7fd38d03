//! Utility functions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Version information for the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version, git hash and build time baked in at compile time
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Retry cooldown settings
#[derive(Debug, Clone)]
pub struct CooldownOptions {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for CooldownOptions {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(300), // 5 minutes
            multiplier: 2.0,
        }
    }
}

/// Delay before retry `attempt`, growing geometrically up to the cap
pub fn calc_exp_backoff(options: &CooldownOptions, attempt: u32) -> Duration {
    let scaled = options.base_delay.as_secs_f64() * options.multiplier.powi(attempt as i32);
    Duration::from_secs_f64(scaled.min(options.max_delay.as_secs_f64()))
}

/// Generate a deployment identifier, "dep-" plus 12 hex characters
pub fn generate_deployment_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("dep-{}", &uuid[..12])
}

/// Generate a chat session identifier, "sess-" plus 12 hex characters
pub fn generate_session_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("sess-{}", &uuid[..12])
}

/// Sanitize a name for use as a cloud service identifier.
///
/// Lowercases, keeps alphanumerics, folds separators to single hyphens,
/// strips leading and trailing hyphens, truncates to 63 characters.
pub fn sanitize_service_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
        } else if matches!(c, '-' | '_' | '.' | ' ') && !result.is_empty() && !result.ends_with('-')
        {
            result.push('-');
        }
    }
    let trimmed: String = result.trim_end_matches('-').chars().take(63).collect();
    let trimmed = trimmed.trim_end_matches('-').to_string();
    if trimmed.is_empty() {
        "service".to_string()
    } else {
        trimmed
    }
}

/// Extract a GitHub repository URL from free text.
///
/// Returns the normalized `https://github.com/{owner}/{repo}` form, or
/// `None` when the text contains no repository reference.
pub fn extract_repo_url(text: &str) -> Option<String> {
    let start = text.find("github.com/")?;
    let tail = &text[start + "github.com/".len()..];
    let end = tail
        .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | ')' | '(' | ',' | '>' | '<'))
        .unwrap_or(tail.len());
    let path = tail[..end].trim_end_matches(['.', '!', '?']);
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(format!("https://github.com/{}/{}", owner, repo))
}

/// Split a normalized repository URL into (owner, repo)
pub fn parse_repo_parts(repo_url: &str) -> Option<(String, String)> {
    let parsed = url::Url::parse(repo_url).ok()?;
    let mut segments = parsed.path_segments()?;
    let owner = segments.next()?.to_string();
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo).to_string();
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner, repo))
}
