//! GitHub repository metadata client

use secrecy::SecretString;
use serde::Deserialize;
use tracing::warn;

use crate::errors::BackendError;
use crate::http::client::HttpClient;
use crate::utils::{calc_exp_backoff, CooldownOptions};

/// Repository metadata returned by the GitHub API
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    pub default_branch: String,
    pub private: bool,
    pub html_url: String,
}

/// GitHub client options
#[derive(Debug, Clone)]
pub struct Options {
    pub api_base_url: String,
    pub max_attempts: u32,
    pub cooldown: CooldownOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            max_attempts: 3,
            cooldown: CooldownOptions::default(),
        }
    }
}

/// GitHub metadata client with retry
pub struct GithubClient {
    http: HttpClient,
    options: Options,
}

impl GithubClient {
    pub fn new(options: Options, token: Option<SecretString>) -> Result<Self, BackendError> {
        let http = HttpClient::new(&options.api_base_url, token)?;
        Ok(Self { http, options })
    }

    /// Fetch repository metadata, retrying transient failures with
    /// exponential backoff
    pub async fn get_repo(&self, owner: &str, repo: &str) -> Result<RepoInfo, BackendError> {
        let path = format!("/repos/{}/{}", owner, repo);

        let mut attempt = 0;
        loop {
            match self.http.get::<RepoInfo>(&path).await {
                Ok(info) => return Ok(info),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.options.max_attempts {
                        return Err(err);
                    }
                    let delay = calc_exp_backoff(&self.options.cooldown, attempt);
                    warn!(
                        "GitHub request for {}/{} failed (attempt {}): {}, retrying in {:?}",
                        owner, repo, attempt, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
