//! Thin reqwest wrapper for outbound API calls

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::BackendError;

/// HTTP client for external API calls
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpClient {
    /// Build a client rooted at `base_url`, optionally authenticated
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("servergem")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        self.execute("GET", path, request).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let request = self.client.post(format!("{}{}", self.base_url, path)).json(body);
        self.execute("POST", path, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        mut request: RequestBuilder,
    ) -> Result<T, BackendError> {
        debug!("{} {}{}", method, self.base_url, path);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} {} returned {}: {}", method, path, status, body);
            return Err(BackendError::ApiError(format!("{}: {}", status, body)));
        }

        Ok(response.json().await?)
    }
}
