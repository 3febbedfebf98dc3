//! HTTP plumbing shared by the directory backends.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::LocationResult;
use crate::error::LocationError;

/// JSON-over-HTTP client bound to one backend.
///
/// Transport failures, non-success statuses and unparseable or empty bodies
/// are all reported as `BackendUnavailable`.
pub(crate) struct BackendClient {
    http: reqwest::Client,
    backend: &'static str,
    bearer_token: Option<String>,
}

impl BackendClient {
    pub(crate) fn new(
        backend: &'static str,
        timeout: Duration,
        bearer_token: Option<String>,
    ) -> LocationResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                LocationError::configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            backend,
            bearer_token,
        })
    }

    /// GETs `url` and decodes the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> LocationResult<T> {
        let response = self.send(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(format!("{url} returned HTTP {status}")));
        }
        self.decode(url, response).await
    }

    /// Like [`get_json`](Self::get_json), but a 404 is `Ok(None)`.
    pub(crate) async fn get_json_optional<T: DeserializeOwned>(
        &self,
        url: &Url,
    ) -> LocationResult<Option<T>> {
        let response = self.send(url).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(self.unavailable(format!("{url} returned HTTP {status}")));
        }
        self.decode(url, response).await.map(Some)
    }

    async fn send(&self, url: &Url) -> LocationResult<reqwest::Response> {
        tracing::debug!(backend = self.backend, %url, "Fetching locations");

        let mut request = self
            .http
            .get(url.as_str())
            .header("Accept", "application/json");
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        request
            .send()
            .await
            .map_err(|e| self.unavailable(format!("request to {url} failed: {e}")))
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        url: &Url,
        response: reqwest::Response,
    ) -> LocationResult<T> {
        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(format!("failed to read body from {url}: {e}")))?;
        if body.trim().is_empty() {
            return Err(self.unavailable(format!("{url} returned an empty body")));
        }
        serde_json::from_str(&body)
            .map_err(|e| self.unavailable(format!("failed to parse body from {url}: {e}")))
    }

    fn unavailable(&self, message: String) -> LocationError {
        LocationError::backend_unavailable(self.backend, message)
    }
}

/// Joins `path` onto `base`, keeping any path the base already carries.
pub(crate) fn join_url(base: &str, path: &str) -> LocationResult<Url> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined)
        .map_err(|e| LocationError::configuration(format!("invalid URL '{joined}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_keeps_base_path() {
        let url = join_url("https://idp.example.com/admin/realms/acme/", "/clients/abc/roles")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://idp.example.com/admin/realms/acme/clients/abc/roles"
        );

        let url = join_url("https://inventory.example.com", "locations").unwrap();
        assert_eq!(url.as_str(), "https://inventory.example.com/locations");
    }

    #[test]
    fn test_join_url_rejects_garbage() {
        assert!(join_url("not a url", "/x").is_err());
    }
}
