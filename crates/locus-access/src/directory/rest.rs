//! REST location service backend.
//!
//! `GET <base_url><path>` returns a JSON array of location objects in the
//! same shape as [`LocationRecord`].

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::LocationResult;
use crate::config::RestSourceConfig;
use crate::directory::LocationSource;
use crate::directory::http::{BackendClient, join_url};
use crate::error::LocationError;
use crate::record::LocationRecord;

/// Loads locations from a REST service.
pub struct RestSource {
    client: BackendClient,
    url: Url,
    custom_attribute_keys: Vec<String>,
}

impl RestSource {
    /// Creates a REST source.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(
        config: &RestSourceConfig,
        request_timeout: Duration,
        custom_attribute_keys: Vec<String>,
    ) -> LocationResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(LocationError::configuration(
                "directory.backend.base_url is required",
            ));
        }
        Ok(Self {
            client: BackendClient::new("rest", request_timeout, config.bearer_token.clone())?,
            url: join_url(&config.base_url, &config.path)?,
            custom_attribute_keys,
        })
    }
}

#[async_trait]
impl LocationSource for RestSource {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn fetch_all(&self) -> LocationResult<Vec<LocationRecord>> {
        // Per-item decode: a bad item is MalformedRecord, not BackendUnavailable.
        let items: Vec<serde_json::Value> = self.client.get_json(&self.url).await?;

        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let label = item
                    .get("id")
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| format!("#{idx}"));
                let record: LocationRecord = serde_json::from_value(item)
                    .map_err(|e| LocationError::malformed_record(&label, e.to_string()))?;
                if record.id == 0 {
                    return Err(LocationError::malformed_record(
                        label,
                        "location id must be positive",
                    ));
                }
                Ok(record.normalized(&self.custom_attribute_keys))
            })
            .collect()
    }
}
