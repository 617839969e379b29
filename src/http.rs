//! Blocking HTTP access shared by the provider clients
//!
//! Every fetch unit (one week or one day) is one GET request with a timeout
//! and no retry. What happens to a unit that fails is decided by the
//! [`FailurePolicy`].

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, Result};

/// Handling of fetch units that fail (non-200 status or network error)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log a warning and leave the unit's rows out of the result
    #[default]
    Skip,
    /// Fail the whole request with the unit's error
    Abort,
}

/// Thin wrapper around a blocking reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    policy: FailurePolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, policy: FailurePolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self { client, policy })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.request_timeout(), config.failure_policy)
    }

    /// GET `url` and return the body of a 200 response
    ///
    /// Any other status is an [`ApiError::HttpError`], regardless of policy.
    pub fn fetch_text(&self, url: &str) -> std::result::Result<String, ApiError> {
        debug!("GET {}", redact(url));

        let response = self.client.get(url).send()?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ApiError::HttpError {
                status: status.as_u16(),
                url: redact(url),
            });
        }

        Ok(response.text()?)
    }

    /// GET `url` for one fetch unit, applying the failure policy
    ///
    /// # Returns
    ///
    /// - `Ok(Some(body))` for a 200 response
    /// - `Ok(None)` for a failed unit under [`FailurePolicy::Skip`]
    /// - `Err(..)` for a failed unit under [`FailurePolicy::Abort`]
    pub fn get_text(&self, url: &str) -> Result<Option<String>> {
        match self.fetch_text(url) {
            Ok(body) => Ok(Some(body)),
            Err(e) => match self.policy {
                FailurePolicy::Skip => {
                    warn!("Skipping fetch unit: {}", e);
                    Ok(None)
                }
                FailurePolicy::Abort => Err(e.into()),
            },
        }
    }
}

/// Mask the BMRS API key before a URL ends up in logs or errors
fn redact(url: &str) -> String {
    const KEY_PARAM: &str = "APIKey=";

    match url.find(KEY_PARAM) {
        Some(pos) => {
            let value_start = pos + KEY_PARAM.len();
            let value_end = url[value_start..]
                .find('&')
                .map_or(url.len(), |offset| value_start + offset);
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}
