//! HTTP source for exports served by a blob store's HTTP endpoint.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use super::{BlobLocation, BlobSource, RetryPolicy};
use crate::config::{DEFAULT_MAX_RESPONSE_SIZE, HTTP_TIMEOUT_SECS};
use crate::error::{ExportError, Result};

/// User agent string identifying this extractor.
const USER_AGENT: &str = concat!("health-export/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download content from a URL with retry logic.
///
/// Uses the policy's exponential backoff for transient failures (connection
/// errors, timeouts, 5xx responses). A 404 maps to `ExportError::NotFound` for the
/// given location; other 4xx responses fail immediately.
pub fn download_bytes(
    client: &Client,
    url: &str,
    location: &BlobLocation,
    max_size: u64,
    policy: RetryPolicy,
) -> Result<Vec<u8>> {
    let max_retries = policy.max_attempts.max(1);
    let mut last_error: Option<String> = None;

    for attempt in 0..max_retries {
        if attempt > 0 {
            let delay = policy.delay_before(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying after delay");
            thread::sleep(delay);
        }

        match client.get(url).send() {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        status = %status,
                        attempt = attempt + 1,
                        max_retries,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                if status == StatusCode::NOT_FOUND {
                    return Err(ExportError::NotFound {
                        container: location.container.clone(),
                        key: location.key.clone(),
                    });
                }

                let response = response.error_for_status()?;

                if let Some(size) = response.content_length() {
                    if size > max_size {
                        return Err(ExportError::ResponseTooLarge {
                            size,
                            limit: max_size,
                        });
                    }
                }

                let bytes = response.bytes()?;
                let size = bytes.len() as u64;
                if size > max_size {
                    return Err(ExportError::ResponseTooLarge {
                        size,
                        limit: max_size,
                    });
                }
                return Ok(bytes.to_vec());
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_retries,
                        "Connection error, will retry"
                    );
                    last_error = Some(e.to_string());
                    continue;
                }
                return Err(ExportError::Http(e));
            }
        }
    }

    Err(ExportError::RetriesExhausted {
        attempts: max_retries,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Reads blobs from `<base_url>/<container>/<key>`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    max_size: u64,
    retry: RetryPolicy,
}

impl HttpSource {
    /// Create a source with the default client and size limit.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_size: DEFAULT_MAX_RESPONSE_SIZE,
            retry: RetryPolicy::default(),
        })
    }

    /// Override the maximum accepted response size.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Override how failed downloads are retried.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// URL of a blob.
    #[must_use]
    pub fn url_for(&self, location: &BlobLocation) -> String {
        format!("{}/{}/{}", self.base_url, location.container, location.key)
    }
}

impl BlobSource for HttpSource {
    fn fetch(&self, location: &BlobLocation) -> Result<Vec<u8>> {
        let url = self.url_for(location);
        tracing::info!(url = %url, "Fetching export");
        download_bytes(&self.client, &url, location, self.max_size, self.retry)
    }
}
