// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! Async HTTP client wrapping reqwest.
//!
//! Handles redirects, timeouts, retry on 5xx and transport errors, and
//! backoff on 429. Status interpretation is left to the caller.

use std::time::Duration;

use tracing::debug;

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP client shared by the manifest fetcher and the page resolver.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: u32,
    retry_base: Duration,
}

impl HttpClient {
    /// Create a client whose requests time out after `timeout_ms`.
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("tocharvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            max_retries: 2,
            retry_base: Duration::from_millis(500),
        }
    }

    /// Override the retry budget and the base delay of the exponential backoff.
    pub fn with_retries(mut self, max_retries: u32, retry_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base = retry_base;
        self
    }

    /// Perform a GET request with retry on 5xx and backoff on 429.
    ///
    /// Non-success statuses that survive the retries are returned as a
    /// response, not an error.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        self.send(url, self.max_retries).await
    }

    /// Perform a single GET request. Failures and statuses are returned as-is.
    pub async fn get_once(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        self.send(url, 0).await
    }

    async fn send(&self, url: &str, max_retries: u32) -> Result<HttpResponse, reqwest::Error> {
        let mut retries = 0u32;

        loop {
            match self.client.get(url).send().await {
                Ok(r) => {
                    let status = r.status().as_u16();

                    if status >= 500 && retries < max_retries {
                        retries += 1;
                        debug!("{url} returned {status}, retry {retries}");
                        tokio::time::sleep(self.backoff(retries)).await;
                        continue;
                    }

                    if status == 429 && retries < max_retries {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .map(Duration::from_secs)
                            .unwrap_or_else(|| self.backoff(retries));
                        debug!("{url} rate limited, retry {retries} in {retry_after:?}");
                        tokio::time::sleep(retry_after.min(Duration::from_secs(10))).await;
                        continue;
                    }

                    let final_url = r.url().to_string();
                    let body = r.bytes().await?.to_vec();

                    return Ok(HttpResponse {
                        url: url.to_string(),
                        final_url,
                        status,
                        body,
                    });
                }
                Err(e) => {
                    if retries < max_retries && !e.is_builder() {
                        retries += 1;
                        debug!("{url} failed ({e}), retry {retries}");
                        tokio::time::sleep(self.backoff(retries)).await;
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base * 2u32.pow(attempt.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(10_000);
        assert_eq!(client.max_retries, 2);
    }

    #[test]
    fn test_backoff_doubles() {
        let client = HttpClient::new(10_000).with_retries(3, Duration::from_millis(100));
        assert_eq!(client.backoff(1), Duration::from_millis(100));
        assert_eq!(client.backoff(2), Duration::from_millis(200));
        assert_eq!(client.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_success_range() {
        let mut resp = HttpResponse {
            url: "https://example.com".to_string(),
            final_url: "https://example.com".to_string(),
            status: 204,
            body: Vec::new(),
        };
        assert!(resp.is_success());
        resp.status = 404;
        assert!(!resp.is_success());
    }
}
