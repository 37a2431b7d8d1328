//! OPNsense REST API Client
//!
//! This module provides the client every collector uses to talk to the OPNsense
//! management API.
//!
//! # Architecture
//!
//! - **Endpoints**: collectors ask for a logical endpoint name (`"arp"`,
//!   `"cronJobs"`, ...); the client resolves it against its endpoint mapping.
//!   An unknown name fails the call before anything goes on the wire.
//! - **Authentication**: HTTP basic auth with the API key/secret pair on every request
//! - **Connection pools**: one `reqwest::Client` tuned for short, frequent calls and a
//!   second one with a long timeout for the rare, expensive firmware refresh
//! - **Retries**: transport failures (refused, timed out, TLS) are retried up to
//!   [`MAX_RETRIES`] times with a short fixed delay. A received response, whatever
//!   its status, ends the attempt loop.
//!
//! # Example
//!
//! ```no_run
//! use opnsense_exporter::config::OpnSenseConfig;
//! use opnsense_exporter::opnsense::OpnSenseClient;
//! use secrecy::SecretString;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = OpnSenseConfig {
//!     protocol: "https".to_string(),
//!     host: "opnsense.local".to_string(),
//!     api_key: SecretString::from("key"),
//!     api_secret: SecretString::from("secret"),
//!     api_key_file: None,
//!     api_secret_file: None,
//!     insecure: true,
//! };
//!
//! let client = OpnSenseClient::new(&config)?;
//! let services = client.fetch_services().await?;
//! println!("{} services running", services.total_running);
//! # Ok(())
//! # }
//! ```

use crate::config::OpnSenseConfig;
use crate::opnsense::endpoints::{self, default_endpoints};
use crate::opnsense::error::FetchError;
use crate::opnsense::health::HealthCheckResponse;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONTENT_TYPE};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of attempts for a call on the short-call pool
pub const MAX_RETRIES: u32 = 3;

/// Pause between two attempts after a transport failure
pub const RETRY_DELAY: Duration = Duration::from_millis(25);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const LONG_RUNNING_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Client for the OPNsense REST API
///
/// Built once at startup and shared by every collector task. Both connection pools
/// are safe for concurrent use, so the client needs no locking of its own.
pub struct OpnSenseClient {
    http: reqwest::Client,
    long_running_http: reqwest::Client,
    endpoints: BTreeMap<String, String>,
    base_url: String,
    api_key: String,
    api_secret: SecretString,
}

impl OpnSenseClient {
    /// Build a client using the stock endpoint mapping
    pub fn new(config: &OpnSenseConfig) -> crate::error::Result<Self> {
        Self::with_endpoints(config, default_endpoints())
    }

    /// Build a client with an explicit endpoint mapping (logical name → API path)
    pub fn with_endpoints(
        config: &OpnSenseConfig,
        endpoints: BTreeMap<String, String>,
    ) -> crate::error::Result<Self> {
        Ok(Self {
            http: build_http_client(config.insecure, REQUEST_TIMEOUT)?,
            long_running_http: build_http_client(config.insecure, LONG_RUNNING_TIMEOUT)?,
            endpoints,
            base_url: config.base_url(),
            api_key: config.api_key.expose_secret().to_string(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// All endpoints the client knows about, keyed by logical name
    pub fn endpoints(&self) -> &BTreeMap<String, String> {
        &self.endpoints
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call `endpoint` on the short-call pool and decode the JSON body into `T`
    ///
    /// # Errors
    ///
    /// - unknown endpoint name: status code 0, no request sent
    /// - every attempt failed at the transport level: status code 0
    /// - body could not be read or decompressed: received status code
    /// - non-2xx response: received status code, message is the raw body
    /// - 2xx response that does not decode into `T`: received status code
    pub async fn fetch<T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&str>,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let path = self.resolve(endpoint)?;
        self.do_with_client(&self.http, MAX_RETRIES, method, endpoint, path, body)
            .await
    }

    /// Same as [`fetch`](Self::fetch) but on the long-call pool, with a single attempt
    pub async fn fetch_long_running<T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&str>,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let path = self.resolve(endpoint)?;
        self.do_with_client(&self.long_running_http, 1, method, endpoint, path, body)
            .await
    }

    /// Query the system status used as the liveness check
    pub async fn health_check(&self) -> Result<HealthCheckResponse, FetchError> {
        self.fetch(Method::GET, endpoints::HEALTH_CHECK, None).await
    }

    /// Ask OPNsense to re-check for firmware updates.
    ///
    /// This takes 30s+ on the appliance, so it goes through the long-call pool and
    /// is never retried. Do not call it on every scrape.
    pub async fn trigger_firmware_status_update(&self) -> Result<(), FetchError> {
        let _: serde_json::Value = self
            .fetch_long_running(Method::POST, endpoints::FIRMWARE, Some("{}"))
            .await?;
        Ok(())
    }

    fn resolve(&self, endpoint: &str) -> Result<&str, FetchError> {
        self.endpoints
            .get(endpoint)
            .map(String::as_str)
            .ok_or_else(|| FetchError::endpoint_not_found(endpoint))
    }

    fn build_request(
        &self,
        client: &reqwest::Client,
        method: &Method,
        url: &str,
        body: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut request = client
            .request(method.clone(), url)
            .basic_auth(&self.api_key, Some(self.api_secret.expose_secret()));

        if *method == Method::POST {
            request = request.header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json;charset=utf-8"),
            );
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }
        request
    }

    async fn do_with_client<T>(
        &self,
        client: &reqwest::Client,
        max_attempts: u32,
        method: Method,
        endpoint: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!(endpoint, url = %url, method = %method, "fetching data");

        let response = send_with_retries(endpoint, max_attempts, RETRY_DELAY, || {
            self.build_request(client, &method, &url, body).send()
        })
        .await
        .ok_or_else(|| {
            FetchError::new(
                endpoint,
                format!("max retries reached after {} attempts", max_attempts),
                0,
            )
        })?;

        decode_response(endpoint, response).await
    }
}

fn build_http_client(insecure: bool, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));

    reqwest::Client::builder()
        .user_agent(concat!(
            "prometheus-opnsense-exporter/",
            env!("CARGO_PKG_VERSION")
        ))
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .danger_accept_invalid_certs(insecure)
        .build()
}

/// Run `send` until it yields a response, at most `max_attempts` times.
///
/// Only errors from `send` itself (no response received) are retried, with `delay`
/// between attempts. Returns `None` once every attempt has failed.
pub(crate) async fn send_with_retries<R, E, F, Fut>(
    endpoint: &str,
    max_attempts: u32,
    delay: Duration,
    mut send: F,
) -> Option<R>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
{
    for attempt in 1..=max_attempts {
        match send().await {
            Ok(response) => return Some(response),
            Err(e) => {
                warn!(
                    endpoint,
                    attempt,
                    max_attempts,
                    error = %e,
                    "failed to send request"
                );
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    None
}

async fn decode_response<T>(endpoint: &str, response: reqwest::Response) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let status_code = status.as_u16();

    // gzip/deflate/br bodies are inflated while reading, so a bad stream fails here
    let body = response.bytes().await.map_err(|e| {
        FetchError::new(
            endpoint,
            format!("failed to read response body: {}", e),
            status_code,
        )
    })?;

    if !status.is_success() {
        return Err(FetchError::new(
            endpoint,
            String::from_utf8_lossy(&body).into_owned(),
            status_code,
        ));
    }

    serde_json::from_slice(&body).map_err(|e| {
        FetchError::new(
            endpoint,
            format!("failed to decode response body: {}", e),
            status_code,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[tokio::test]
    async fn test_transport_failures_use_every_attempt() {
        let attempts = AtomicU32::new(0);
        let started = Instant::now();

        let result: Option<()> = send_with_retries("arp", MAX_RETRIES, RETRY_DELAY, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("connection refused") }
        })
        .await;

        assert!(result.is_none());
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES);
        // Delays sit between attempts only
        assert!(started.elapsed() >= RETRY_DELAY * (MAX_RETRIES - 1));
    }

    #[tokio::test]
    async fn test_response_stops_the_attempt_loop() {
        let attempts = AtomicU32::new(0);

        let result = send_with_retries("arp", MAX_RETRIES, RETRY_DELAY, || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err("timed out")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Some(1));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_sleep() {
        let started = Instant::now();
        let result: Option<()> =
            send_with_retries("firmware", 1, Duration::from_secs(5), || async {
                Err::<(), _>("tls handshake failed")
            })
            .await;

        assert!(result.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
