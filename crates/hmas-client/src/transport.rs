//! HTTP transport seam.
//!
//! [`Transport`] is a single request/response exchange with no retry
//! logic; retries live in the client so every transport gets them.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use hmas_config::ClientConfig;

use crate::error::ClientError;

/// Raw response of one exchange
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError>;

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, ClientError>;
}

/// reqwest-backed transport with a per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    async fn finish(url: &str, response: reqwest::Response) -> Result<HttpResponse, ClientError> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ClientError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(HttpResponse { status, body })
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> ClientError {
    ClientError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/turtle, application/json;q=0.9, */*;q=0.1")
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        Self::finish(url, response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, ClientError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        Self::finish(url, response).await
    }
}

/// Bounded exponential backoff on a fixed set of transient statuses.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub retry_on_status: Vec<u16>,
    /// Whether POSTs are retried too; GETs always are
    pub retry_actions: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
            max_delay: config.retry_max_delay(),
            retry_on_status: config.retry_on_status.clone(),
            retry_actions: config.retry_actions,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn should_retry(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Delay before retry number `retries_used + 1`.
    pub fn backoff(&self, retries_used: u32) -> Duration {
        let base_ms = self.base_delay.as_millis();
        if base_ms == 0 {
            return Duration::from_millis(0);
        }
        let max_ms = self.max_delay.as_millis().max(base_ms);
        let shift = retries_used.min(20);
        let multiplier = 1u128 << shift;
        let backoff_ms = base_ms.saturating_mul(multiplier).min(max_ms);
        Duration::from_millis(u64::try_from(backoff_ms).unwrap_or(u64::MAX))
    }
}

/// In-memory transport serving canned responses per URL. A URL with several
/// queued responses answers them in order and keeps repeating the last one.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: impl Into<String>, response: HttpResponse) -> Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.entry(url.into()).or_default().push_back(response);
        }
        self
    }

    pub fn turtle(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.respond(url, HttpResponse::new(200, body))
    }

    /// `(method, url)` of every request seen so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn answer(&self, method: &str, url: &str) -> Result<HttpResponse, ClientError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((method.to_string(), url.to_string()));
        }
        let mut routes = self.routes.lock().map_err(|e| ClientError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let Some(queue) = routes.get_mut(url) else {
            return Ok(HttpResponse::new(404, r#"{"error":"Resource not found","status_code":404}"#));
        };
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| ClientError::Transport {
            url: url.to_string(),
            message: "no response queued".to_string(),
        })
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        self.answer("GET", url)
    }

    async fn post_json(&self, url: &str, _body: &Value) -> Result<HttpResponse, ClientError> {
        self.answer("POST", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(1000),
            retry_on_status: vec![503],
            retry_actions: false,
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(200));
        assert_eq!(policy.backoff(1), Duration::from_millis(400));
        assert_eq!(policy.backoff(2), Duration::from_millis(800));
        assert_eq!(policy.backoff(3), Duration::from_millis(1000));
        assert_eq!(policy.backoff(64), Duration::from_millis(1000));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert!(policy.should_retry(503));
        assert!(policy.should_retry(429));
        assert!(!policy.should_retry(400));
        assert!(!policy.should_retry(404));
        assert!(!policy.retry_actions);
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }

    #[tokio::test]
    async fn test_memory_transport_queue() {
        let transport = MemoryTransport::new()
            .respond("http://h/x", HttpResponse::new(503, "busy"))
            .respond("http://h/x", HttpResponse::new(200, "ok"));
        assert_eq!(transport.get("http://h/x").await.unwrap().status, 503);
        assert_eq!(transport.get("http://h/x").await.unwrap().status, 200);
        assert_eq!(transport.get("http://h/x").await.unwrap().status, 200);
        assert_eq!(transport.get("http://h/y").await.unwrap().status, 404);
        assert_eq!(transport.requests().len(), 4);
    }
}
