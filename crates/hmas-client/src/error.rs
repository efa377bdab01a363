use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status}: {message} ({url})")]
    Http {
        status: u16,
        message: String,
        url: String,
    },
    /// Request never produced a response (connect, timeout, ...)
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("could not parse response from {url}: {message}")]
    Parse { url: String, message: String },
    #[error("crawl cancelled")]
    Cancelled,
    #[error("root {url} unreachable: {source}")]
    RootUnreachable {
        url: String,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RootUnreachable { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Human-readable message from an error body: the `error` or `detail` field of
/// a JSON object, otherwise the raw text.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail"] {
            match map.get(key) {
                Some(serde_json::Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.to_string()
    }
}
