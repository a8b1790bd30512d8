//! Fetching the catalogue text over HTTP.
//!
//! The service only needs "GET a URL, return status + body", so that is the
//! whole [`Transport`] trait. Status handling is left to the caller.

use std::time::Duration;

use crate::error::EmojiError;

/// Status code and body text of a single GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single-shot GET. Implementations must not retry internally.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<TransportResponse, EmojiError>;
}

/// Blocking HTTP transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, EmojiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("emoji-list/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EmojiError::transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<TransportResponse, EmojiError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| EmojiError::transport(format!("Failed to download {url}: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| EmojiError::transport(format!("Failed to read response from {url}: {e}")))?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        let ok = TransportResponse {
            status: 200,
            body: String::new(),
        };
        assert!(ok.is_success());

        for status in [199, 304, 404, 500] {
            let resp = TransportResponse {
                status,
                body: String::new(),
            };
            assert!(!resp.is_success(), "{status}");
        }
    }
}
