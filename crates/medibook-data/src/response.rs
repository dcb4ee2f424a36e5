//! HTTP response handling and backend envelope decoding.

use crate::FetchError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The backend's JSON response wrapper.
///
/// Every endpoint answers `{"success": bool, "message": "...", "data": ...}`;
/// `success` and `message` may be missing on some error paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Success discriminator. Absent means "trust the status code".
    #[serde(default)]
    pub success: Option<bool>,
    /// Human-readable message, present on failures.
    #[serde(default)]
    pub message: Option<String>,
    /// Payload, present on success.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Message to surface for a failed request.
    fn failure_message(&self, status: u16) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => fallback_message(status),
        }
    }
}

fn fallback_message(status: u16) -> String {
    format!("Request failed with status {}", status)
}

/// An HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a response with a JSON body.
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self::new(status, headers, value.to_string().into_bytes())
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Get a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the envelope and extract `data` as `T`.
    ///
    /// Non-2xx responses and `success: false` become
    /// [`FetchError::Application`] carrying the envelope's `message`, or a
    /// generic message when the body has none.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        if !self.is_success() {
            let message = self
                .json::<Envelope>()
                .map(|envelope| envelope.failure_message(self.status))
                .unwrap_or_else(|_| fallback_message(self.status));
            return Err(FetchError::Application {
                status: self.status,
                message,
            });
        }

        let envelope: Envelope = self.json()?;
        if envelope.success == Some(false) {
            return Err(FetchError::Application {
                status: self.status,
                message: envelope.failure_message(self.status),
            });
        }

        serde_json::from_value(envelope.data).map_err(FetchError::from)
    }
}
