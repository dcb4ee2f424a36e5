//! Backend API client.

use std::sync::Arc;

use medibook_core::ApiConfig;
use serde::de::DeserializeOwned;

use crate::{FetchError, Request, Transport};

/// Client for the booking backend's REST API.
///
/// Cheap to clone; clones share the underlying transport.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: Option<String>,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client over the given transport.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Create a client over an already shared transport.
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: None,
            token: None,
        }
    }

    /// Create a client configured from [`ApiConfig`].
    pub fn from_config(config: &ApiConfig, transport: impl Transport + 'static) -> Self {
        Self::new(transport).with_base_url(config.base_url.clone())
    }

    /// Set the base URL that relative locators are joined onto.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Attach a bearer token to every request. Empty tokens are ignored.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Resolve a locator to an absolute URL.
    pub fn resolve_url(&self, locator: &str) -> String {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            return locator.to_string();
        }
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                locator.trim_start_matches('/')
            ),
            None => locator.to_string(),
        }
    }

    /// Build the GET request for a locator.
    pub fn get_request(&self, locator: &str) -> Request {
        let mut builder = Request::get(self.resolve_url(locator)).accept("application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder.build()
    }

    /// GET a locator and decode the envelope's `data` as `T`.
    pub async fn get_data<T: DeserializeOwned>(&self, locator: &str) -> Result<T, FetchError> {
        let request = self.get_request(locator);
        tracing::debug!(url = %request.url, "GET");

        let response = self.transport.send(request).await?;
        tracing::debug!(
            locator,
            status = response.status,
            content_type = response.header("content-type").unwrap_or_default(),
            "response received"
        );

        response.into_data()
    }
}
