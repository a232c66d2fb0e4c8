//! WhatsExpense HTTP client

pub mod auth;
pub mod error;
pub mod messages;
pub mod users;

mod dispatch;

pub use dispatch::{OutboundRequest, RequestOptions};

use crate::token_store::{MemoryTokenStore, TokenStore};
use error::ClientError;
use reqwest::{Client, ClientBuilder, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::{Origin, Url};

const DEFAULT_USER_AGENT: &str = concat!("whatsexpense-client/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RENEW_PATH: &str = "/auth/renew";

/// Authenticated client for the WhatsExpense API
///
/// Clones share the underlying connection pool and token store.
#[derive(Clone)]
pub struct ExpenseClient {
    client: Client,
    base_url: String,
    origin: Origin,
    renew_path: String,
    tokens: Arc<dyn TokenStore>,
}

impl ExpenseClient {
    /// Create a new client with an in-memory token store
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ExpenseClientBuilder {
        ExpenseClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token store shared by this client
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Resolve a path against the base URL; absolute URLs pass through
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a request through the authentication protocol and decode the body
    pub async fn send<T: DeserializeOwned>(
        &self,
        request: OutboundRequest,
    ) -> Result<T, ClientError> {
        let response = self.execute(&request).await?;
        dispatch::decode(response).await
    }

    /// GET a resource and decode the response body
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        self.send(OutboundRequest::new(Method::GET, path).with_options(options))
            .await
    }

    /// POST an optional JSON body and decode the response body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        self.send(with_body(Method::POST, path, body, options)?)
            .await
    }

    /// PUT an optional JSON body and decode the response body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        self.send(with_body(Method::PUT, path, body, options)?)
            .await
    }

    /// PATCH an optional JSON body and decode the response body
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        self.send(with_body(Method::PATCH, path, body, options)?)
            .await
    }

    /// DELETE with an optional JSON body
    ///
    /// An empty response decodes as `null`, so `T = ()` suits a 204.
    pub async fn delete<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        self.send(with_body(Method::DELETE, path, body, options)?)
            .await
    }
}

fn with_body<B: Serialize + ?Sized>(
    method: Method,
    path: &str,
    body: Option<&B>,
    options: RequestOptions,
) -> Result<OutboundRequest, ClientError> {
    let mut request = OutboundRequest::new(method, path);
    if let Some(body) = body {
        request = request.json(body)?;
    }
    Ok(request.with_options(options))
}

impl fmt::Debug for ExpenseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpenseClient")
            .field("base_url", &self.base_url)
            .field("renew_path", &self.renew_path)
            .finish_non_exhaustive()
    }
}

/// Builder for ExpenseClient
#[derive(Default)]
pub struct ExpenseClientBuilder {
    base_url: Option<String>,
    token_store: Option<Arc<dyn TokenStore>>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    renew_path: Option<String>,
}

impl ExpenseClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set where credentials are read from and written to
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Set the request timeout; requests never time out by default
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Override the token renewal route (defaults to `/auth/renew`)
    pub fn renew_path(mut self, path: impl Into<String>) -> Self {
        self.renew_path = Some(path.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ExpenseClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        let origin = Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url {base_url:?}: {e}")))?
            .origin();

        let renew_path = self
            .renew_path
            .unwrap_or_else(|| DEFAULT_RENEW_PATH.to_string());
        let renew_path = if renew_path.starts_with('/') {
            renew_path
        } else {
            format!("/{renew_path}")
        };

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        );

        let client = client_builder.build()?;

        Ok(ExpenseClient {
            client,
            base_url,
            origin,
            renew_path,
            tokens: self
                .token_store
                .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_base_url() {
        let result = ExpenseClient::builder().build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn builder_rejects_relative_base_url() {
        let result = ExpenseClient::new("api/v1");
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = ExpenseClient::new("http://localhost:8080/api/v1/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api/v1");
    }

    #[test]
    fn paths_resolve_against_base_url() {
        let client = ExpenseClient::new("http://localhost:8080/api/v1").unwrap();
        assert_eq!(client.url("/users/me"), "http://localhost:8080/api/v1/users/me");
        assert_eq!(client.url("auth/sign-in"), "http://localhost:8080/api/v1/auth/sign-in");
        assert_eq!(client.url("https://other.example/x"), "https://other.example/x");
    }

    #[test]
    fn renew_path_gets_leading_slash() {
        let client = ExpenseClient::builder()
            .base_url("http://localhost:8080")
            .renew_path("session/renew")
            .build()
            .unwrap();
        assert_eq!(client.renew_path, "/session/renew");
    }
}
