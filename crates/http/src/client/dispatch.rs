//! Request dispatch with a single credential-renewal retry
//!
//! [`ExpenseClient::dispatch`] sends a request once and resolves to one of
//! three outcomes. Only [`Dispatch::Retry`] leads to a second send, and that
//! send goes through [`ExpenseClient::finish`], which never renews. A request
//! is therefore retried at most once.

use super::ExpenseClient;
use super::error::ClientError;
use crate::types::TokenPair;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

/// Per-call overrides merged into a request at dispatch time
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: HeaderMap,
    query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header; it replaces a default header of the same name
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// A request as built at the call site, before credentials are attached
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl OutboundRequest {
    /// `path` is relative to the client's base URL unless it is absolute
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.headers.extend(options.headers);
        self.query.extend(options.query);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Outcome of the first send of a request
pub(crate) enum Dispatch {
    /// 2xx response, returned to the caller untouched
    Success(Response),
    /// Credentials were renewed; the original request, re-authorized
    Retry(Request),
    /// Anything else, including an ended session
    Fail(ClientError),
}

impl ExpenseClient {
    /// Send a request, renewing credentials and retrying once on 401
    pub(crate) async fn execute(&self, request: &OutboundRequest) -> Result<Response, ClientError> {
        match self.dispatch(request).await {
            Dispatch::Success(response) => Ok(response),
            Dispatch::Retry(renewed) => self.finish(renewed).await,
            Dispatch::Fail(error) => Err(error),
        }
    }

    pub(crate) async fn dispatch(&self, request: &OutboundRequest) -> Dispatch {
        self.try_dispatch(request)
            .await
            .unwrap_or_else(Dispatch::Fail)
    }

    async fn try_dispatch(&self, request: &OutboundRequest) -> Result<Dispatch, ClientError> {
        let access_token = self.tokens.access_token()?;
        let prepared = self.prepare(request, access_token.as_deref())?;

        debug!(method = %request.method, path = %request.path, "Dispatching request");
        let response = self.client.execute(prepared).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(Dispatch::Success(response));
        }
        if status != StatusCode::UNAUTHORIZED {
            return Ok(Dispatch::Fail(rejected(response).await));
        }

        debug!(path = %request.path, "Access token rejected, renewing session");
        let tokens = self.renew_session(access_token.as_deref()).await?;
        let renewed = self.prepare(request, Some(&tokens.access_token))?;
        Ok(Dispatch::Retry(renewed))
    }

    /// Send the re-authorized request; its outcome is final
    async fn finish(&self, renewed: Request) -> Result<Response, ClientError> {
        debug!(method = %renewed.method(), url = %renewed.url(), "Retrying with renewed credentials");
        let response = self.client.execute(renewed).await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(rejected(response).await)
        }
    }

    /// Exchange the stored refresh token for a new pair and persist it
    ///
    /// Any failure to obtain a pair ends the session.
    pub(crate) async fn renew_session(
        &self,
        access_token: Option<&str>,
    ) -> Result<TokenPair, ClientError> {
        let Some(refresh_token) = self.tokens.refresh_token()? else {
            return Err(self.end_session("no refresh token available"));
        };

        match self.request_renewal(&refresh_token, access_token).await {
            Ok(tokens) => {
                self.tokens.set_tokens(&tokens)?;
                debug!("Session renewed");
                Ok(tokens)
            }
            Err(error) => Err(self.end_session(&error.to_string())),
        }
    }

    /// Renewal bypasses `dispatch` so a rejected refresh token cannot loop.
    /// The backend identifies the user from the (expired) bearer token, so it
    /// is sent along.
    async fn request_renewal(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<TokenPair, ClientError> {
        let request = OutboundRequest::new(Method::GET, self.renew_path.as_str())
            .query("refresh_token", refresh_token);
        let prepared = self.prepare(&request, access_token)?;

        let response = self.client.execute(prepared).await?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        decode(response).await
    }

    /// Clear credentials and produce the error reported to the caller
    fn end_session(&self, reason: &str) -> ClientError {
        warn!(reason, "Session ended, clearing stored credentials");
        if let Err(error) = self.tokens.clear() {
            warn!(%error, "Failed to clear stored credentials");
        }
        ClientError::AuthenticationExpired(reason.to_string())
    }

    /// Send without credentials and without 401 handling
    pub(crate) async fn send_public<T: DeserializeOwned>(
        &self,
        request: &OutboundRequest,
    ) -> Result<T, ClientError> {
        let prepared = self.prepare(request, None)?;
        let response = self.client.execute(prepared).await?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        decode(response).await
    }

    /// Build the transport request: defaults, then caller headers, then bearer
    ///
    /// The bearer token is only attached when the target shares the base
    /// URL's origin.
    fn prepare(
        &self,
        request: &OutboundRequest,
        access_token: Option<&str>,
    ) -> Result<Request, ClientError> {
        let url = Url::parse(&self.url(&request.path))
            .map_err(|e| ClientError::Configuration(format!("invalid request url: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.extend(request.headers.clone());

        match access_token {
            Some(token) if url.origin() == self.origin => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    ClientError::Configuration("access token is not a valid header value".into())
                })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Some(_) => debug!(%url, "Not sending credentials to a foreign origin"),
            None => {}
        }

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("invalid request: {e}")))
    }
}

async fn rejected(response: Response) -> ClientError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    ClientError::from_status(status, body)
}

/// Decode a success body; an empty body reads as JSON `null`
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ExpenseClient {
        ExpenseClient::new("http://localhost:8080/api/v1").unwrap()
    }

    #[test]
    fn prepare_sets_defaults_and_bearer() {
        let request = OutboundRequest::new(Method::GET, "/messages");
        let prepared = client().prepare(&request, Some("T1")).unwrap();

        assert_eq!(prepared.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(prepared.headers()[ACCEPT], "application/json");
        assert_eq!(prepared.headers()[AUTHORIZATION], "Bearer T1");
        assert_eq!(prepared.url().as_str(), "http://localhost:8080/api/v1/messages");
    }

    #[test]
    fn prepare_omits_authorization_without_token() {
        let request = OutboundRequest::new(Method::GET, "/messages");
        let prepared = client().prepare(&request, None).unwrap();

        assert!(prepared.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn caller_headers_replace_defaults() {
        let request = OutboundRequest::new(Method::GET, "/report.csv").with_options(
            RequestOptions::new().header(ACCEPT, HeaderValue::from_static("text/csv")),
        );
        let prepared = client().prepare(&request, None).unwrap();

        let accept: Vec<_> = prepared.headers().get_all(ACCEPT).iter().collect();
        assert_eq!(accept, vec!["text/csv"]);
    }

    #[test]
    fn query_and_body_are_attached() {
        let request = OutboundRequest::new(Method::POST, "/messages")
            .json(&serde_json::json!({"content": "Coffee 5 USD"}))
            .unwrap()
            .with_options(RequestOptions::new().query("limit", 20));
        let prepared = client().prepare(&request, None).unwrap();

        assert_eq!(prepared.url().query(), Some("limit=20"));
        let body = prepared.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"content":"Coffee 5 USD"}"#);
    }

    #[test]
    fn bearer_is_withheld_from_other_origins() {
        let request = OutboundRequest::new(Method::GET, "https://files.example.com/receipt.png");
        let prepared = client().prepare(&request, Some("T1")).unwrap();

        assert!(prepared.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_is_sent_to_absolute_urls_on_the_same_origin() {
        let request = OutboundRequest::new(Method::GET, "http://localhost:8080/api/v1/messages");
        let prepared = client().prepare(&request, Some("T1")).unwrap();

        assert_eq!(prepared.headers()[AUTHORIZATION], "Bearer T1");
    }

    #[test]
    fn unprintable_token_is_rejected() {
        let request = OutboundRequest::new(Method::GET, "/messages");
        let result = client().prepare(&request, Some("bad\ntoken"));
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }
}
