//! Authentication API client methods

use super::{ExpenseClient, OutboundRequest, error::ClientError};
use crate::types::{AuthResponse, SignInRequest, TokenPair};
use reqwest::Method;

impl ExpenseClient {
    /// Sign in with email and password, persisting the issued tokens
    ///
    /// Sent without credentials: a wrong password comes back as
    /// `RequestRejected` with status 401 and leaves the token store alone.
    pub async fn sign_in(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, ClientError> {
        let request = OutboundRequest::new(Method::POST, "/auth/sign-in").json(&SignInRequest {
            email: email.into(),
            password: password.into(),
        })?;

        let response: AuthResponse = self.send_public(&request).await?;
        self.tokens.set_tokens(&response.tokens)?;
        info!("Signed in");
        Ok(response)
    }

    /// Exchange the stored refresh token for a new pair
    ///
    /// Fails with `AuthenticationExpired`, clearing the store, when no refresh
    /// token is stored or the server refuses it.
    pub async fn renew(&self) -> Result<TokenPair, ClientError> {
        let access_token = self.tokens.access_token()?;
        self.renew_session(access_token.as_deref()).await
    }

    /// Forget the stored credentials
    pub fn sign_out(&self) -> Result<(), ClientError> {
        self.tokens.clear()?;
        info!("Signed out");
        Ok(())
    }

    /// Whether an access token is currently stored
    pub fn is_signed_in(&self) -> Result<bool, ClientError> {
        Ok(self.tokens.access_token()?.is_some())
    }
}
