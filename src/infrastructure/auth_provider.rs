//! Hosted Auth Provider Client
//!
//! The journal does not manage credentials itself; sign-up, sign-in,
//! sign-out and password recovery are delegated to a hosted GoTrue-style
//! provider over HTTP. The provider issues HS256 session tokens which the
//! API layer verifies locally (see `auth.rs`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone)]
pub enum AuthProviderError {
    /// The provider could not be reached or the request failed to send
    #[error("Auth provider request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status
    #[error("Auth provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider answered with a body we could not parse
    #[error("Malformed auth provider response: {0}")]
    MalformedResponse(String),
}

/// User identity as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: String,
}

/// An authenticated session issued by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: ProviderUser,
}

/// Seam for the hosted auth provider, mockable in tests.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderUser, AuthProviderError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthProviderError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError>;
    async fn reset_password(&self, email: &str) -> Result<(), AuthProviderError>;
}

/// Error body shapes the provider uses, depending on the endpoint
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

/// HTTP client for the hosted provider
pub struct HostedAuthClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HostedAuthClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into a Rejected error with the
    /// provider's own message where one is present.
    async fn rejection(response: reqwest::Response) -> AuthProviderError {
        let status = response.status().as_u16();
        let message = match response.json::<ProviderErrorBody>().await {
            Ok(body) => body
                .msg
                .or(body.error_description)
                .or(body.error)
                .unwrap_or_else(|| "authentication failed".to_string()),
            Err(_) => "authentication failed".to_string(),
        };
        warn!("Auth provider rejected request ({}): {}", status, message);
        AuthProviderError::Rejected { status, message }
    }
}

#[async_trait]
impl AuthProvider for HostedAuthClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, AuthProviderError> {
        let response = self
            .client
            .post(self.url("/signup"))
            .header("apikey", &self.api_key)
            .json(&CredentialsBody { email, password })
            .send()
            .await
            .map_err(|e| AuthProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let user = response
            .json::<ProviderUser>()
            .await
            .map_err(|e| AuthProviderError::MalformedResponse(e.to_string()))?;
        debug!("Signed up user {}", user.id);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthProviderError> {
        let response = self
            .client
            .post(self.url("/token?grant_type=password"))
            .header("apikey", &self.api_key)
            .json(&CredentialsBody { email, password })
            .send()
            .await
            .map_err(|e| AuthProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let session = response
            .json::<Session>()
            .await
            .map_err(|e| AuthProviderError::MalformedResponse(e.to_string()))?;
        debug!("Signed in user {}", session.user.id);
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        let response = self
            .client
            .post(self.url("/logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthProviderError> {
        let response = self
            .client
            .post(self.url("/recover"))
            .header("apikey", &self.api_key)
            .json(&EmailBody { email })
            .send()
            .await
            .map_err(|e| AuthProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = HostedAuthClient::new("https://auth.example.com/", "anon-key");
        assert_eq!(
            client.url("/token?grant_type=password"),
            "https://auth.example.com/token?grant_type=password"
        );
    }

    #[test]
    fn test_session_deserializes_provider_shape() {
        let json = r#"{
            "access_token": "jwt-here",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": "user-1", "email": "trader@example.com" }
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.user.email, "trader@example.com");
        assert_eq!(session.expires_in, 3600);
    }
}
