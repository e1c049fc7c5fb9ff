//! Password sign-in against the Supabase auth endpoint.

use std::fmt;

use carto_core::UserSession;
use serde::Deserialize;
use serde_json::json;

use crate::config::SupabaseConfig;
use crate::error::{Result, SourceError};
use crate::http;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: AuthUser,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

/// A signed-in user and the tokens issued for them.
#[derive(Clone)]
pub struct AuthSession {
    pub user: UserSession,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires.
    pub expires_in: Option<u64>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user)
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config)?,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn token_url(&self) -> String {
        format!("{}/auth/v1/token?grant_type=password", self.base_url)
    }

    pub fn logout_url(&self) -> String {
        format!("{}/auth/v1/logout", self.base_url)
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        tracing::debug!(url = %self.token_url(), "signing in");

        let response = self
            .client
            .post(self.token_url())
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
        {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Auth(http::error_message(&body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                message: http::error_message(&body),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Payload(e.to_string()))?;
        Ok(AuthSession {
            user: UserSession {
                user_id: token.user.id,
                email: token.user.email,
            },
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
        })
    }

    /// Revokes the session's tokens on the server.
    pub async fn sign_out(&self, session: &AuthSession) -> Result<()> {
        let response = self
            .client
            .post(self.logout_url())
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                message: http::error_message(&body),
            });
        }
        Ok(())
    }
}
