//! Identity Toolkit REST provider.
//!
//! Email/password accounts hosted by the Identity Toolkit API.
//!
//! # API Reference
//!
//! - Base URL: `https://identitytoolkit.googleapis.com/v1`
//! - Authentication: web API key via the `key` query parameter
//! - Errors: `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use libris_core::Email;

use super::{AuthError, AuthProvider, AuthSession};
use crate::config::AuthConfig;

/// Identity Toolkit API base URL.
const BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Identity Toolkit client.
#[derive(Clone)]
pub struct IdentityToolkitProvider {
    inner: Arc<IdentityToolkitInner>,
}

struct IdentityToolkitInner {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl IdentityToolkitProvider {
    /// Create a provider from configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a provider that talks to a different endpoint (emulators).
    #[must_use]
    pub fn with_base_url(config: &AuthConfig, base_url: &str) -> Self {
        Self {
            inner: Arc::new(IdentityToolkitInner {
                client: reqwest::Client::new(),
                api_key: config.api_key.clone(),
                base_url: base_url.trim_end_matches('/').to_owned(),
            }),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{method}", self.inner.base_url)
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R, AuthError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(method))
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(error_from_body(status, &text))
    }
}

/// Translate a failed response into an [`AuthError`].
fn error_from_body(status: reqwest::StatusCode, body: &str) -> AuthError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            AuthError::from_provider_code(&envelope.error.message)
        }
        _ => AuthError::Provider(format!("HTTP {status}: {body}")),
    }
}

fn into_session(email: &Email, account: AccountResponse) -> AuthSession {
    AuthSession {
        uid: account.local_id,
        email: email.clone(),
        display_name: account.display_name.filter(|name| !name.is_empty()),
        id_token: SecretString::from(account.id_token),
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitProvider {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let account: AccountResponse = self
            .post(
                "signInWithPassword",
                &PasswordRequest {
                    email: email.as_str(),
                    password: password.expose_secret(),
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(into_session(email, account))
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        display_name: &str,
    ) -> Result<AuthSession, AuthError> {
        let account: AccountResponse = self
            .post(
                "signUp",
                &PasswordRequest {
                    email: email.as_str(),
                    password: password.expose_secret(),
                    return_secure_token: true,
                },
            )
            .await?;
        let mut session = into_session(email, account);

        // The account exists at this point; a failed profile update only
        // loses the display name.
        let update: Result<serde_json::Value, AuthError> = self
            .post(
                "update",
                &UpdateProfileRequest {
                    id_token: session.id_token.expose_secret(),
                    display_name,
                    return_secure_token: false,
                },
            )
            .await;
        match update {
            Ok(_) => session.display_name = Some(display_name.to_owned()),
            Err(e) => tracing::warn!(error = %e, "Failed to set display name"),
        }

        Ok(session)
    }

    fn provider_name(&self) -> &'static str {
        "identity-toolkit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_maps_code() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        assert_eq!(
            error_from_body(reqwest::StatusCode::BAD_REQUEST, body),
            AuthError::EmailAlreadyInUse
        );
    }

    #[test]
    fn test_unparseable_body_is_provider_error() {
        let err = error_from_body(reqwest::StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, AuthError::Provider(message) if message.contains("502")));
    }
}
