//! REST identity provider speaking the email/password sign-in protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::watch;

use super::{IdentityProvider, ProviderError};
use crate::auth::{BackendIdentity, Credentials, Session};
use crate::config::{ProviderConfig, SecureString};

const SIGN_IN_PATH: &str = "/v1/accounts:signInWithPassword";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Seconds, encoded as a string.
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity provider reached over HTTP.
///
/// Sign-out is local: the token is dropped and subscribers observe `None`.
pub struct HttpIdentityProvider {
    identity: BackendIdentity,
    base_url: String,
    api_key: Option<SecureString>,
    timeout: Duration,
    client: Client,
    sessions: watch::Sender<Option<Session>>,
}

impl HttpIdentityProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let timeout = Duration::from_secs(config.timeout_seconds as u64);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Connection { source: e })?;
        let (sessions, _) = watch::channel(None);

        Ok(Self {
            identity: config.identity,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .map(SecureString::new),
            timeout,
            client,
            sessions,
        })
    }

    fn session_from(&self, body: SignInResponse, credentials: &Credentials) -> Session {
        Session {
            user_id: body.local_id,
            email: body.email.unwrap_or_else(|| credentials.email.clone()),
            id_token: SecureString::new(body.id_token),
            refresh_token: body.refresh_token.map(SecureString::new),
            identity: self.identity,
            expires_in: body
                .expires_in
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    fn identity(&self) -> BackendIdentity {
        self.identity
    }

    async fn sign_in_with_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, ProviderError> {
        let url = format!("{}{}", self.base_url, SIGN_IN_PATH);
        let mut builder = self.client.post(url).json(&serde_json::json!({
            "email": credentials.email,
            "password": credentials.password.expose(),
            "returnSecureToken": true,
        }));
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key.expose());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Connection { source: e })?;
        let status = response.status();

        if status.is_server_error() {
            return Err(ProviderError::Unavailable {
                identity: self.identity,
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        if !status.is_success() {
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("request rejected")
                    .to_string(),
            };
            return Err(ProviderError::Rejected {
                code: status.as_u16(),
                message,
            });
        }

        let body: SignInResponse = response.json().await.map_err(|e| ProviderError::Malformed {
            message: e.to_string(),
        })?;

        let session = self.session_from(body, credentials);
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sessions.send_replace(None);
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.sessions.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sessions.subscribe()
    }
}

impl std::fmt::Debug for HttpIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIdentityProvider")
            .field("identity", &self.identity)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_maps_to_session() {
        let config = ProviderConfig::new(BackendIdentity::Backup, "http://localhost/");
        let provider = HttpIdentityProvider::new(&config).unwrap();
        let body: SignInResponse = serde_json::from_str(
            r#"{"localId":"u1","idToken":"tok","refreshToken":"ref","expiresIn":"3600"}"#,
        )
        .unwrap();

        let session = provider.session_from(body, &Credentials::new("a@x.com", "pw"));
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.email, "a@x.com");
        assert_eq!(session.identity, BackendIdentity::Backup);
        assert_eq!(session.expires_in, Some(Duration::from_secs(3600)));
        assert_eq!(session.id_token.expose(), "tok");
    }

    #[test]
    fn test_trailing_slash_trimmed_and_key_masked() {
        let mut config = ProviderConfig::new(BackendIdentity::Main, "http://localhost:9099/");
        config.api_key = Some("secret-key".to_string());
        let provider = HttpIdentityProvider::new(&config).unwrap();

        assert_eq!(provider.base_url, "http://localhost:9099");
        assert!(!format!("{:?}", provider).contains("secret-key"));
    }

    #[test]
    fn test_timeout_comes_from_provider_config() {
        let mut config = ProviderConfig::new(BackendIdentity::Backup, "http://localhost");
        assert_eq!(
            HttpIdentityProvider::new(&config).unwrap().timeout,
            Duration::from_secs(10)
        );

        config.timeout_seconds = 3;
        let provider = HttpIdentityProvider::new(&config).unwrap();
        assert_eq!(provider.timeout, Duration::from_secs(3));
    }
}
