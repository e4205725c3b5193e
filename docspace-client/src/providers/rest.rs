//! REST identity provider speaking the hosted provider's token/user
//! endpoints. Sessions are persisted in the local cache under the
//! configured session-key prefix so they survive restarts; they are
//! re-confirmed on every bootstrap before being trusted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docspace_core::error::AppError;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::ProviderSettings;
use crate::models::{AuthEvent, Identity, IdentityMetadata, Session, SignOutScope};
use crate::providers::{IdentityProvider, SessionCache};

const EVENT_CHANNEL_CAPACITY: usize = 16;
const SESSION_CACHE_KEY: &str = "auth-token";

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    email: String,
    #[serde(default)]
    user_metadata: IdentityMetadata,
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    user: UserPayload,
}

impl From<UserPayload> for Identity {
    fn from(user: UserPayload) -> Self {
        Identity {
            id: user.id,
            email: user.email,
            metadata: user.user_metadata,
        }
    }
}

impl From<TokenPayload> for Session {
    fn from(payload: TokenPayload) -> Self {
        Session {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_at: payload.expires_at,
            identity: payload.user.into(),
        }
    }
}

pub struct RestIdentityProvider {
    client: Client,
    settings: ProviderSettings,
    cache: Arc<dyn SessionCache>,
    session_key: String,
    events: broadcast::Sender<AuthEvent>,
}

impl RestIdentityProvider {
    pub fn new(
        settings: ProviderSettings,
        session_key_prefix: &str,
        cache: Arc<dyn SessionCache>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client: Client::new(),
            session_key: format!("{}{}", session_key_prefix, SESSION_CACHE_KEY),
            settings,
            cache,
            events,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url, path)
    }

    fn persist_session(&self, session: &Session) {
        match serde_json::to_string(session) {
            Ok(json) => self.cache.set(&self.session_key, json),
            Err(e) => tracing::warn!("failed to serialize session for cache: {}", e),
        }
    }

    async fn decode_session(&self, response: reqwest::Response) -> Result<Session, AppError> {
        let payload: TokenPayload = map_status(response).await?.json().await.map_err(|e| {
            tracing::error!("failed to decode token payload: {}", e);
            AppError::Network(anyhow::Error::new(e))
        })?;
        Ok(payload.into())
    }
}

/// Maps non-success statuses into the error taxonomy before decoding.
async fn map_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::unauthorized(format!("{}: {}", status, body))
        }
        StatusCode::NOT_FOUND => AppError::not_found(format!("{}: {}", status, body)),
        s if s.is_client_error() => AppError::bad_request(format!("{}: {}", status, body)),
        _ => AppError::network(format!("{}: {}", status, body)),
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        match self.cache.get(&self.session_key) {
            Some(json) => match serde_json::from_str::<Session>(&json) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    // An unreadable cached session is the same as none.
                    tracing::warn!("discarding unparseable cached session: {}", e);
                    self.cache.remove(&self.session_key);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn confirm_user(&self, access_token: &str) -> Result<Identity, AppError> {
        let url = self.url("/auth/v1/user");
        let response = self
            .client
            .get(&url)
            .header("apikey", self.settings.api_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send GET request to {}: {}", url, e);
                AppError::Network(anyhow::Error::new(e))
            })?;
        let user: UserPayload = map_status(response).await?.json().await.map_err(|e| {
            tracing::error!("failed to decode user payload: {}", e);
            AppError::Network(anyhow::Error::new(e))
        })?;
        Ok(user.into())
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, AppError> {
        let url = self.url("/auth/v1/token?grant_type=password");
        let response = self
            .client
            .post(&url)
            .header("apikey", self.settings.api_key.expose_secret())
            .json(&serde_json::json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                AppError::Network(anyhow::Error::new(e))
            })?;
        let session = self.decode_session(response).await?;
        self.persist_session(&session);
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        metadata: IdentityMetadata,
    ) -> Result<Session, AppError> {
        let url = self.url("/auth/v1/signup");
        let response = self
            .client
            .post(&url)
            .header("apikey", self.settings.api_key.expose_secret())
            .json(&serde_json::json!({
                "email": email,
                "password": password.expose_secret(),
                "data": metadata,
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                AppError::Network(anyhow::Error::new(e))
            })?;
        let session = self.decode_session(response).await?;
        self.persist_session(&session);
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, scope: SignOutScope) -> Result<(), AppError> {
        let token = self
            .get_session()
            .await?
            .map(|s| s.access_token)
            .unwrap_or_default();
        self.cache.remove(&self.session_key);
        let _ = self.events.send(AuthEvent::SignedOut);

        let url = self.url(&format!("/auth/v1/logout?scope={}", scope));
        let response = self
            .client
            .post(&url)
            .header("apikey", self.settings.api_key.expose_secret())
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                AppError::Network(anyhow::Error::new(e))
            })?;
        map_status(response).await?;
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &SecretString,
    ) -> Result<(), AppError> {
        let url = self.url("/auth/v1/user");
        let response = self
            .client
            .put(&url)
            .header("apikey", self.settings.api_key.expose_secret())
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "password": new_password.expose_secret() }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send PUT request to {}: {}", url, e);
                AppError::Network(anyhow::Error::new(e))
            })?;
        map_status(response).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_and_forbidden_fail_closed() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = status_error(status, "invalid token");
            assert!(matches!(err, AppError::Unauthorized(_)), "{}", status);
            assert!(err.is_fail_closed());
        }
    }

    #[test]
    fn not_found_maps_to_not_found() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "no such user"),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn other_client_errors_are_bad_requests() {
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, "bad payload"),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn server_errors_are_transient_network_errors() {
        let err = status_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, AppError::Network(_)));
        assert!(err.is_transient());
    }
}
