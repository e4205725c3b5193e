use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Descriptive metadata carried by the identity provider alongside a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// The validated representation of a signed-in actor.
///
/// An `Identity` is only trusted while its session has been confirmed live
/// by the provider; it is never persisted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub metadata: IdentityMetadata,
}

impl Identity {
    /// Display name fallback chain: metadata display name, then the
    /// local-part of the email, then none.
    pub fn derived_display_name(&self) -> Option<String> {
        self.metadata
            .display_name
            .clone()
            .or_else(|| self.email.split('@').next().map(|s| s.to_string()))
            .filter(|s| !s.is_empty())
    }
}

/// Provider-owned session envelope. Cached locally under session-prefix
/// keys; a cached session alone is never trusted without live confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub identity: Identity,
}

/// Auth-change events pushed by the identity provider. These replace the
/// local session atomically and are trusted without re-validation.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutScope {
    Local,
    Global,
}

impl std::fmt::Display for SignOutScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignOutScope::Local => write!(f, "local"),
            SignOutScope::Global => write!(f, "global"),
        }
    }
}
