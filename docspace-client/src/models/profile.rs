use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::Identity;

/// Mutable descriptive record attached 1:1 to an identity.
///
/// Created lazily on first authenticated use; `department` and `role` are
/// the authorization inputs consumed by the visibility resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub role: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Builds the initial profile for a fresh identity. Role falls back to
    /// `default_role` when the provider metadata carries none.
    pub fn from_identity(identity: &Identity, default_role: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: identity.id,
            email: identity.email.clone(),
            display_name: identity.derived_display_name(),
            department: None,
            job_title: None,
            role: Some(
                identity
                    .metadata
                    .role
                    .clone()
                    .unwrap_or_else(|| default_role.to_string()),
            ),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Allow-listed partial update for a profile. Fields left as `None` are
/// unchanged; anything outside this struct cannot be mutated by the owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.department.is_none()
            && self.job_title.is_none()
            && self.avatar_url.is_none()
    }

    /// Applies the update in place, touching `updated_at`.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(display_name) = &self.display_name {
            profile.display_name = Some(display_name.clone());
        }
        if let Some(department) = &self.department {
            profile.department = Some(department.clone());
        }
        if let Some(job_title) = &self.job_title {
            profile.job_title = Some(job_title.clone());
        }
        if let Some(avatar_url) = &self.avatar_url {
            profile.avatar_url = Some(avatar_url.clone());
        }
        profile.updated_at = Utc::now();
    }
}
