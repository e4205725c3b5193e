use docspace_core::error::AppError;
use secrecy::SecretString;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::ChangePasswordRequest;
use crate::models::{Identity, Profile, ProfileUpdate};
use crate::providers::{IdentityProvider, ProfileRepository};

/// Profile lifecycle: lazy creation, role backfill, allow-listed updates,
/// and the destructive repair flow.
#[derive(Clone)]
pub struct ProfileService {
    repo: Arc<dyn ProfileRepository>,
    provider: Arc<dyn IdentityProvider>,
    default_role: String,
}

impl ProfileService {
    pub fn new(
        repo: Arc<dyn ProfileRepository>,
        provider: Arc<dyn IdentityProvider>,
        default_role: String,
    ) -> Self {
        Self {
            repo,
            provider,
            default_role,
        }
    }

    pub async fn find(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        self.repo.find_by_user(user_id).await
    }

    /// Creates the profile on first authenticated use, backfills a missing
    /// role from identity metadata, and otherwise leaves it untouched.
    pub async fn ensure_profile(&self, identity: &Identity) -> Result<Profile, AppError> {
        match self.repo.find_by_user(identity.id).await? {
            None => {
                let profile = Profile::from_identity(identity, &self.default_role);
                let created = self.repo.insert(profile).await?;
                tracing::info!(user_id = %identity.id, "profile created");
                Ok(created)
            }
            Some(mut profile) => {
                if profile.role.is_none() {
                    if let Some(role) = &identity.metadata.role {
                        self.repo.set_role(identity.id, role).await?;
                        profile.role = Some(role.clone());
                        tracing::info!(user_id = %identity.id, role, "profile role backfilled");
                    }
                }
                Ok(profile)
            }
        }
    }

    /// Applies an allow-listed partial update; anything outside
    /// [`ProfileUpdate`] cannot be expressed and is therefore rejected by
    /// construction.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, AppError> {
        if update.is_empty() {
            return Err(AppError::bad_request("no updatable fields provided"));
        }
        self.repo.update(user_id, &update).await
    }

    /// Destructive repair flow: delete then recreate. Never invoked
    /// implicitly.
    pub async fn clear_and_recreate(&self, identity: &Identity) -> Result<Profile, AppError> {
        if let Err(e) = self.repo.delete(identity.id).await {
            tracing::warn!(user_id = %identity.id, "profile delete during repair failed: {}", e);
        }
        let profile = Profile::from_identity(identity, &self.default_role);
        let created = self.repo.insert(profile).await?;
        tracing::info!(user_id = %identity.id, "profile recreated");
        Ok(created)
    }

    /// Delegates to the identity provider; independent of the profile
    /// record.
    pub async fn change_password(
        &self,
        access_token: &str,
        new_password: String,
    ) -> Result<(), AppError> {
        let request = ChangePasswordRequest { new_password };
        request.validate()?;
        self.provider
            .update_password(access_token, &SecretString::new(request.new_password))
            .await
    }
}
