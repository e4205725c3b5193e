//! External collaborator interfaces.
//!
//! The identity provider, the profile/document/notification collections,
//! storage, and the local session cache are owned by external systems;
//! this crate only talks to them through these traits. Built-in backends:
//! an in-memory set (local mode and tests) and a REST identity provider.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use docspace_core::error::AppError;
use secrecy::SecretString;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{
    AuthEvent, Document, DocumentUpdate, Identity, IdentityMetadata, Notification, Profile,
    ProfileUpdate, Recipient, Session, SignOutScope,
};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the provider's cached session, if any. The result is never
    /// trusted without a subsequent [`confirm_user`](Self::confirm_user).
    async fn get_session(&self) -> Result<Option<Session>, AppError>;

    /// Confirms the session's user is live on the provider side.
    async fn confirm_user(&self, access_token: &str) -> Result<Identity, AppError>;

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, AppError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        metadata: IdentityMetadata,
    ) -> Result<Session, AppError>;

    async fn sign_out(&self, scope: SignOutScope) -> Result<(), AppError>;

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &SecretString,
    ) -> Result<(), AppError>;

    /// Subscribes to provider-pushed auth-change events.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, AppError>;

    async fn insert(&self, profile: Profile) -> Result<Profile, AppError>;

    async fn update(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<Profile, AppError>;

    /// Role backfill path used only by profile-ensure; not part of the
    /// owner-mutable allow-list.
    async fn set_role(&self, user_id: Uuid, role: &str) -> Result<(), AppError>;

    async fn delete(&self, user_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// All document records, newest first.
    async fn list(&self) -> Result<Vec<Document>, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Document>, AppError>;

    async fn insert(&self, doc: Document) -> Result<Document, AppError>;

    async fn update(&self, id: Uuid, update: &DocumentUpdate) -> Result<Document, AppError>;

    /// Atomic set-union merge of the grant channels; one server-side
    /// operation from the caller's view.
    async fn merge_share_grants(
        &self,
        id: Uuid,
        departments: &[String],
        users: &[Uuid],
    ) -> Result<Document, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list_for(&self, recipients: &[Recipient]) -> Result<Vec<Notification>, AppError>;

    async fn insert(&self, notification: Notification) -> Result<Notification, AppError>;

    async fn mark_read(&self, id: Uuid) -> Result<(), AppError>;

    async fn mark_all_read(&self, recipients: &[Recipient]) -> Result<u64, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    async fn clear_for(&self, recipients: &[Recipient]) -> Result<u64, AppError>;
}

#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Removes the stored object behind a document's storage reference.
    async fn remove(&self, path: &str) -> Result<(), AppError>;
}

/// Local key/value cache. Any key matching the configured session-key
/// prefix is the unit of cleanup on sign-out or detected invalidation.
pub trait SessionCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    fn remove(&self, key: &str);

    fn keys(&self) -> Vec<String>;

    /// Removes every key starting with `prefix`; returns how many.
    fn purge_prefix(&self, prefix: &str) -> usize {
        let matching: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        for key in &matching {
            self.remove(key);
        }
        matching.len()
    }
}
