//! In-memory backends for the provider traits.
//!
//! These back the local workspace mode and the integration test harness.
//! The identity provider keeps failure switches so fail-closed paths can
//! be exercised deterministically.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use docspace_core::error::AppError;
use secrecy::{ExposeSecret, SecretString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};
use tokio::sync::{broadcast, Notify};
use uuid::Uuid;

use crate::models::{
    AuthEvent, Document, DocumentUpdate, Identity, IdentityMetadata, Notification, Profile,
    ProfileUpdate, Recipient, Session, SignOutScope,
};
use crate::providers::{
    DocumentRepository, DocumentStorage, IdentityProvider, NotificationRepository,
    ProfileRepository, SessionCache,
};

const EVENT_CHANNEL_CAPACITY: usize = 16;

struct MemoryUser {
    identity: Identity,
    password: String,
}

pub struct MemoryIdentityProvider {
    users: DashMap<String, MemoryUser>,
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    fail_confirm: AtomicBool,
    fail_sign_out: AtomicBool,
    hold_confirm: AtomicBool,
    confirm_release: Notify,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            users: DashMap::new(),
            current: Mutex::new(None),
            events,
            fail_confirm: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            hold_confirm: AtomicBool::new(false),
            confirm_release: Notify::new(),
        }
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user without signing them in.
    pub fn register_user(
        &self,
        email: &str,
        password: &str,
        metadata: IdentityMetadata,
    ) -> Identity {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            metadata,
        };
        self.users.insert(
            email.to_string(),
            MemoryUser {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );
        identity
    }

    /// Seeds a provider-side cached session, as left behind by a previous
    /// run. Bootstrap must still confirm it before trusting it.
    pub fn seed_session(&self, session: Session) {
        *self.current.lock().unwrap() = Some(session);
    }

    /// When set, `confirm_user` answers with a network error.
    pub fn set_confirm_failure(&self, fail: bool) {
        self.fail_confirm.store(fail, Ordering::SeqCst);
    }

    /// When set, `sign_out` answers with a network error. The local
    /// session state is still cleared, mirroring a provider outage.
    pub fn set_sign_out_failure(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// When set, `confirm_user` parks until
    /// [`release_confirm`](Self::release_confirm), so in-flight
    /// validations can be raced against other transitions.
    pub fn set_confirm_hold(&self, hold: bool) {
        self.hold_confirm.store(hold, Ordering::SeqCst);
    }

    /// Wakes every parked `confirm_user` call.
    pub fn release_confirm(&self) {
        self.hold_confirm.store(false, Ordering::SeqCst);
        self.confirm_release.notify_waiters();
    }

    fn open_session(&self, identity: Identity) -> Session {
        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            identity,
        };
        *self.current.lock().unwrap() = Some(session.clone());
        session
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn confirm_user(&self, access_token: &str) -> Result<Identity, AppError> {
        if self.hold_confirm.load(Ordering::SeqCst) {
            self.confirm_release.notified().await;
        }
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err(AppError::network("identity check unreachable"));
        }
        let current = self.current.lock().unwrap().clone();
        match current {
            Some(session) if session.access_token == access_token => Ok(session.identity),
            _ => Err(AppError::unauthorized("unknown or expired access token")),
        }
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, AppError> {
        let identity = match self.users.get(email) {
            Some(user) if user.password == *password.expose_secret() => user.identity.clone(),
            _ => return Err(AppError::unauthorized("invalid credentials")),
        };
        let session = self.open_session(identity);
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        metadata: IdentityMetadata,
    ) -> Result<Session, AppError> {
        if self.users.contains_key(email) {
            return Err(AppError::conflict("email already registered"));
        }
        let identity = self.register_user(email, password.expose_secret(), metadata);
        let session = self.open_session(identity);
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, scope: SignOutScope) -> Result<(), AppError> {
        *self.current.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AppError::network("sign-out endpoint unreachable"));
        }
        tracing::debug!(%scope, "memory provider signed out");
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &SecretString,
    ) -> Result<(), AppError> {
        let identity = self.confirm_user(access_token).await?;
        match self.users.get_mut(&identity.email) {
            Some(mut user) => {
                user.password = new_password.expose_secret().to_string();
                Ok(())
            }
            None => Err(AppError::not_found("user no longer exists")),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[derive(Default)]
pub struct MemoryProfileRepository {
    profiles: DashMap<Uuid, Profile>,
    fail_all: AtomicBool,
}

impl MemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every call answers with a network error.
    pub fn set_failure(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AppError::network("profile collection unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        self.check()?;
        Ok(self.profiles.get(&user_id).map(|p| p.clone()))
    }

    async fn insert(&self, profile: Profile) -> Result<Profile, AppError> {
        self.check()?;
        if self.profiles.contains_key(&profile.user_id) {
            return Err(AppError::conflict("profile already exists"));
        }
        self.profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn update(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<Profile, AppError> {
        self.check()?;
        match self.profiles.get_mut(&user_id) {
            Some(mut entry) => {
                update.apply_to(&mut entry);
                Ok(entry.clone())
            }
            None => Err(AppError::not_found("profile not found")),
        }
    }

    async fn set_role(&self, user_id: Uuid, role: &str) -> Result<(), AppError> {
        self.check()?;
        match self.profiles.get_mut(&user_id) {
            Some(mut entry) => {
                entry.role = Some(role.to_string());
                entry.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AppError::not_found("profile not found")),
        }
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), AppError> {
        self.check()?;
        self.profiles.remove(&user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDocumentRepository {
    documents: RwLock<Vec<Document>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn list(&self) -> Result<Vec<Document>, AppError> {
        let mut docs = self.documents.read().unwrap().clone();
        // Newest first; stable for equal timestamps.
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self
            .documents
            .read()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn insert(&self, doc: Document) -> Result<Document, AppError> {
        self.documents.write().unwrap().push(doc.clone());
        Ok(doc)
    }

    async fn update(&self, id: Uuid, update: &DocumentUpdate) -> Result<Document, AppError> {
        let mut docs = self.documents.write().unwrap();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                update.apply_to(doc);
                Ok(doc.clone())
            }
            None => Err(AppError::not_found("document not found")),
        }
    }

    async fn merge_share_grants(
        &self,
        id: Uuid,
        departments: &[String],
        users: &[Uuid],
    ) -> Result<Document, AppError> {
        let mut docs = self.documents.write().unwrap();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                doc.merge_grants(departments, users);
                Ok(doc.clone())
            }
            None => Err(AppError::not_found("document not found")),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut docs = self.documents.write().unwrap();
        let before = docs.len();
        docs.retain(|d| d.id != id);
        if docs.len() == before {
            return Err(AppError::not_found("document not found"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNotificationRepository {
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn list_for(&self, recipients: &[Recipient]) -> Result<Vec<Notification>, AppError> {
        let mut matching: Vec<Notification> = self
            .notifications
            .read()
            .unwrap()
            .iter()
            .filter(|n| recipients.contains(&n.recipient))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn insert(&self, notification: Notification) -> Result<Notification, AppError> {
        self.notifications
            .write()
            .unwrap()
            .push(notification.clone());
        Ok(notification)
    }

    async fn mark_read(&self, id: Uuid) -> Result<(), AppError> {
        let mut notifications = self.notifications.write().unwrap();
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.mark_read();
                Ok(())
            }
            None => Err(AppError::not_found("notification not found")),
        }
    }

    async fn mark_all_read(&self, recipients: &[Recipient]) -> Result<u64, AppError> {
        let mut notifications = self.notifications.write().unwrap();
        let mut updated = 0;
        for notification in notifications
            .iter_mut()
            .filter(|n| !n.is_read && recipients.contains(&n.recipient))
        {
            notification.mark_read();
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut notifications = self.notifications.write().unwrap();
        let before = notifications.len();
        notifications.retain(|n| n.id != id);
        if notifications.len() == before {
            return Err(AppError::not_found("notification not found"));
        }
        Ok(())
    }

    async fn clear_for(&self, recipients: &[Recipient]) -> Result<u64, AppError> {
        let mut notifications = self.notifications.write().unwrap();
        let before = notifications.len();
        notifications.retain(|n| !recipients.contains(&n.recipient));
        Ok((before - notifications.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryDocumentStorage {
    objects: DashMap<String, ()>,
}

impl MemoryDocumentStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str) {
        self.objects.insert(path.to_string(), ());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }
}

#[async_trait]
impl DocumentStorage for MemoryDocumentStorage {
    async fn remove(&self, path: &str) -> Result<(), AppError> {
        if self.objects.remove(path).is_none() {
            tracing::warn!(path, "storage object already absent");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionCache {
    entries: DashMap<String, String>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionCache for MemorySessionCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}
