pub mod config;
pub mod dtos;
pub mod guard;
pub mod models;
pub mod providers;
pub mod services;

use docspace_core::error::AppError;
use std::sync::Arc;

use config::ClientConfig;
use guard::RouteGuard;
use providers::memory::{
    MemoryDocumentRepository, MemoryDocumentStorage, MemoryIdentityProvider,
    MemoryNotificationRepository, MemoryProfileRepository, MemorySessionCache,
};
use providers::{
    DocumentRepository, DocumentStorage, IdentityProvider, NotificationRepository,
    ProfileRepository, SessionCache,
};
use services::{
    DocumentService, NotificationService, ProfileService, SessionManager, ShareActor,
    SharingService, Viewer,
};

/// The wired-up workspace client: session manager, profile lifecycle,
/// document lifecycle, sharing, notifications, and the route guard, all
/// over injected provider backends.
#[derive(Clone)]
pub struct Workspace {
    pub sessions: Arc<SessionManager>,
    pub profiles: ProfileService,
    pub documents: DocumentService,
    pub sharing: SharingService,
    pub notifications: NotificationService,
    pub guard: RouteGuard,
}

/// Handles onto the in-memory backends, for seeding and inspection.
pub struct MemoryBackends {
    pub provider: Arc<MemoryIdentityProvider>,
    pub profiles: Arc<MemoryProfileRepository>,
    pub documents: Arc<MemoryDocumentRepository>,
    pub notifications: Arc<MemoryNotificationRepository>,
    pub storage: Arc<MemoryDocumentStorage>,
    pub cache: Arc<MemorySessionCache>,
}

impl Workspace {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &ClientConfig,
        provider: Arc<dyn IdentityProvider>,
        profile_repo: Arc<dyn ProfileRepository>,
        document_repo: Arc<dyn DocumentRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        storage: Arc<dyn DocumentStorage>,
        cache: Arc<dyn SessionCache>,
    ) -> Self {
        let profiles = ProfileService::new(
            profile_repo,
            provider.clone(),
            config.session.default_role.clone(),
        );
        let sessions = SessionManager::new(
            provider,
            profiles.clone(),
            cache,
            config.session.clone(),
        );
        let guard = RouteGuard::new(sessions.clone(), config.session.guard_recheck_delay());
        Self {
            documents: DocumentService::new(document_repo.clone(), storage),
            sharing: SharingService::new(document_repo, notification_repo.clone()),
            notifications: NotificationService::new(notification_repo),
            sessions,
            profiles,
            guard,
        }
    }

    /// Fully in-memory workspace (local mode and tests).
    pub fn in_memory(config: &ClientConfig) -> (Self, MemoryBackends) {
        let backends = MemoryBackends {
            provider: Arc::new(MemoryIdentityProvider::new()),
            profiles: Arc::new(MemoryProfileRepository::new()),
            documents: Arc::new(MemoryDocumentRepository::new()),
            notifications: Arc::new(MemoryNotificationRepository::new()),
            storage: Arc::new(MemoryDocumentStorage::new()),
            cache: Arc::new(MemorySessionCache::new()),
        };
        let workspace = Self::new(
            config,
            backends.provider.clone(),
            backends.profiles.clone(),
            backends.documents.clone(),
            backends.notifications.clone(),
            backends.storage.clone(),
            backends.cache.clone(),
        );
        (workspace, backends)
    }

    /// Builds the viewer for the currently authenticated identity, or
    /// `None` when signed out. Department comes from the profile; a
    /// missing or unreachable profile degrades to a department-less
    /// viewer rather than failing.
    pub async fn current_viewer(&self) -> Option<Viewer> {
        let snapshot = self.sessions.snapshot();
        let identity = snapshot.identity()?.clone();
        let profile = match self.profiles.find(identity.id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(user_id = %identity.id, "profile lookup failed: {}", e);
                None
            }
        };
        Some(Viewer::from_profile(&identity, profile.as_ref()))
    }

    /// Builds the sharing actor for the current identity: profile display
    /// name first, then the identity's derived name, then the raw email.
    pub async fn current_share_actor(&self) -> Result<ShareActor, AppError> {
        let snapshot = self.sessions.snapshot();
        let identity = snapshot
            .identity()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("not signed in"))?;
        let display_name = match self.profiles.find(identity.id).await {
            Ok(Some(profile)) => profile
                .display_name
                .unwrap_or_else(|| identity.email.clone()),
            _ => identity
                .derived_display_name()
                .unwrap_or_else(|| identity.email.clone()),
        };
        Ok(ShareActor {
            id: identity.id,
            display_name,
        })
    }
}
