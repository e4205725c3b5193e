//! Identity & session lifecycle.
//!
//! State machine: `Bootstrapping → Validating → {Authenticated,
//! Unauthenticated}`, with `Authenticated → Unauthenticated` on sign-out
//! or detected invalidation. Fail-closed: any uncertainty during
//! bootstrap (absent session, failed identity check, network error)
//! resolves to `Unauthenticated` and purges the session-prefix cache
//! keys. A cached session object alone is never trusted without a live
//! confirmation from the provider.

use docspace_core::error::AppError;
use secrecy::SecretString;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use validator::Validate;

use crate::config::SessionSettings;
use crate::dtos::{SignInRequest, SignUpRequest};
use crate::models::{AuthEvent, Identity, Session, SignOutScope};
use crate::providers::{IdentityProvider, SessionCache};
use crate::services::profile::ProfileService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Bootstrapping,
    Validating,
    Authenticated(Identity),
    Unauthenticated,
}

/// Consumer-facing view of the session state, published through a watch
/// channel so snapshot replacement is atomic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub state: AuthState,
}

impl AuthSnapshot {
    /// True until the first bootstrap validation settles.
    pub fn loading(&self) -> bool {
        matches!(self.state, AuthState::Bootstrapping | AuthState::Validating)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            AuthState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

struct Inner {
    session: Option<Session>,
}

pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    profiles: ProfileService,
    cache: Arc<dyn SessionCache>,
    settings: SessionSettings,
    state: watch::Sender<AuthSnapshot>,
    inner: Mutex<Inner>,
    /// Bumped on every atomic session replacement; a validation response
    /// carrying an older generation is stale and must be discarded.
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: ProfileService,
        cache: Arc<dyn SessionCache>,
        settings: SessionSettings,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(AuthSnapshot {
            state: AuthState::Bootstrapping,
        });
        Arc::new(Self {
            provider,
            profiles,
            cache,
            settings,
            state,
            inner: Mutex::new(Inner { session: None }),
            generation: AtomicU64::new(0),
        })
    }

    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.inner.lock().unwrap().session.clone()
    }

    /// Loads and validates any cached session, then starts consuming
    /// provider-pushed auth events. Authenticated is reported only after
    /// the provider confirms a live user; everything else fails closed.
    pub async fn bootstrap(self: &Arc<Self>) {
        self.spawn_event_loop();

        let generation = self.generation.load(Ordering::SeqCst);
        let session = match self.provider.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!("no cached session");
                self.purge_session_cache();
                self.set_unauthenticated();
                return;
            }
            Err(e) => {
                tracing::warn!("session load failed, treating as signed out: {}", e);
                self.purge_session_cache();
                self.set_unauthenticated();
                return;
            }
        };

        // send_replace publishes even with no live receivers; snapshot()
        // readers must always observe the latest transition.
        self.state.send_replace(AuthSnapshot {
            state: AuthState::Validating,
        });

        match self.provider.confirm_user(&session.access_token).await {
            Ok(identity) => {
                if self.generation.load(Ordering::SeqCst) != generation {
                    tracing::debug!("discarding stale bootstrap validation");
                    return;
                }
                let session = Session { identity, ..session };
                let identity = session.identity.clone();
                self.set_authenticated(session);
                self.spawn_profile_ensure(identity);
            }
            Err(e) => {
                tracing::warn!("identity check failed, signing out locally: {}", e);
                // The purge is generation-guarded like the transition: a
                // stale validation failure must not wipe the cache behind
                // a session that has since been replaced.
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.purge_session_cache();
                    self.set_unauthenticated();
                } else {
                    tracing::debug!("discarding stale bootstrap validation failure");
                }
            }
        }
    }

    pub async fn sign_in(self: &Arc<Self>, request: SignInRequest) -> Result<Session, AppError> {
        request.validate()?;
        let password = SecretString::new(request.password);
        let session = self.provider.sign_in(&request.email, &password).await?;
        // The event loop observes this too; applying directly keeps the
        // local transition independent of event delivery.
        self.apply_event(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(self: &Arc<Self>, request: SignUpRequest) -> Result<Session, AppError> {
        request.validate()?;
        let password = SecretString::new(request.password);
        let session = self
            .provider
            .sign_up(&request.email, &password, request.metadata)
            .await?;
        self.apply_event(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Global provider sign-out is best-effort; the local transition to
    /// Unauthenticated is unconditional and never waits on the network
    /// call succeeding.
    pub async fn sign_out(&self) {
        if let Err(e) = self.provider.sign_out(SignOutScope::Global).await {
            tracing::warn!("provider sign-out failed: {}", e);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.purge_session_cache();
        self.set_unauthenticated();
        tracing::info!("signed out");
    }

    /// Applies a provider-pushed auth event. Events are trusted directly
    /// and replace the session atomically without re-validation.
    pub fn apply_event(self: &Arc<Self>, event: AuthEvent) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        match event {
            AuthEvent::SignedIn(session) => {
                let identity = session.identity.clone();
                self.set_authenticated(session);
                self.spawn_profile_ensure(identity);
            }
            AuthEvent::TokenRefreshed(session) => {
                self.set_authenticated(session);
            }
            AuthEvent::SignedOut => {
                self.purge_session_cache();
                self.set_unauthenticated();
            }
        }
    }

    fn spawn_event_loop(self: &Arc<Self>) {
        let mut events = self.provider.subscribe();
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(manager) = manager.upgrade() else {
                            break;
                        };
                        manager.apply_event(event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// First-of-two race between profile-ensure and a timer. The timer
    /// only bounds logging; losing does not abort the ensure task (soft
    /// cancellation) and neither outcome gates the Authenticated state.
    fn spawn_profile_ensure(&self, identity: Identity) {
        let profiles = self.profiles.clone();
        let timeout = self.settings.profile_ensure_timeout();
        let ensure = tokio::spawn(async move { profiles.ensure_profile(&identity).await });
        tokio::spawn(async move {
            tokio::select! {
                result = ensure => match result {
                    Ok(Ok(profile)) => {
                        tracing::debug!(user_id = %profile.user_id, "profile ensured");
                    }
                    Ok(Err(e)) => tracing::warn!("background profile ensure failed: {}", e),
                    Err(e) => tracing::warn!("background profile ensure panicked: {}", e),
                },
                _ = tokio::time::sleep(timeout) => {
                    tracing::warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "profile ensure still running after deadline"
                    );
                }
            }
        });
    }

    fn purge_session_cache(&self) {
        let removed = self.cache.purge_prefix(&self.settings.key_prefix);
        if removed > 0 {
            tracing::debug!(removed, "purged session cache keys");
        }
    }

    fn set_authenticated(&self, session: Session) {
        let identity = session.identity.clone();
        self.inner.lock().unwrap().session = Some(session);
        self.state.send_replace(AuthSnapshot {
            state: AuthState::Authenticated(identity),
        });
    }

    fn set_unauthenticated(&self) {
        self.inner.lock().unwrap().session = None;
        self.state.send_replace(AuthSnapshot {
            state: AuthState::Unauthenticated,
        });
    }
}
