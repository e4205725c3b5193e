//! Route guard for the protected area of the workspace.
//!
//! Consumes the session manager's `{loading, identity}` snapshot. While
//! loading, render a pending indicator and do not redirect; once settled,
//! either allow or redirect to the login entry point. A deferred re-check
//! covers the race where the initial redirect is issued before the router
//! has committed navigation, which otherwise leaves a stuck
//! unauthenticated screen.

use std::sync::Arc;

use crate::services::session::SessionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Still loading; render a pending indicator, no redirect.
    Pending,
    /// Authenticated; render the protected content.
    Allow,
    /// Not authenticated; redirect to the login entry point.
    RedirectToLogin,
}

#[derive(Clone)]
pub struct RouteGuard {
    sessions: Arc<SessionManager>,
    recheck_delay: std::time::Duration,
}

impl RouteGuard {
    pub fn new(sessions: Arc<SessionManager>, recheck_delay: std::time::Duration) -> Self {
        Self {
            sessions,
            recheck_delay,
        }
    }

    pub fn decide(&self) -> RouteDecision {
        let snapshot = self.sessions.snapshot();
        if snapshot.loading() {
            return RouteDecision::Pending;
        }
        match snapshot.identity() {
            Some(_) => RouteDecision::Allow,
            None => {
                tracing::warn!("no identity, redirecting to login");
                RouteDecision::RedirectToLogin
            }
        }
    }

    /// Re-evaluates shortly after an initial decision. Callers issue the
    /// redirect again if this still answers `RedirectToLogin`.
    pub async fn deferred_recheck(&self) -> RouteDecision {
        tokio::time::sleep(self.recheck_delay).await;
        self.decide()
    }
}
