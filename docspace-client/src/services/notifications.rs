use docspace_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Notification, Recipient};
use crate::providers::NotificationRepository;
use crate::services::visibility::Viewer;

/// Recipient-facing notification log: list, read-state, deletion.
#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// The viewer receives notifications addressed to them directly and
    /// to their department tag.
    fn recipients_of(viewer: &Viewer) -> Vec<Recipient> {
        let mut recipients = vec![Recipient::User(viewer.id)];
        if let Some(department) = &viewer.department {
            recipients.push(Recipient::Department(department.clone()));
        }
        recipients
    }

    /// Newest first.
    pub async fn list(&self, viewer: &Viewer) -> Result<Vec<Notification>, AppError> {
        self.repo.list_for(&Self::recipients_of(viewer)).await
    }

    /// Idempotent: marking an already-read notification is a no-op
    /// success.
    pub async fn mark_read(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.mark_read(id).await
    }

    pub async fn mark_all_read(&self, viewer: &Viewer) -> Result<u64, AppError> {
        self.repo.mark_all_read(&Self::recipients_of(viewer)).await
    }

    /// Permanent, no undo.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.delete(id).await
    }

    /// Permanent, no undo.
    pub async fn clear_all(&self, viewer: &Viewer) -> Result<u64, AppError> {
        self.repo.clear_for(&Self::recipients_of(viewer)).await
    }
}
