use docspace_core::error::AppError;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::ShareRequest;
use crate::models::{Document, Notification, Recipient};
use crate::providers::{DocumentRepository, NotificationRepository};

/// The actor performing a share, with the display name used in the
/// notification message (profile display name, falling back to email).
#[derive(Debug, Clone)]
pub struct ShareActor {
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Debug)]
pub struct ShareOutcome {
    pub document: Document,
    /// Recipients that were newly granted and notified by this call.
    pub notified: Vec<Recipient>,
}

/// Grants department/user access to a document and emits one notification
/// per newly granted recipient.
#[derive(Clone)]
pub struct SharingService {
    documents: Arc<dyn DocumentRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl SharingService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            documents,
            notifications,
        }
    }

    /// Idempotent under retry: recipients already present in the grant
    /// sets are neither re-granted nor re-notified.
    pub async fn share_document(
        &self,
        actor: &ShareActor,
        request: ShareRequest,
    ) -> Result<ShareOutcome, AppError> {
        request.validate()?;

        let before = self
            .documents
            .find(request.document_id)
            .await?
            .ok_or_else(|| AppError::not_found("document not found"))?;

        // Dedup within the batch, then drop already-granted recipients so
        // a retry of the same request notifies nobody twice.
        let departments: Vec<String> = dedup(request.departments.iter().cloned());
        let users: Vec<Uuid> = dedup(request.users.iter().copied());

        let mut newly_granted: Vec<Recipient> = Vec::new();
        for dept in &departments {
            if !before.shared_with.contains(dept) {
                newly_granted.push(Recipient::Department(dept.clone()));
            }
        }
        for user in &users {
            if !before.shared_with_users.contains(user) {
                newly_granted.push(Recipient::User(*user));
            }
        }

        let document = self
            .documents
            .merge_share_grants(request.document_id, &departments, &users)
            .await?;

        for recipient in &newly_granted {
            let notification = Notification::new_share(
                recipient.clone(),
                &before.title,
                &actor.display_name,
                request.message.as_deref(),
            );
            // Notifications are a best-effort side effect of the grant.
            if let Err(e) = self.notifications.insert(notification).await {
                tracing::warn!(
                    document_id = %request.document_id,
                    recipient = %recipient,
                    "share notification failed: {}",
                    e
                );
            }
        }

        tracing::info!(
            document_id = %request.document_id,
            actor_id = %actor.id,
            granted = newly_granted.len(),
            "document shared"
        );

        Ok(ShareOutcome {
            document,
            notified: newly_granted,
        })
    }
}

fn dedup<T: Clone + Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}
