use docspace_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Document, DocumentUpdate, NewDocument};
use crate::providers::{DocumentRepository, DocumentStorage};
use crate::services::visibility::{self, DocumentFilter, SortKey, Viewer};

/// Owner-side document lifecycle plus the viewer projection. File byte
/// handling lives with the storage collaborator; only the storage
/// reference cascade is modeled here.
#[derive(Clone)]
pub struct DocumentService {
    repo: Arc<dyn DocumentRepository>,
    storage: Arc<dyn DocumentStorage>,
}

impl DocumentService {
    pub fn new(repo: Arc<dyn DocumentRepository>, storage: Arc<dyn DocumentStorage>) -> Self {
        Self { repo, storage }
    }

    pub async fn create(&self, owner_id: Uuid, new: NewDocument) -> Result<Document, AppError> {
        if new.title.trim().is_empty() {
            return Err(AppError::bad_request("document title is required"));
        }
        let doc = Document::new(owner_id, new);
        let created = self.repo.insert(doc).await?;
        tracing::info!(document_id = %created.id, owner_id = %owner_id, "document created");
        Ok(created)
    }

    async fn owned(&self, actor_id: Uuid, document_id: Uuid) -> Result<Document, AppError> {
        let doc = self
            .repo
            .find(document_id)
            .await?
            .ok_or_else(|| AppError::not_found("document not found"))?;
        if doc.owner_id != actor_id {
            return Err(AppError::unauthorized(
                "only the owner may modify a document",
            ));
        }
        Ok(doc)
    }

    pub async fn update(
        &self,
        actor_id: Uuid,
        document_id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Document, AppError> {
        self.owned(actor_id, document_id).await?;
        self.repo.update(document_id, &update).await
    }

    /// Deletes a document and cascades storage removal. Storage failure is
    /// logged but does not keep the record alive.
    pub async fn delete(&self, actor_id: Uuid, document_id: Uuid) -> Result<(), AppError> {
        let doc = self.owned(actor_id, document_id).await?;
        if let Some(path) = &doc.storage_path {
            if let Err(e) = self.storage.remove(path).await {
                tracing::warn!(document_id = %document_id, path, "storage removal failed: {}", e);
            }
        }
        self.repo.delete(document_id).await?;
        tracing::info!(document_id = %document_id, "document deleted");
        Ok(())
    }

    /// The accessible subset for `viewer`, filtered and optionally sorted.
    pub async fn list_for(
        &self,
        viewer: &Viewer,
        filter: &DocumentFilter,
        sort: Option<SortKey>,
    ) -> Result<Vec<Document>, AppError> {
        let docs = self.repo.list().await?;
        Ok(visibility::project(&docs, viewer, filter, sort))
    }
}
