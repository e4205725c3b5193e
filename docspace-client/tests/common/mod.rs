//! Test helper module for docspace-client integration tests.
//!
//! Builds a fully in-memory workspace with short timeouts so background
//! tasks settle quickly under the test runtime.

#![allow(dead_code)]

use docspace_client::config::ClientConfig;
use docspace_client::dtos::SignInRequest;
use docspace_client::models::{
    Document, Identity, IdentityMetadata, NewDocument, Session,
};
use docspace_client::providers::DocumentRepository;
use docspace_client::{MemoryBackends, Workspace};
use std::time::Duration;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "password-123";

pub struct TestApp {
    pub workspace: Workspace,
    pub backends: MemoryBackends,
}

impl TestApp {
    pub fn spawn() -> Self {
        let mut config = ClientConfig::default();
        config.session.profile_ensure_timeout_ms = 200;
        config.session.guard_recheck_delay_ms = 10;
        let (workspace, backends) = Workspace::in_memory(&config);
        Self {
            workspace,
            backends,
        }
    }

    pub fn register_user(&self, email: &str, role: Option<&str>) -> Identity {
        self.backends.provider.register_user(
            email,
            TEST_PASSWORD,
            IdentityMetadata {
                display_name: None,
                role: role.map(|r| r.to_string()),
            },
        )
    }

    pub async fn sign_in(&self, email: &str) -> Session {
        self.workspace
            .sessions
            .sign_in(SignInRequest {
                email: email.to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .expect("sign-in failed")
    }

    pub async fn seed_document(&self, owner_id: Uuid, new: NewDocument) -> Document {
        self.backends
            .documents
            .insert(Document::new(owner_id, new))
            .await
            .expect("failed to seed document")
    }

    pub async fn all_documents(&self) -> Vec<Document> {
        self.backends
            .documents
            .list()
            .await
            .expect("document list failed")
    }

    /// Gives spawned background tasks a chance to settle.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
