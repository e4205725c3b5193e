use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Share,
    Approval,
    System,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Share => write!(f, "share"),
            NotificationKind::Approval => write!(f, "approval"),
            NotificationKind::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

/// A resolved notification target: either an individual user or every
/// member of a department tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum Recipient {
    User(Uuid),
    Department(String),
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::User(id) => write!(f, "user:{}", id),
            Recipient::Department(tag) => write!(f, "department:{}", tag),
        }
    }
}

/// Recipient-facing event log entry. Mutable only via read-state; deleted
/// individually or in bulk by the recipient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub is_read: bool,
    pub action_required: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new_share(
        recipient: Recipient,
        document_title: &str,
        actor_name: &str,
        message: Option<&str>,
    ) -> Self {
        let body = match message {
            Some(note) => format!(
                "{} shared \"{}\" with you: {}",
                actor_name, document_title, note
            ),
            None => format!("{} shared \"{}\" with you.", actor_name, document_title),
        };
        Self {
            id: Uuid::new_v4(),
            recipient,
            kind: NotificationKind::Share,
            title: "Document shared".to_string(),
            message: body,
            priority: NotificationPriority::Medium,
            is_read: false,
            action_required: false,
            created_at: Utc::now(),
        }
    }

    pub fn mark_read(&mut self) {
        self.is_read = true;
    }
}
