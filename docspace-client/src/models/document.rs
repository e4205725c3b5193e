use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Urgent,
    High,
    Routine,
}

impl Priority {
    /// Sort rank: URGENT=3 > HIGH=2 > ROUTINE=1; an unset priority ranks 0.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 3,
            Priority::High => 2,
            Priority::Routine => 1,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Urgent => write!(f, "URGENT"),
            Priority::High => write!(f, "HIGH"),
            Priority::Routine => write!(f, "ROUTINE"),
        }
    }
}

/// A workspace document record. Grant lists default to empty on
/// deserialization so documents from older records stay total inputs to
/// the visibility resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub is_public: bool,
    /// Department tags granted access (flat string equality, no hierarchy).
    #[serde(default)]
    pub shared_with: Vec<String>,
    /// Individual users granted access.
    #[serde(default)]
    pub shared_with_users: Vec<Uuid>,
    pub language: Option<String>,
    pub storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when an owner creates a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub shared_with_users: Vec<Uuid>,
    pub language: Option<String>,
    pub storage_path: Option<String>,
}

impl Document {
    pub fn new(owner_id: Uuid, new: NewDocument) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: new.title,
            description: new.description,
            department: new.department,
            priority: new.priority,
            is_public: new.is_public,
            shared_with: new.shared_with,
            shared_with_users: new.shared_with_users,
            language: new.language,
            storage_path: new.storage_path,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set-union merge of the grant channels. Additive: existing recipients
    /// are never removed, duplicates are never introduced.
    pub fn merge_grants(&mut self, departments: &[String], users: &[Uuid]) {
        for dept in departments {
            if !self.shared_with.contains(dept) {
                self.shared_with.push(dept.clone());
            }
        }
        for user in users {
            if !self.shared_with_users.contains(user) {
                self.shared_with_users.push(*user);
            }
        }
        self.updated_at = Utc::now();
    }
}

/// Allow-listed partial update applied by the document owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl DocumentUpdate {
    pub fn apply_to(&self, doc: &mut Document) {
        if let Some(title) = &self.title {
            doc.title = title.clone();
        }
        if let Some(description) = &self.description {
            doc.description = Some(description.clone());
        }
        if let Some(department) = &self.department {
            doc.department = Some(department.clone());
        }
        if let Some(priority) = self.priority {
            doc.priority = Some(priority);
        }
        if let Some(is_public) = self.is_public {
            doc.is_public = is_public;
        }
        if let Some(language) = &self.language {
            doc.language = Some(language.clone());
        }
        doc.updated_at = Utc::now();
    }
}
