//! Document visibility resolver.
//!
//! Pure projection over raw document records: no I/O, no mutation. The
//! access rule is the union of four independent grant channels (owner,
//! public flag, department share, user share); adding a viewer to any
//! channel can only add documents to their view.

use uuid::Uuid;

use crate::models::{Document, Identity, Priority, Profile};

/// The authorization inputs for a single viewer: identity id plus the
/// department taken from their profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: Uuid,
    pub department: Option<String>,
}

impl Viewer {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            department: None,
        }
    }

    pub fn with_department(id: Uuid, department: impl Into<String>) -> Self {
        Self {
            id,
            department: Some(department.into()),
        }
    }

    /// A missing profile yields a viewer with no department; department
    /// shares simply do not match for them.
    pub fn from_profile(identity: &Identity, profile: Option<&Profile>) -> Self {
        Self {
            id: identity.id,
            department: profile.and_then(|p| p.department.clone()),
        }
    }
}

/// Whether `viewer` may access `doc`. Total: empty grant lists never
/// grant and never fail.
pub fn visible(doc: &Document, viewer: &Viewer) -> bool {
    if doc.owner_id == viewer.id {
        return true;
    }
    if doc.is_public {
        return true;
    }
    if let Some(department) = &viewer.department {
        if doc.shared_with.iter().any(|d| d == department) {
            return true;
        }
    }
    doc.shared_with_users.contains(&viewer.id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
    Public,
    Private,
}

/// Search/filter predicates layered on top of `visible`. Each predicate
/// is independent; conjunction is commutative, so filter order never
/// affects the result.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Case-insensitive substring match over title, description, and
    /// department.
    pub query: Option<String>,
    pub priority: Option<Priority>,
    pub department: Option<String>,
    pub language: Option<String>,
    pub scope: Option<ScopeFilter>,
}

impl DocumentFilter {
    pub fn matches(&self, doc: &Document) -> bool {
        self.matches_query(doc)
            && self.matches_priority(doc)
            && self.matches_department(doc)
            && self.matches_language(doc)
            && self.matches_scope(doc)
    }

    fn matches_query(&self, doc: &Document) -> bool {
        let Some(query) = &self.query else {
            return true;
        };
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        doc.title.to_lowercase().contains(&needle)
            || doc
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
            || doc
                .department
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    fn matches_priority(&self, doc: &Document) -> bool {
        match self.priority {
            Some(priority) => doc.priority == Some(priority),
            None => true,
        }
    }

    fn matches_department(&self, doc: &Document) -> bool {
        match &self.department {
            Some(department) => doc.department.as_deref() == Some(department.as_str()),
            None => true,
        }
    }

    fn matches_language(&self, doc: &Document) -> bool {
        match &self.language {
            Some(language) => doc.language.as_deref() == Some(language.as_str()),
            None => true,
        }
    }

    fn matches_scope(&self, doc: &Document) -> bool {
        match self.scope {
            Some(ScopeFilter::Public) => doc.is_public,
            Some(ScopeFilter::Private) => !doc.is_public,
            None => true,
        }
    }
}

/// Exactly one sort key is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// URGENT=3 > HIGH=2 > ROUTINE=1 > unset=0, descending.
    Priority,
    /// Creation timestamp, descending.
    Date,
    /// Title, lexicographic ascending.
    Title,
}

fn priority_rank(doc: &Document) -> u8 {
    doc.priority.map(Priority::rank).unwrap_or(0)
}

/// Stable sort: documents with equal keys keep their input order.
pub fn sort_documents(docs: &mut [Document], key: SortKey) {
    match key {
        SortKey::Priority => docs.sort_by(|a, b| priority_rank(b).cmp(&priority_rank(a))),
        SortKey::Date => docs.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Title => docs.sort_by(|a, b| a.title.cmp(&b.title)),
    }
}

/// Computes the accessible, filtered, optionally sorted view of `docs`
/// for `viewer`. Always a subset of the input.
pub fn project(
    docs: &[Document],
    viewer: &Viewer,
    filter: &DocumentFilter,
    sort: Option<SortKey>,
) -> Vec<Document> {
    let mut result: Vec<Document> = docs
        .iter()
        .filter(|doc| visible(doc, viewer) && filter.matches(doc))
        .cloned()
        .collect();
    if let Some(key) = sort {
        sort_documents(&mut result, key);
    }
    result
}
