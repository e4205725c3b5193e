mod common;

use common::TestApp;
use docspace_client::models::{NewDocument, Priority};
use docspace_client::services::visibility::{
    project, sort_documents, visible, DocumentFilter, ScopeFilter, SortKey, Viewer,
};
use uuid::Uuid;

fn new_doc(title: &str) -> NewDocument {
    NewDocument {
        title: title.to_string(),
        ..Default::default()
    }
}

// =============================================================================
// Access rule
// =============================================================================

#[tokio::test]
async fn department_share_grants_access() {
    let app = TestApp::spawn();
    let owner = Uuid::new_v4();
    let doc = app
        .seed_document(
            owner,
            NewDocument {
                shared_with: vec!["Finance".to_string(), "Engineering".to_string()],
                is_public: false,
                ..new_doc("Q4 budget variance")
            },
        )
        .await;

    let viewer = Viewer::with_department(Uuid::new_v4(), "Finance");
    assert_ne!(doc.owner_id, viewer.id);
    assert!(visible(&doc, &viewer));
}

#[tokio::test]
async fn projection_is_always_a_subset() {
    let app = TestApp::spawn();
    let owner = Uuid::new_v4();
    let stranger = Viewer::new(Uuid::new_v4());
    for i in 0..5 {
        app.seed_document(owner, new_doc(&format!("doc {}", i)))
            .await;
    }
    app.seed_document(
        owner,
        NewDocument {
            is_public: true,
            ..new_doc("public notice")
        },
    )
    .await;

    let all = app.all_documents().await;
    let view = project(&all, &stranger, &DocumentFilter::default(), None);

    assert!(view.len() <= all.len());
    for doc in &view {
        assert!(all.iter().any(|d| d.id == doc.id));
    }
    // Only the public document is visible to a stranger.
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].title, "public notice");
}

#[tokio::test]
async fn adding_a_user_grant_is_monotonic() {
    let app = TestApp::spawn();
    let owner = Uuid::new_v4();
    let viewer = Viewer::new(Uuid::new_v4());
    let other = Viewer::with_department(Uuid::new_v4(), "Engineering");

    let doc = app
        .seed_document(
            owner,
            NewDocument {
                shared_with: vec!["Engineering".to_string()],
                ..new_doc("maintenance schedule")
            },
        )
        .await;

    let all = app.all_documents().await;
    let before_viewer = project(&all, &viewer, &DocumentFilter::default(), None);
    let before_other = project(&all, &other, &DocumentFilter::default(), None);

    let mut granted = doc.clone();
    granted.merge_grants(&[], &[viewer.id]);
    let updated = vec![granted];

    let after_viewer = project(&updated, &viewer, &DocumentFilter::default(), None);
    let after_other = project(&updated, &other, &DocumentFilter::default(), None);

    // The grant adds the document for the viewer and removes nothing for
    // anyone else.
    assert!(after_viewer.len() >= before_viewer.len());
    assert!(after_viewer.iter().any(|d| d.id == doc.id));
    assert_eq!(before_other.len(), after_other.len());
}

// =============================================================================
// Filters and sorting
// =============================================================================

#[tokio::test]
async fn filter_order_does_not_affect_the_result() {
    let app = TestApp::spawn();
    let owner = Uuid::new_v4();
    app.seed_document(
        owner,
        NewDocument {
            priority: Some(Priority::Urgent),
            department: Some("Safety & Operations".to_string()),
            is_public: true,
            ..new_doc("safety protocol amendment")
        },
    )
    .await;
    app.seed_document(
        owner,
        NewDocument {
            priority: Some(Priority::Routine),
            department: Some("Engineering".to_string()),
            is_public: true,
            ..new_doc("infrastructure maintenance")
        },
    )
    .await;

    let all = app.all_documents().await;
    let viewer = Viewer::new(Uuid::new_v4());

    // Apply the same predicates in two passes, in both orders.
    let priority_only = DocumentFilter {
        priority: Some(Priority::Urgent),
        ..Default::default()
    };
    let scope_only = DocumentFilter {
        scope: Some(ScopeFilter::Public),
        ..Default::default()
    };

    let a_then_b: Vec<_> = project(
        &project(&all, &viewer, &priority_only, None),
        &viewer,
        &scope_only,
        None,
    );
    let b_then_a: Vec<_> = project(
        &project(&all, &viewer, &scope_only, None),
        &viewer,
        &priority_only,
        None,
    );

    assert_eq!(a_then_b, b_then_a);
    assert_eq!(a_then_b.len(), 1);
    assert_eq!(a_then_b[0].title, "safety protocol amendment");
}

#[tokio::test]
async fn text_query_matches_title_description_and_department() {
    let app = TestApp::spawn();
    let owner = Uuid::new_v4();
    app.seed_document(
        owner,
        NewDocument {
            description: Some("evacuation procedures".to_string()),
            department: Some("Safety & Security".to_string()),
            is_public: true,
            ..new_doc("Emergency response drill")
        },
    )
    .await;

    let all = app.all_documents().await;
    let viewer = Viewer::new(Uuid::new_v4());

    for query in ["emergency", "EVACUATION", "security"] {
        let filter = DocumentFilter {
            query: Some(query.to_string()),
            ..Default::default()
        };
        assert_eq!(project(&all, &viewer, &filter, None).len(), 1, "{}", query);
    }

    let miss = DocumentFilter {
        query: Some("payroll".to_string()),
        ..Default::default()
    };
    assert!(project(&all, &viewer, &miss, None).is_empty());
}

#[tokio::test]
async fn sorting_twice_yields_identical_order() {
    let app = TestApp::spawn();
    let owner = Uuid::new_v4();
    for (title, priority) in [
        ("alpha", Some(Priority::High)),
        ("bravo", None),
        ("charlie", Some(Priority::High)),
        ("delta", Some(Priority::Urgent)),
    ] {
        app.seed_document(
            owner,
            NewDocument {
                priority,
                is_public: true,
                ..new_doc(title)
            },
        )
        .await;
    }

    let all = app.all_documents().await;

    let mut first = all.clone();
    sort_documents(&mut first, SortKey::Priority);
    let mut second = first.clone();
    sort_documents(&mut second, SortKey::Priority);

    assert_eq!(first, second);
    assert_eq!(first[0].title, "delta");
    assert_eq!(first[3].title, "bravo");
}

#[tokio::test]
async fn title_sort_is_lexicographic_ascending() {
    let app = TestApp::spawn();
    let owner = Uuid::new_v4();
    for title in ["zeta report", "alpha report", "mid report"] {
        app.seed_document(
            owner,
            NewDocument {
                is_public: true,
                ..new_doc(title)
            },
        )
        .await;
    }

    let all = app.all_documents().await;
    let viewer = Viewer::new(Uuid::new_v4());
    let view = project(&all, &viewer, &DocumentFilter::default(), Some(SortKey::Title));

    let titles: Vec<_> = view.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["alpha report", "mid report", "zeta report"]);
}
