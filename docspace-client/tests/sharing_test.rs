mod common;

use common::TestApp;
use docspace_client::dtos::ShareRequest;
use docspace_client::models::{NewDocument, Recipient};
use docspace_client::providers::{DocumentRepository, NotificationRepository};
use docspace_client::services::{ShareActor, Viewer};
use uuid::Uuid;

fn actor() -> ShareActor {
    ShareActor {
        id: Uuid::new_v4(),
        display_name: "Raj Kumar".to_string(),
    }
}

fn request(document_id: Uuid, departments: &[&str], users: &[Uuid]) -> ShareRequest {
    ShareRequest {
        document_id,
        departments: departments.iter().map(|d| d.to_string()).collect(),
        users: users.to_vec(),
        message: None,
    }
}

#[tokio::test]
async fn share_with_no_recipients_is_a_validation_error() {
    let app = TestApp::spawn();
    let actor = actor();
    let doc = app
        .seed_document(
            actor.id,
            NewDocument {
                title: "ops manual".to_string(),
                ..Default::default()
            },
        )
        .await;

    let result = app
        .workspace
        .sharing
        .share_document(&actor, request(doc.id, &[], &[]))
        .await;

    assert!(result.is_err());
    // No grant mutation, no notifications.
    let unchanged = app.backends.documents.find(doc.id).await.unwrap().unwrap();
    assert!(unchanged.shared_with.is_empty());
    assert!(unchanged.shared_with_users.is_empty());
    let recipient = Recipient::User(Uuid::new_v4());
    assert!(app
        .backends
        .notifications
        .list_for(&[recipient])
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn share_for_missing_document_is_not_found() {
    let app = TestApp::spawn();
    let result = app
        .workspace
        .sharing
        .share_document(&actor(), request(Uuid::new_v4(), &["Finance"], &[]))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn share_merges_grants_and_notifies_each_recipient_once() {
    let app = TestApp::spawn();
    let actor = actor();
    let user = Uuid::new_v4();
    let doc = app
        .seed_document(
            actor.id,
            NewDocument {
                title: "safety drill report".to_string(),
                shared_with: vec!["Management".to_string()],
                ..Default::default()
            },
        )
        .await;

    // Duplicates within the batch collapse to one grant and one
    // notification each.
    let outcome = app
        .workspace
        .sharing
        .share_document(
            &actor,
            request(
                doc.id,
                &["Finance", "Finance", "Engineering"],
                &[user, user],
            ),
        )
        .await
        .expect("share failed");

    assert_eq!(
        outcome.document.shared_with,
        vec![
            "Management".to_string(),
            "Finance".to_string(),
            "Engineering".to_string()
        ]
    );
    assert_eq!(outcome.document.shared_with_users, vec![user]);
    assert_eq!(outcome.notified.len(), 3);

    let finance = app
        .backends
        .notifications
        .list_for(&[Recipient::Department("Finance".to_string())])
        .await
        .unwrap();
    assert_eq!(finance.len(), 1);
    assert!(finance[0].message.contains("Raj Kumar"));
    assert!(finance[0].message.contains("safety drill report"));

    let direct = app
        .backends
        .notifications
        .list_for(&[Recipient::User(user)])
        .await
        .unwrap();
    assert_eq!(direct.len(), 1);
}

#[tokio::test]
async fn repeating_an_identical_share_is_idempotent() {
    let app = TestApp::spawn();
    let actor = actor();
    let user = Uuid::new_v4();
    let doc = app
        .seed_document(
            actor.id,
            NewDocument {
                title: "budget variance".to_string(),
                ..Default::default()
            },
        )
        .await;
    let req = request(doc.id, &["Finance"], &[user]);

    let first = app
        .workspace
        .sharing
        .share_document(&actor, req.clone())
        .await
        .expect("share failed");
    let second = app
        .workspace
        .sharing
        .share_document(&actor, req)
        .await
        .expect("retry failed");

    assert_eq!(first.document.shared_with, second.document.shared_with);
    assert_eq!(
        first.document.shared_with_users,
        second.document.shared_with_users
    );
    assert!(second.notified.is_empty());

    let finance = app
        .backends
        .notifications
        .list_for(&[Recipient::Department("Finance".to_string())])
        .await
        .unwrap();
    assert_eq!(finance.len(), 1);
    let direct = app
        .backends
        .notifications
        .list_for(&[Recipient::User(user)])
        .await
        .unwrap();
    assert_eq!(direct.len(), 1);
}

#[tokio::test]
async fn channels_are_additive_and_non_exclusive() {
    let app = TestApp::spawn();
    let actor = actor();
    let user = Uuid::new_v4();
    let doc = app
        .seed_document(
            actor.id,
            NewDocument {
                title: "energy study".to_string(),
                is_public: true,
                ..Default::default()
            },
        )
        .await;

    app.workspace
        .sharing
        .share_document(&actor, request(doc.id, &["Engineering"], &[user]))
        .await
        .expect("share failed");

    let shared = app.backends.documents.find(doc.id).await.unwrap().unwrap();
    // Public flag, department grant, and user grant all hold at once.
    assert!(shared.is_public);
    assert_eq!(shared.shared_with, vec!["Engineering".to_string()]);
    assert_eq!(shared.shared_with_users, vec![user]);
}

#[tokio::test]
async fn share_actor_prefers_the_profile_display_name() {
    let app = TestApp::spawn();
    app.register_user("priya@metro.example", None);
    let signed_out = app.workspace.current_share_actor().await;
    assert!(signed_out.is_err());

    let session = app.sign_in("priya@metro.example").await;
    app.settle().await;

    // Before any profile edit the ensured profile carries the derived
    // name (email local-part).
    let actor = app
        .workspace
        .current_share_actor()
        .await
        .expect("no share actor");
    assert_eq!(actor.id, session.identity.id);
    assert_eq!(actor.display_name, "priya");

    app.workspace
        .profiles
        .update_profile(
            session.identity.id,
            docspace_client::models::ProfileUpdate {
                display_name: Some("Priya Nair".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("profile update failed");

    let actor = app
        .workspace
        .current_share_actor()
        .await
        .expect("no share actor");
    assert_eq!(actor.display_name, "Priya Nair");
}

#[tokio::test]
async fn share_actor_falls_back_when_the_profile_is_unreachable() {
    let app = TestApp::spawn();
    app.register_user("raj@metro.example", None);
    app.sign_in("raj@metro.example").await;
    app.settle().await;
    app.backends.profiles.set_failure(true);

    let actor = app
        .workspace
        .current_share_actor()
        .await
        .expect("no share actor");
    // Derived from the identity, not the (unreachable) profile.
    assert_eq!(actor.display_name, "raj");
}

#[tokio::test]
async fn newly_granted_user_gains_visibility() {
    let app = TestApp::spawn();
    let actor = actor();
    let user = Uuid::new_v4();
    let doc = app
        .seed_document(
            actor.id,
            NewDocument {
                title: "feedback analysis".to_string(),
                ..Default::default()
            },
        )
        .await;
    let viewer = Viewer::new(user);

    let before = app
        .workspace
        .documents
        .list_for(&viewer, &Default::default(), None)
        .await
        .unwrap();
    assert!(before.is_empty());

    app.workspace
        .sharing
        .share_document(&actor, request(doc.id, &[], &[user]))
        .await
        .expect("share failed");

    let after = app
        .workspace
        .documents
        .list_for(&viewer, &Default::default(), None)
        .await
        .unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, doc.id);
}
