//! Registration and login against both store modes

mod common;

use common::{cheap_auth, demo_store, durable_store, registration};
use edusmart::config::DemoConfig;
use edusmart::identity::{self, Credentials, ProfileUpdate, Registration};
use edusmart::store::memory::{DEMO_EMAIL, DEMO_LEARNER_ID};
use edusmart::types::{LearningStyle, Subject};
use edusmart::AppError;

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: Some(email.to_string()),
        password: Some(password.to_string()),
    }
}

#[tokio::test]
async fn test_duplicate_email_conflicts_in_durable_mode() {
    let store = durable_store().await;
    let auth = cheap_auth();

    identity::register(&store, &auth, registration("Ada", "ada@school.edu", "secret1")).await.unwrap();
    let err = identity::register(&store, &auth, registration("Ada Two", "ADA@school.edu", "secret2"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_duplicate_email_conflicts_in_demo_mode() {
    let store = demo_store();
    let auth = cheap_auth();

    identity::register(&store, &auth, registration("Ada", "ada@school.edu", "secret1")).await.unwrap();
    let err = identity::register(&store, &auth, registration("Ada", "ada@school.edu", "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // The seeded demo account is taken too
    let err = identity::register(&store, &auth, registration("Demo", DEMO_EMAIL, "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_concurrent_registration_keeps_one_account() {
    for store in [demo_store(), durable_store().await] {
        let auth = cheap_auth();

        let (first, second) = tokio::join!(
            identity::register(&store, &auth, registration("Ada", "ada@school.edu", "secret1")),
            identity::register(&store, &auth, registration("Ada", "ada@school.edu", "secret2")),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_)))));
    }
}

#[tokio::test]
async fn test_register_requires_fields() {
    let store = demo_store();
    let auth = cheap_auth();

    let missing_grade = Registration { grade: None, ..registration("Ada", "ada@school.edu", "secret1") };
    let err = identity::register(&store, &auth, missing_grade).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let short_password = registration("Ada", "ada@school.edu", "123");
    let err = identity::register(&store, &auth, short_password).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let bad_email = registration("Ada", "not-an-email", "secret1");
    let err = identity::register(&store, &auth, bad_email).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_register_issues_token_for_new_learner() {
    let store = durable_store().await;
    let auth = cheap_auth();

    let session = identity::register(&store, &auth, registration("Ada", " Ada@School.edu ", "secret1"))
        .await
        .unwrap();

    assert_eq!(session.learner.email, "ada@school.edu");
    assert_eq!(session.learner.learning_style, LearningStyle::Visual);
    assert_eq!(session.learner.total_queries_answered, 0);
    assert_ne!(session.learner.password_hash, "secret1");

    let claims = auth.validate_token(&session.token).unwrap();
    assert_eq!(claims.sub, session.learner.id);
    assert_eq!(claims.email, "ada@school.edu");
}

#[tokio::test]
async fn test_durable_login_checks_password_strictly() {
    let store = durable_store().await;
    let auth = cheap_auth();
    let demo = DemoConfig::default();

    identity::register(&store, &auth, registration("Ada", "ada@school.edu", "secret1")).await.unwrap();

    identity::login(&store, &auth, &demo, credentials("ada@school.edu", "secret1")).await.unwrap();

    // The demo relaxations never apply to durable accounts
    let err = identity::login(&store, &auth, &demo, credentials("ada@school.edu", "demo123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    let err = identity::login(&store, &auth, &demo, credentials(DEMO_EMAIL, "anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn test_demo_login_relaxations() {
    let store = demo_store();
    let auth = cheap_auth();
    let demo = DemoConfig::default();

    // Demo address with any password
    let session = identity::login(&store, &auth, &demo, credentials(DEMO_EMAIL, "whatever"))
        .await
        .unwrap();
    assert_eq!(session.learner.id, DEMO_LEARNER_ID);

    identity::register(&store, &auth, registration("Ada", "ada@school.edu", "secret1")).await.unwrap();

    // Real password and the demo password both work for in-memory accounts
    identity::login(&store, &auth, &demo, credentials("ada@school.edu", "secret1")).await.unwrap();
    identity::login(&store, &auth, &demo, credentials("ada@school.edu", "demo123")).await.unwrap();

    // Anything else fails
    let err = identity::login(&store, &auth, &demo, credentials("ada@school.edu", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    let err = identity::login(&store, &auth, &demo, credentials("nobody@school.edu", "demo123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn test_demo_relaxations_can_be_disabled() {
    let store = demo_store();
    let auth = cheap_auth();
    let demo = DemoConfig { relaxed_login: false, ..DemoConfig::default() };

    let err = identity::login(&store, &auth, &demo, credentials(DEMO_EMAIL, "whatever"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn test_profile_update() {
    let store = demo_store();

    let update = ProfileUpdate {
        subjects: Some(vec![Subject::Biology]),
        learning_style: Some(LearningStyle::Kinesthetic),
    };
    let learner = identity::update_profile(&store, DEMO_LEARNER_ID, update).await.unwrap();
    assert_eq!(learner.subjects, vec![Subject::Biology]);
    assert_eq!(learner.learning_style, LearningStyle::Kinesthetic);

    let profile = identity::profile(&store, DEMO_LEARNER_ID).await.unwrap();
    assert_eq!(profile.learner.subjects, vec![Subject::Biology]);
    assert!(profile.recent_queries.is_empty());

    let err = identity::profile(&store, "missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
