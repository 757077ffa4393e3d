//! Learner registration, login and profile management
//!
//! Every operation runs against the `ActiveStore` chosen for the request.
//! Demo-mode login relaxations only apply when that store is the in-memory
//! fallback.

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::DemoConfig;
use crate::error::{AppError, AppResult};
use crate::pagination::PageRequest;
use crate::server::auth::AuthState;
use crate::store::{memory, ActiveStore, Learner, ProfilePatch, QueryRecord};
use crate::types::{Grade, LearningStyle, Subject};

const MAX_NAME_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 6;
const RECENT_QUERIES: usize = 10;

/// Registration payload. Required fields are optional here so that a
/// missing one yields a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub grade: Option<Grade>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    pub learning_style: Option<LearningStyle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub subjects: Option<Vec<Subject>>,
    pub learning_style: Option<LearningStyle>,
}

/// An issued token together with the learner it was issued for
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub learner: Learner,
}

/// A learner with their most recent queries
#[derive(Debug, Clone)]
pub struct Profile {
    pub learner: Learner,
    pub recent_queries: Vec<QueryRecord>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Create a learner account and issue a token for it
pub async fn register(store: &ActiveStore, auth: &AuthState, input: Registration) -> AppResult<Session> {
    let (Some(name), Some(email), Some(password), Some(grade)) = (
        present(input.name),
        present(input.email),
        input.password.filter(|p| !p.is_empty()),
        input.grade,
    ) else {
        return Err(AppError::validation("Please provide all required fields"));
    };

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Please provide a valid email"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("Name cannot exceed 100 characters"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password must be at least 6 characters"));
    }

    if store.find_learner_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let hash = auth.hash_password(&password).await?;
    let learner = Learner::new(
        name,
        email,
        hash,
        grade,
        input.subjects,
        input.learning_style.unwrap_or_default(),
    );

    // Both stores check uniqueness on insert; a lost race lands here
    if !store.insert_learner(&learner).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    info!("Registered learner {} ({} mode)", learner.id, store.mode.as_str());
    let token = auth.issue_token(&learner.id, &learner.email)?;
    Ok(Session { token, learner })
}

/// Authenticate by email and password
pub async fn login(
    store: &ActiveStore,
    auth: &AuthState,
    demo: &DemoConfig,
    credentials: Credentials,
) -> AppResult<Session> {
    let (Some(email), Some(password)) = (present(credentials.email), credentials.password) else {
        return Err(AppError::validation("Please provide email and password"));
    };
    let email = normalize_email(&email);
    let relaxed = store.mode.is_demo() && demo.relaxed_login;

    if relaxed && email == normalize_email(&demo.email) {
        let learner = match store.find_learner_by_email(&email).await? {
            Some(learner) => learner,
            None => memory::demo_learner(),
        };
        warn!("Demo account login accepted without password check");
        let token = auth.issue_token(&learner.id, &learner.email)?;
        return Ok(Session { token, learner });
    }

    let invalid = || AppError::Auth("Invalid credentials".to_string());
    let learner = store.find_learner_by_email(&email).await?.ok_or_else(invalid)?;

    let accepted = auth.verify_password(&password, &learner.password_hash).await
        || (relaxed && password == demo.password);
    if !accepted {
        return Err(invalid());
    }

    let token = auth.issue_token(&learner.id, &learner.email)?;
    Ok(Session { token, learner })
}

/// The learner's profile with their latest queries
pub async fn profile(store: &ActiveStore, learner_id: &str) -> AppResult<Profile> {
    let learner = store
        .find_learner(learner_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))?;

    let (_, window) = PageRequest::new(1, RECENT_QUERIES).window()?;
    let recent_queries = store.list_queries(learner_id, window).await?;

    Ok(Profile { learner, recent_queries })
}

/// Change subjects and/or learning style
pub async fn update_profile(store: &ActiveStore, learner_id: &str, update: ProfileUpdate) -> AppResult<Learner> {
    let patch = ProfilePatch {
        subjects: update.subjects,
        learning_style: update.learning_style,
    };

    store
        .update_profile(learner_id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))
}
