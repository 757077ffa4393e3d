//! Dual-mode persistence
//!
//! Provides:
//! - Record types for learners, queries and learning materials
//! - The `Store` trait with a durable (SQLite) and an in-memory implementation
//! - `PersistenceGateway`, which probes the durable store and hands out the
//!   store a request should use

pub mod sqlite;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{StorageConfig, StoreSelection};
use crate::types::{Difficulty, Grade, LearningStyle, ResolutionStatus, Subject};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A registered learner account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string; never serialized
    #[serde(skip)]
    pub password_hash: String,
    pub grade: Grade,
    pub subjects: Vec<Subject>,
    pub learning_style: LearningStyle,
    pub total_queries_answered: u64,
    pub average_performance_score: f64,
    pub weak_areas: Vec<String>,
    pub strong_areas: Vec<String>,
    pub feedback_score: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Learner {
    /// Fresh account with zeroed aggregates
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        grade: Grade,
        subjects: Vec<Subject>,
        learning_style: LearningStyle,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
            grade,
            subjects,
            learning_style,
            total_queries_answered: 0,
            average_performance_score: 0.0,
            weak_areas: Vec::new(),
            strong_areas: Vec::new(),
            feedback_score: 0.0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Learner feedback on one answered query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub helpful: Option<bool>,
}

/// One homework question with its generated answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecord {
    pub id: String,
    #[serde(rename = "studentId")]
    pub learner_id: String,
    pub subject: Subject,
    pub topic: String,
    pub question: String,
    pub ai_response: Option<String>,
    pub difficulty: Difficulty,
    /// Milliseconds spent waiting for the answer
    pub response_time: u64,
    pub resolution_status: ResolutionStatus,
    #[serde(rename = "studentFeedback")]
    pub feedback: Feedback,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearningMaterial {
    pub id: String,
    pub title: String,
    pub subject: Subject,
    pub topic: String,
    pub description: Option<String>,
    pub content: String,
    pub difficulty: Difficulty,
    pub grade: Vec<Grade>,
    pub learning_style: Vec<LearningStyle>,
    pub resource_url: Option<String>,
    pub tags: Vec<String>,
    /// Minutes
    pub estimated_read_time: u32,
    pub usage_count: u64,
    pub rating: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a learner may change
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub subjects: Option<Vec<Subject>>,
    pub learning_style: Option<LearningStyle>,
}

/// Partial update for a catalog entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPatch {
    pub title: Option<String>,
    pub subject: Option<Subject>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub grade: Option<Vec<Grade>>,
    pub learning_style: Option<Vec<LearningStyle>>,
    pub resource_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub estimated_read_time: Option<u32>,
    pub rating: Option<f64>,
    pub is_active: Option<bool>,
}

impl MaterialPatch {
    /// Apply the present fields to `material`
    pub fn apply(&self, material: &mut LearningMaterial) {
        if let Some(v) = &self.title { material.title = v.clone(); }
        if let Some(v) = self.subject { material.subject = v; }
        if let Some(v) = &self.topic { material.topic = v.clone(); }
        if let Some(v) = &self.description { material.description = Some(v.clone()); }
        if let Some(v) = &self.content { material.content = v.clone(); }
        if let Some(v) = self.difficulty { material.difficulty = v; }
        if let Some(v) = &self.grade { material.grade = v.clone(); }
        if let Some(v) = &self.learning_style { material.learning_style = v.clone(); }
        if let Some(v) = &self.resource_url { material.resource_url = Some(v.clone()); }
        if let Some(v) = &self.tags { material.tags = v.clone(); }
        if let Some(v) = self.estimated_read_time { material.estimated_read_time = v; }
        if let Some(v) = self.rating { material.rating = v; }
        if let Some(v) = self.is_active { material.is_active = v; }
        material.updated_at = Utc::now();
    }
}

/// Catalog listing filter. Inactive entries are always excluded.
#[derive(Debug, Clone, Default)]
pub struct MaterialFilter {
    pub subject: Option<Subject>,
    pub difficulty: Option<Difficulty>,
    pub grade: Option<Grade>,
}

impl MaterialFilter {
    pub fn matches(&self, material: &LearningMaterial) -> bool {
        material.is_active
            && self.subject.map_or(true, |s| material.subject == s)
            && self.difficulty.map_or(true, |d| material.difficulty == d)
            && self.grade.map_or(true, |g| material.grade.contains(&g))
    }
}

/// Offset window into an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: usize,
    pub limit: usize,
}

impl Page {
    /// 1-based page number to an offset window
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            skip: page.saturating_sub(1).saturating_mul(limit),
            limit,
        }
    }
}

/// Storage operations shared by the durable and in-memory backends
#[async_trait]
pub trait Store: Send + Sync {
    /// Trivial read used as a connectivity check
    async fn ping(&self) -> Result<()>;

    async fn find_learner(&self, id: &str) -> Result<Option<Learner>>;
    async fn find_learner_by_email(&self, email: &str) -> Result<Option<Learner>>;
    /// Returns `false` when the store itself rejects a duplicate email
    async fn insert_learner(&self, learner: &Learner) -> Result<bool>;
    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Option<Learner>>;
    async fn increment_queries_answered(&self, id: &str) -> Result<()>;

    async fn insert_query(&self, query: &QueryRecord) -> Result<()>;
    /// Newest first
    async fn list_queries(&self, learner_id: &str, page: Page) -> Result<Vec<QueryRecord>>;
    async fn count_queries(&self, learner_id: &str) -> Result<u64>;
    /// Full history, newest first
    async fn all_queries(&self, learner_id: &str) -> Result<Vec<QueryRecord>>;
    /// Oldest first, at most `limit`
    async fn earliest_queries(&self, learner_id: &str, limit: usize) -> Result<Vec<QueryRecord>>;
    /// Overwrites the whole feedback record
    async fn set_feedback(&self, query_id: &str, feedback: &Feedback) -> Result<Option<QueryRecord>>;

    /// Rating desc, then usage desc
    async fn list_materials(&self, filter: &MaterialFilter, page: Page) -> Result<Vec<LearningMaterial>>;
    async fn count_materials(&self, filter: &MaterialFilter) -> Result<u64>;
    /// Fetch one entry and bump its usage counter
    async fn touch_material(&self, id: &str) -> Result<Option<LearningMaterial>>;
    async fn insert_material(&self, material: &LearningMaterial) -> Result<()>;
    async fn update_material(&self, id: &str, patch: &MaterialPatch) -> Result<Option<LearningMaterial>>;
    async fn delete_material(&self, id: &str) -> Result<bool>;
    /// Active entries for any of `subjects`, applicable to `grade`, at
    /// Intermediate or Advanced difficulty, rating desc
    async fn recommended_materials(
        &self,
        subjects: &[Subject],
        grade: Grade,
        limit: usize,
    ) -> Result<Vec<LearningMaterial>>;
}

/// Operating mode reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Durable store reachable
    Production,
    /// In-memory fallback
    Demo,
}

impl StoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreMode::Production => "production",
            StoreMode::Demo => "demo",
        }
    }

    pub fn is_demo(&self) -> bool {
        *self == StoreMode::Demo
    }
}

/// The store chosen for one request, together with the mode it implies
#[derive(Clone)]
pub struct ActiveStore {
    pub mode: StoreMode,
    pub store: Arc<dyn Store>,
}

impl ActiveStore {
    pub fn new(mode: StoreMode, store: Arc<dyn Store>) -> Self {
        Self { mode, store }
    }
}

impl std::ops::Deref for ActiveStore {
    type Target = dyn Store;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

/// Decides between the durable store and the in-memory fallback
///
/// In-memory writes made while the durable store is unreachable are never
/// migrated back once it recovers.
pub struct PersistenceGateway {
    durable: Option<Arc<SqliteStore>>,
    fallback: Arc<MemoryStore>,
    probe_timeout: Duration,
    /// Cached probe result when selection is `Startup`
    sticky: Option<bool>,
}

impl PersistenceGateway {
    /// Gateway with no durable store: every request runs in demo mode
    pub fn demo_only() -> Self {
        Self {
            durable: None,
            fallback: Arc::new(MemoryStore::seeded()),
            probe_timeout: Duration::from_millis(2000),
            sticky: None,
        }
    }

    pub fn new(durable: Option<Arc<SqliteStore>>, fallback: Arc<MemoryStore>, probe_timeout: Duration) -> Self {
        Self {
            durable,
            fallback,
            probe_timeout,
            sticky: None,
        }
    }

    /// Open the configured durable store, falling back to demo mode if it
    /// cannot be opened
    pub async fn from_config(config: &StorageConfig) -> Self {
        let durable = match &config.database_url {
            Some(url) => match SqliteStore::connect(url).await {
                Ok(store) => {
                    tracing::info!("Durable store connected: {}", url);
                    Some(Arc::new(store))
                }
                Err(e) => {
                    warn!("Durable store connection error: {:#}", e);
                    warn!("Running in DEMO MODE - data is kept in memory only");
                    None
                }
            },
            None => {
                warn!("No database configured - running in DEMO MODE");
                None
            }
        };

        let mut gateway = Self::new(
            durable,
            Arc::new(MemoryStore::seeded()),
            Duration::from_millis(config.probe_timeout_ms),
        );

        if config.selection == StoreSelection::Startup {
            let available = gateway.probe().await;
            gateway.sticky = Some(available);
        }

        gateway
    }

    /// Whether the durable store answers a trivial read in time.
    /// Errors and timeouts both count as unavailable.
    pub async fn probe(&self) -> bool {
        let Some(durable) = &self.durable else {
            return false;
        };

        match tokio::time::timeout(self.probe_timeout, durable.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!("Durable store probe failed: {:#}", e);
                false
            }
            Err(_) => {
                debug!("Durable store probe timed out after {:?}", self.probe_timeout);
                false
            }
        }
    }

    /// Choose the store for one request
    pub async fn select(&self) -> ActiveStore {
        let available = match self.sticky {
            Some(available) => available,
            None => self.probe().await,
        };

        match (&self.durable, available) {
            (Some(durable), true) => ActiveStore::new(StoreMode::Production, durable.clone()),
            _ => {
                if self.durable.is_some() {
                    warn!("Durable store unreachable, serving request from the in-memory store");
                }
                ActiveStore::new(StoreMode::Demo, self.fallback.clone())
            }
        }
    }
}
