//! Shared fixtures for integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use edusmart::ai::{PerformanceMetrics, RecentTopic, Tutor};
use edusmart::identity::Registration;
use edusmart::server::auth::{AuthConfig, AuthState};
use edusmart::store::{ActiveStore, Learner, MemoryStore, SqliteStore, StoreMode};
use edusmart::types::{Grade, Subject};

/// Scripted stand-in for the LLM
#[derive(Default)]
pub struct FakeTutor {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeTutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let tutor = Self::default();
        tutor.fail.store(true, Ordering::SeqCst);
        Arc::new(tutor)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, text: String) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            bail!("provider unavailable");
        }
        Ok(text)
    }
}

#[async_trait]
impl Tutor for FakeTutor {
    async fn answer(&self, subject: Subject, topic: &str, _question: &str) -> Result<String> {
        self.respond(format!("Here is how {} works in {}.", topic, subject))
    }

    async fn recommend(&self, learner: &Learner, recent: &[RecentTopic]) -> Result<String> {
        self.respond(format!("Study plan for {} covering {} topics.", learner.name, recent.len()))
    }

    async fn analyze(&self, metrics: &PerformanceMetrics) -> Result<String> {
        self.respond(format!("Analysis of {} queries.", metrics.total_queries))
    }
}

/// Auth state with hashing costs low enough for tests
pub fn cheap_auth() -> Arc<AuthState> {
    AuthState::new(AuthConfig {
        jwt_secret: "test-secret".to_string(),
        token_expiry_days: 7,
        password_memory_kib: 64,
        password_iterations: 1,
    })
}

pub fn demo_store() -> ActiveStore {
    ActiveStore::new(StoreMode::Demo, Arc::new(MemoryStore::seeded()))
}

pub async fn durable_store() -> ActiveStore {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    ActiveStore::new(StoreMode::Production, Arc::new(store))
}

pub fn registration(name: &str, email: &str, password: &str) -> Registration {
    Registration {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        password: Some(password.to_string()),
        grade: Some(Grade::Eleven),
        subjects: vec![Subject::Mathematics, Subject::Chemistry],
        learning_style: None,
    }
}
