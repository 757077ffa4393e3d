//! Generative-text collaborator
//!
//! The rest of the crate only sees the `Tutor` trait; `LlmClient` is the
//! production implementation talking to an OpenAI-compatible API.

pub mod keyring;
pub mod llm;
pub mod prompts;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::store::Learner;
use crate::types::Subject;

pub use llm::LlmClient;

/// One recent query as fed to the advice generator
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecentTopic {
    pub subject: Subject,
    pub topic: String,
    /// Learner rating, 3 when none was given
    pub rating: u8,
}

/// Input for a performance analysis
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_queries: usize,
    pub average_rating: f64,
    /// Ratings per subject, 3 standing in for unrated queries
    pub subject_performance: BTreeMap<String, Vec<u8>>,
}

/// Produces answers, study advice and performance analyses
#[async_trait]
pub trait Tutor: Send + Sync {
    /// Answer a homework question
    async fn answer(&self, subject: Subject, topic: &str, question: &str) -> Result<String>;

    /// Free-text study recommendations for a learner
    async fn recommend(&self, learner: &Learner, recent: &[RecentTopic]) -> Result<String>;

    /// Free-text assessment of performance metrics
    async fn analyze(&self, metrics: &PerformanceMetrics) -> Result<String>;
}
