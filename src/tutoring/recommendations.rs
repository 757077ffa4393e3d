//! Personalized study advice

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::ai::{RecentTopic, Tutor};
use crate::error::{AppError, AppResult};
use crate::store::{ActiveStore, LearningMaterial, Page};

const RECENT_QUERIES: usize = 10;
const SUGGESTED_MATERIALS: usize = 5;
const DEFAULT_RATING: u8 = 3;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub student_id: String,
    pub recommendations: String,
    pub suggested_materials: Vec<LearningMaterial>,
    pub generated_at: DateTime<Utc>,
}

/// Advice from the tutor plus a shortlist of catalog entries.
///
/// The catalog is only consulted once the tutor has answered.
pub async fn compose(store: &ActiveStore, tutor: &dyn Tutor, learner_id: &str) -> AppResult<Recommendation> {
    let learner = store
        .find_learner(learner_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))?;

    let recent: Vec<RecentTopic> = store
        .list_queries(learner_id, Page::new(1, RECENT_QUERIES))
        .await?
        .into_iter()
        .map(|q| RecentTopic {
            subject: q.subject,
            topic: q.topic,
            rating: q.feedback.rating.unwrap_or(DEFAULT_RATING),
        })
        .collect();

    let recommendations = tutor.recommend(&learner, &recent).await.map_err(|e| {
        warn!("Tutor failed to generate recommendations: {:#}", e);
        AppError::Service("Failed to generate recommendations".to_string())
    })?;

    let suggested_materials = store
        .recommended_materials(&learner.subjects, learner.grade, SUGGESTED_MATERIALS)
        .await?;

    Ok(Recommendation {
        student_id: learner.id,
        recommendations,
        suggested_materials,
        generated_at: Utc::now(),
    })
}
