//! Summary metrics over a learner's query history

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use super::round2;
use crate::ai::{PerformanceMetrics, Tutor};
use crate::error::{AppError, AppResult};
use crate::store::{ActiveStore, QueryRecord};

/// Queries considered by the performance analysis
const ANALYSIS_WINDOW: usize = 20;
/// Stand-in for an unrated query in per-subject rating lists
const NEUTRAL_RATING: u8 = 3;

const NOT_ENOUGH_DATA: &str = "Not enough data to analyze yet. Submit a few questions and rate \
the answers, then check back for a personalized performance analysis.";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_queries: usize,
    /// Mean of the ratings given, 0 when none were
    pub average_rating: f64,
    /// Milliseconds
    pub average_response_time: f64,
    pub helpful_count: usize,
    pub subject_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub analysis: String,
    pub metrics: PerformanceMetrics,
}

/// Pure aggregation over already-loaded queries
pub fn summarize(queries: &[QueryRecord]) -> Statistics {
    let ratings: Vec<f64> = queries
        .iter()
        .filter_map(|q| q.feedback.rating)
        .map(f64::from)
        .collect();

    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        round2(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    let average_response_time = if queries.is_empty() {
        0.0
    } else {
        round2(queries.iter().map(|q| q.response_time as f64).sum::<f64>() / queries.len() as f64)
    };

    let subject_distribution = queries.iter().fold(BTreeMap::new(), |mut acc, q| {
        *acc.entry(q.subject.to_string()).or_insert(0) += 1;
        acc
    });

    Statistics {
        total_queries: queries.len(),
        average_rating,
        average_response_time,
        helpful_count: queries.iter().filter(|q| q.feedback.helpful == Some(true)).count(),
        subject_distribution,
    }
}

/// Metrics fed to the analysis prompt
pub fn performance_metrics(queries: &[QueryRecord]) -> PerformanceMetrics {
    let average_rating = if queries.is_empty() {
        0.0
    } else {
        let sum: f64 = queries.iter().map(|q| f64::from(q.feedback.rating.unwrap_or(0))).sum();
        round2(sum / queries.len() as f64)
    };

    let mut subject_performance: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    for q in queries {
        subject_performance
            .entry(q.subject.to_string())
            .or_default()
            .push(q.feedback.rating.unwrap_or(NEUTRAL_RATING));
    }

    PerformanceMetrics {
        total_queries: queries.len(),
        average_rating,
        subject_performance,
    }
}

/// Statistics over the learner's full history
pub async fn compute(store: &ActiveStore, learner_id: &str) -> AppResult<Statistics> {
    let queries = store.all_queries(learner_id).await?;
    Ok(summarize(&queries))
}

/// Ask the tutor to assess the learner's earliest queries
pub async fn analyze(store: &ActiveStore, tutor: &dyn Tutor, learner_id: &str) -> AppResult<Analysis> {
    let queries = store.earliest_queries(learner_id, ANALYSIS_WINDOW).await?;
    let metrics = performance_metrics(&queries);

    if queries.is_empty() {
        return Ok(Analysis {
            analysis: NOT_ENOUGH_DATA.to_string(),
            metrics,
        });
    }

    let analysis = tutor.analyze(&metrics).await.map_err(|e| {
        warn!("Tutor failed to analyze performance: {:#}", e);
        AppError::Service("Failed to analyze performance".to_string())
    })?;

    Ok(Analysis { analysis, metrics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Feedback;
    use crate::types::{Difficulty, ResolutionStatus, Subject};
    use chrono::Utc;

    fn query(subject: Subject, rating: Option<u8>, helpful: Option<bool>, response_time: u64) -> QueryRecord {
        let now = Utc::now();
        QueryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            learner_id: "l1".into(),
            subject,
            topic: "t".into(),
            question: "q".into(),
            ai_response: Some("a".into()),
            difficulty: Difficulty::Intermediate,
            response_time,
            resolution_status: ResolutionStatus::Resolved,
            feedback: Feedback { rating, comment: None, helpful },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_history() {
        let stats = summarize(&[]);
        assert_eq!(
            stats,
            Statistics {
                total_queries: 0,
                average_rating: 0.0,
                average_response_time: 0.0,
                helpful_count: 0,
                subject_distribution: BTreeMap::new(),
            }
        );
    }

    #[test]
    fn test_unrated_queries_do_not_drag_average() {
        let queries = vec![
            query(Subject::Mathematics, Some(5), Some(true), 100),
            query(Subject::Mathematics, Some(4), Some(false), 200),
            query(Subject::Physics, None, None, 301),
        ];
        let stats = summarize(&queries);

        assert_eq!(stats.total_queries, 3);
        assert_eq!(stats.average_rating, 4.5);
        assert_eq!(stats.average_response_time, 200.33);
        assert_eq!(stats.helpful_count, 1);
        assert_eq!(stats.subject_distribution["Mathematics"], 2);
        assert_eq!(stats.subject_distribution["Physics"], 1);
    }

    #[test]
    fn test_metrics_substitute_missing_ratings() {
        let queries = vec![
            query(Subject::Biology, Some(4), None, 0),
            query(Subject::Biology, None, None, 0),
        ];
        let metrics = performance_metrics(&queries);

        // Missing counts as 0 in the mean and as 3 in the per-subject list
        assert_eq!(metrics.average_rating, 2.0);
        assert_eq!(metrics.subject_performance["Biology"], vec![4, 3]);
    }
}
