//! Query lifecycle: submit, list, feedback

use chrono::Utc;
use serde::Deserialize;
use std::time::Instant;
use tracing::{info, warn};

use crate::ai::Tutor;
use crate::error::{AppError, AppResult};
use crate::pagination::{PageRequest, Pagination};
use crate::store::{ActiveStore, Feedback, QueryRecord};
use crate::types::{Difficulty, ResolutionStatus, Subject};

const MIN_QUESTION_LEN: usize = 10;
const MAX_QUESTION_LEN: usize = 5000;
const MAX_COMMENT_LEN: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewQuery {
    pub subject: Option<Subject>,
    pub topic: Option<String>,
    pub question: Option<String>,
    pub difficulty: Option<Difficulty>,
}

/// Feedback payload. Rating is kept wide so out-of-range values reach
/// validation instead of failing to parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackInput {
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub helpful: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct QueryPage {
    pub queries: Vec<QueryRecord>,
    pub pagination: Pagination,
}

/// Ask the tutor and persist the answered query.
///
/// Nothing is written if the tutor fails.
pub async fn submit(
    store: &ActiveStore,
    tutor: &dyn Tutor,
    learner_id: &str,
    input: NewQuery,
) -> AppResult<QueryRecord> {
    let topic = input.topic.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let question = input.question.map(|q| q.trim().to_string()).filter(|q| !q.is_empty());
    let (Some(subject), Some(topic), Some(question)) = (input.subject, topic, question) else {
        return Err(AppError::validation("Please provide subject, topic, and question"));
    };

    let len = question.chars().count();
    if len < MIN_QUESTION_LEN {
        return Err(AppError::validation("Question must be at least 10 characters"));
    }
    if len > MAX_QUESTION_LEN {
        return Err(AppError::validation("Question cannot exceed 5000 characters"));
    }

    if store.find_learner(learner_id).await?.is_none() {
        return Err(AppError::not_found("Student not found"));
    }

    let started = Instant::now();
    let answer = tutor
        .answer(subject, &topic, &question)
        .await
        .map_err(|e| {
            warn!("Tutor failed to answer query: {:#}", e);
            AppError::Service("Failed to get AI response".to_string())
        })?;
    let response_time = started.elapsed().as_millis() as u64;

    let now = Utc::now();
    let query = QueryRecord {
        id: uuid::Uuid::new_v4().to_string(),
        learner_id: learner_id.to_string(),
        subject,
        topic,
        question,
        ai_response: Some(answer),
        difficulty: input.difficulty.unwrap_or_default(),
        response_time,
        resolution_status: ResolutionStatus::Resolved,
        feedback: Feedback::default(),
        created_at: now,
        updated_at: now,
    };

    store.insert_query(&query).await?;
    store.increment_queries_answered(learner_id).await?;

    info!("Query {} answered in {}ms ({} mode)", query.id, response_time, store.mode.as_str());
    Ok(query)
}

/// A learner's queries, newest first
pub async fn list_for_learner(store: &ActiveStore, learner_id: &str, request: PageRequest) -> AppResult<QueryPage> {
    let (page, window) = request.window()?;

    let queries = store.list_queries(learner_id, window).await?;
    let total = store.count_queries(learner_id).await?;

    Ok(QueryPage {
        queries,
        pagination: Pagination::new(total, page, window.limit),
    })
}

/// Replace the feedback on a query
pub async fn submit_feedback(store: &ActiveStore, query_id: &str, input: FeedbackInput) -> AppResult<QueryRecord> {
    let rating = match input.rating {
        Some(r @ 1..=5) => r as u8,
        _ => return Err(AppError::validation("Rating must be between 1 and 5")),
    };
    if let Some(comment) = &input.comment {
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::validation("Comment cannot exceed 1000 characters"));
        }
    }

    let feedback = Feedback {
        rating: Some(rating),
        comment: input.comment,
        helpful: input.helpful,
    };

    store
        .set_feedback(query_id, &feedback)
        .await?
        .ok_or_else(|| AppError::not_found("Query not found"))
}
