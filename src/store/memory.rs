//! In-memory demo store
//!
//! Ordered lists scanned linearly. Entries live for as long as the store does;
//! nothing is evicted. Meant for demos and for running without a database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    Feedback, Learner, LearningMaterial, MaterialFilter, MaterialPatch, Page, ProfilePatch,
    QueryRecord, Store,
};
use crate::types::{Difficulty, Grade, LearningStyle, Subject};

pub const DEMO_LEARNER_ID: &str = "demo-student-123";
pub const DEMO_EMAIL: &str = "demo@edusmart.com";

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    learners: RwLock<Vec<Learner>>,
    queries: RwLock<Vec<QueryRecord>>,
    materials: RwLock<Vec<LearningMaterial>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the demo learner
    pub fn seeded() -> Self {
        Self {
            learners: RwLock::new(vec![demo_learner()]),
            ..Self::default()
        }
    }
}

/// The pre-populated demo account. Its credential hash is not a valid PHC
/// string, so it can only be entered through the demo login relaxation.
pub fn demo_learner() -> Learner {
    let now = Utc::now();
    Learner {
        id: DEMO_LEARNER_ID.to_string(),
        name: "Demo Student".to_string(),
        email: DEMO_EMAIL.to_string(),
        password_hash: "$demo".to_string(),
        grade: Grade::Ten,
        subjects: vec![Subject::Mathematics, Subject::Physics],
        learning_style: LearningStyle::Visual,
        total_queries_answered: 5,
        average_performance_score: 78.0,
        weak_areas: vec!["Calculus".to_string()],
        strong_areas: vec!["Algebra".to_string()],
        feedback_score: 4.2,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Newest first; insertion order breaks timestamp ties
fn newest_first(mut rows: Vec<QueryRecord>) -> Vec<QueryRecord> {
    rows.reverse();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

fn by_rating_then_usage(rows: &mut [LearningMaterial]) {
    rows.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then_with(|| b.usage_count.cmp(&a.usage_count))
    });
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_learner(&self, id: &str) -> Result<Option<Learner>> {
        let learners = self.learners.read().await;
        Ok(learners.iter().find(|l| l.id == id).cloned())
    }

    async fn find_learner_by_email(&self, email: &str) -> Result<Option<Learner>> {
        let learners = self.learners.read().await;
        Ok(learners.iter().find(|l| l.email == email).cloned())
    }

    async fn insert_learner(&self, learner: &Learner) -> Result<bool> {
        let mut learners = self.learners.write().await;
        if learners.iter().any(|l| l.email == learner.email) {
            return Ok(false);
        }
        learners.push(learner.clone());
        Ok(true)
    }

    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Option<Learner>> {
        let mut learners = self.learners.write().await;
        let Some(learner) = learners.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };

        if let Some(subjects) = &patch.subjects {
            learner.subjects = subjects.clone();
        }
        if let Some(style) = patch.learning_style {
            learner.learning_style = style;
        }
        learner.updated_at = Utc::now();

        Ok(Some(learner.clone()))
    }

    async fn increment_queries_answered(&self, id: &str) -> Result<()> {
        let mut learners = self.learners.write().await;
        if let Some(learner) = learners.iter_mut().find(|l| l.id == id) {
            learner.total_queries_answered += 1;
        }
        Ok(())
    }

    async fn insert_query(&self, query: &QueryRecord) -> Result<()> {
        self.queries.write().await.push(query.clone());
        Ok(())
    }

    async fn list_queries(&self, learner_id: &str, page: Page) -> Result<Vec<QueryRecord>> {
        let all = self.all_queries(learner_id).await?;
        Ok(all.into_iter().skip(page.skip).take(page.limit).collect())
    }

    async fn count_queries(&self, learner_id: &str) -> Result<u64> {
        let queries = self.queries.read().await;
        Ok(queries.iter().filter(|q| q.learner_id == learner_id).count() as u64)
    }

    async fn all_queries(&self, learner_id: &str) -> Result<Vec<QueryRecord>> {
        let queries = self.queries.read().await;
        let owned = queries
            .iter()
            .filter(|q| q.learner_id == learner_id)
            .cloned()
            .collect();
        Ok(newest_first(owned))
    }

    async fn earliest_queries(&self, learner_id: &str, limit: usize) -> Result<Vec<QueryRecord>> {
        let queries = self.queries.read().await;
        Ok(queries
            .iter()
            .filter(|q| q.learner_id == learner_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn set_feedback(&self, query_id: &str, feedback: &Feedback) -> Result<Option<QueryRecord>> {
        let mut queries = self.queries.write().await;
        let Some(query) = queries.iter_mut().find(|q| q.id == query_id) else {
            return Ok(None);
        };

        query.feedback = feedback.clone();
        query.updated_at = Utc::now();
        Ok(Some(query.clone()))
    }

    async fn list_materials(&self, filter: &MaterialFilter, page: Page) -> Result<Vec<LearningMaterial>> {
        let materials = self.materials.read().await;
        let mut rows: Vec<LearningMaterial> = materials
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        by_rating_then_usage(&mut rows);
        Ok(rows.into_iter().skip(page.skip).take(page.limit).collect())
    }

    async fn count_materials(&self, filter: &MaterialFilter) -> Result<u64> {
        let materials = self.materials.read().await;
        Ok(materials.iter().filter(|m| filter.matches(m)).count() as u64)
    }

    async fn touch_material(&self, id: &str) -> Result<Option<LearningMaterial>> {
        let mut materials = self.materials.write().await;
        let Some(material) = materials.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        material.usage_count += 1;
        Ok(Some(material.clone()))
    }

    async fn insert_material(&self, material: &LearningMaterial) -> Result<()> {
        self.materials.write().await.push(material.clone());
        Ok(())
    }

    async fn update_material(&self, id: &str, patch: &MaterialPatch) -> Result<Option<LearningMaterial>> {
        let mut materials = self.materials.write().await;
        let Some(material) = materials.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        patch.apply(material);
        Ok(Some(material.clone()))
    }

    async fn delete_material(&self, id: &str) -> Result<bool> {
        let mut materials = self.materials.write().await;
        let before = materials.len();
        materials.retain(|m| m.id != id);
        Ok(materials.len() != before)
    }

    async fn recommended_materials(
        &self,
        subjects: &[Subject],
        grade: Grade,
        limit: usize,
    ) -> Result<Vec<LearningMaterial>> {
        let materials = self.materials.read().await;
        let mut rows: Vec<LearningMaterial> = materials
            .iter()
            .filter(|m| {
                m.is_active
                    && subjects.contains(&m.subject)
                    && m.grade.contains(&grade)
                    && matches!(m.difficulty, Difficulty::Intermediate | Difficulty::Advanced)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolutionStatus;

    fn query(id: &str, learner_id: &str) -> QueryRecord {
        let now = Utc::now();
        QueryRecord {
            id: id.to_string(),
            learner_id: learner_id.to_string(),
            subject: Subject::Physics,
            topic: "Kinematics".to_string(),
            question: "What is acceleration?".to_string(),
            ai_response: Some("The rate of change of velocity.".to_string()),
            difficulty: Difficulty::Intermediate,
            response_time: 12,
            resolution_status: ResolutionStatus::Resolved,
            feedback: Feedback::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_seeded_demo_learner() {
        let store = MemoryStore::seeded();
        let demo = store.find_learner(DEMO_LEARNER_ID).await.unwrap().unwrap();
        assert_eq!(demo.email, DEMO_EMAIL);
        assert_eq!(demo.total_queries_answered, 5);
        assert_eq!(demo.subjects, vec![Subject::Mathematics, Subject::Physics]);
    }

    #[tokio::test]
    async fn test_queries_listed_newest_first_with_equal_timestamps() {
        let store = MemoryStore::new();
        let mut first = query("q1", "l1");
        let mut second = query("q2", "l1");
        let now = Utc::now();
        first.created_at = now;
        second.created_at = now;
        store.insert_query(&first).await.unwrap();
        store.insert_query(&second).await.unwrap();
        store.insert_query(&query("q3", "other")).await.unwrap();

        let listed = store.list_queries("l1", Page::new(1, 10)).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q2", "q1"]);
        assert_eq!(store.count_queries("l1").await.unwrap(), 2);

        let earliest = store.earliest_queries("l1", 1).await.unwrap();
        assert_eq!(earliest[0].id, "q1");
    }

    #[tokio::test]
    async fn test_insert_rejects_taken_email() {
        let store = MemoryStore::seeded();
        let mut taken = demo_learner();
        taken.id = "someone-else".to_string();

        assert!(!store.insert_learner(&taken).await.unwrap());
        assert!(store.find_learner("someone-else").await.unwrap().is_none());

        taken.email = "fresh@edusmart.com".to_string();
        assert!(store.insert_learner(&taken).await.unwrap());
    }

    #[tokio::test]
    async fn test_feedback_overwrites() {
        let store = MemoryStore::new();
        store.insert_query(&query("q1", "l1")).await.unwrap();

        let first = Feedback { rating: Some(2), comment: Some("meh".into()), helpful: Some(false) };
        store.set_feedback("q1", &first).await.unwrap();

        let second = Feedback { rating: Some(5), comment: None, helpful: None };
        let updated = store.set_feedback("q1", &second).await.unwrap().unwrap();
        assert_eq!(updated.feedback, second);

        assert!(store.set_feedback("missing", &second).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_increment_and_profile_patch() {
        let store = MemoryStore::seeded();
        store.increment_queries_answered(DEMO_LEARNER_ID).await.unwrap();

        let patch = ProfilePatch { subjects: None, learning_style: Some(LearningStyle::Auditory) };
        let learner = store.update_profile(DEMO_LEARNER_ID, &patch).await.unwrap().unwrap();
        assert_eq!(learner.total_queries_answered, 6);
        assert_eq!(learner.learning_style, LearningStyle::Auditory);
        assert_eq!(learner.subjects.len(), 2);
    }
}
