//! Learning-material catalog

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::pagination::{PageRequest, Pagination};
use crate::store::{ActiveStore, LearningMaterial, MaterialFilter, MaterialPatch};
use crate::types::{Difficulty, Grade, LearningStyle, Subject};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;
const DEFAULT_READ_TIME: u32 = 10;

/// Listing query string: filters plus pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaterialQuery {
    pub subject: Option<Subject>,
    pub difficulty: Option<Difficulty>,
    pub grade: Option<Grade>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterial {
    pub title: Option<String>,
    pub subject: Option<Subject>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub grade: Option<Vec<Grade>>,
    pub learning_style: Option<Vec<LearningStyle>>,
    pub resource_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub estimated_read_time: Option<u32>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct MaterialPage {
    pub materials: Vec<LearningMaterial>,
    pub pagination: Pagination,
}

fn check_title(title: &str) -> AppResult<()> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation("Title cannot exceed 200 characters"));
    }
    Ok(())
}

fn check_description(description: &str) -> AppResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation("Description cannot exceed 2000 characters"));
    }
    Ok(())
}

fn check_url(url: &str) -> AppResult<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::validation("Please provide a valid URL"));
    }
    Ok(())
}

fn check_rating(rating: f64) -> AppResult<()> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::validation("Rating must be between 0 and 5"));
    }
    Ok(())
}

fn check_grades(grades: &[Grade]) -> AppResult<()> {
    if grades.is_empty() {
        return Err(AppError::validation("At least one grade is required"));
    }
    Ok(())
}

fn check_patch(patch: &MaterialPatch) -> AppResult<()> {
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(AppError::validation("Title cannot be empty"));
        }
        check_title(title)?;
    }
    if let Some(description) = &patch.description {
        check_description(description)?;
    }
    if let Some(url) = &patch.resource_url {
        check_url(url)?;
    }
    if let Some(rating) = patch.rating {
        check_rating(rating)?;
    }
    if let Some(grades) = &patch.grade {
        check_grades(grades)?;
    }
    Ok(())
}

/// Active materials matching the filters, best rated first
pub async fn list(store: &ActiveStore, query: MaterialQuery) -> AppResult<MaterialPage> {
    let (page, window) = PageRequest { page: query.page, limit: query.limit }.window()?;
    let filter = MaterialFilter {
        subject: query.subject,
        difficulty: query.difficulty,
        grade: query.grade,
    };

    let materials = store.list_materials(&filter, window).await?;
    let total = store.count_materials(&filter).await?;

    Ok(MaterialPage {
        materials,
        pagination: Pagination::new(total, page, window.limit),
    })
}

/// Fetch one material, counting the view
pub async fn get(store: &ActiveStore, id: &str) -> AppResult<LearningMaterial> {
    store
        .touch_material(id)
        .await?
        .ok_or_else(|| AppError::not_found("Learning material not found"))
}

pub async fn create(store: &ActiveStore, input: NewMaterial) -> AppResult<LearningMaterial> {
    let text = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let (Some(title), Some(subject), Some(topic), Some(content), Some(difficulty), Some(grade)) = (
        text(input.title),
        input.subject,
        text(input.topic),
        text(input.content),
        input.difficulty,
        input.grade,
    ) else {
        return Err(AppError::validation(
            "Please provide title, subject, topic, content, difficulty, and grade",
        ));
    };

    check_title(&title)?;
    check_grades(&grade)?;
    if let Some(description) = &input.description {
        check_description(description)?;
    }
    if let Some(url) = &input.resource_url {
        check_url(url)?;
    }
    let rating = input.rating.unwrap_or(0.0);
    check_rating(rating)?;

    let now = Utc::now();
    let material = LearningMaterial {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        subject,
        topic,
        description: input.description,
        content,
        difficulty,
        grade,
        learning_style: input
            .learning_style
            .unwrap_or_else(|| vec![LearningStyle::Visual, LearningStyle::ReadingWriting]),
        resource_url: input.resource_url,
        tags: input.tags,
        estimated_read_time: input.estimated_read_time.unwrap_or(DEFAULT_READ_TIME),
        usage_count: 0,
        rating,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    store.insert_material(&material).await?;
    info!("Created learning material {} ({})", material.id, material.title);
    Ok(material)
}

pub async fn update(store: &ActiveStore, id: &str, patch: MaterialPatch) -> AppResult<LearningMaterial> {
    check_patch(&patch)?;

    store
        .update_material(id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("Learning material not found"))
}

pub async fn delete(store: &ActiveStore, id: &str) -> AppResult<()> {
    if !store.delete_material(id).await? {
        return Err(AppError::not_found("Learning material not found"));
    }
    info!("Deleted learning material {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreMode};
    use std::sync::Arc;

    fn store() -> ActiveStore {
        ActiveStore::new(StoreMode::Demo, Arc::new(MemoryStore::new()))
    }

    fn algebra(rating: f64) -> NewMaterial {
        NewMaterial {
            title: Some("Linear equations".into()),
            subject: Some(Subject::Mathematics),
            topic: Some("Algebra".into()),
            content: Some("Solve for x by isolating it.".into()),
            difficulty: Some(Difficulty::Intermediate),
            grade: Some(vec![Grade::Nine, Grade::Ten]),
            rating: Some(rating),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let store = store();
        let material = create(&store, algebra(4.0)).await.unwrap();

        assert_eq!(material.estimated_read_time, 10);
        assert_eq!(material.learning_style, vec![LearningStyle::Visual, LearningStyle::ReadingWriting]);
        assert!(material.is_active);
        assert_eq!(material.usage_count, 0);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let store = store();

        let missing = NewMaterial { content: None, ..algebra(1.0) };
        assert!(matches!(create(&store, missing).await, Err(AppError::Validation(_))));

        assert!(matches!(create(&store, algebra(5.5)).await, Err(AppError::Validation(_))));

        let no_grades = NewMaterial { grade: Some(vec![]), ..algebra(1.0) };
        assert!(matches!(create(&store, no_grades).await, Err(AppError::Validation(_))));

        let bad_url = NewMaterial { resource_url: Some("ftp://x".into()), ..algebra(1.0) };
        assert!(matches!(create(&store, bad_url).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_counts_usage() {
        let store = store();
        let material = create(&store, algebra(3.0)).await.unwrap();

        get(&store, &material.id).await.unwrap();
        let fetched = get(&store, &material.id).await.unwrap();
        assert_eq!(fetched.usage_count, 2);

        assert!(matches!(get(&store, "missing").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = store();
        create(&store, algebra(2.0)).await.unwrap();
        create(&store, algebra(4.5)).await.unwrap();
        create(&store, NewMaterial { subject: Some(Subject::Physics), ..algebra(5.0) }).await.unwrap();

        let page = list(&store, MaterialQuery { subject: Some(Subject::Mathematics), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.materials[0].rating, 4.5);

        let page = list(&store, MaterialQuery { grade: Some(Grade::Twelve), ..Default::default() })
            .await
            .unwrap();
        assert!(page.materials.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = store();
        let material = create(&store, algebra(3.0)).await.unwrap();

        let patch = MaterialPatch { is_active: Some(false), ..Default::default() };
        let updated = update(&store, &material.id, patch).await.unwrap();
        assert!(!updated.is_active);

        let listed = list(&store, MaterialQuery::default()).await.unwrap();
        assert_eq!(listed.pagination.total, 0);

        let bad = MaterialPatch { rating: Some(-1.0), ..Default::default() };
        assert!(matches!(update(&store, &material.id, bad).await, Err(AppError::Validation(_))));

        delete(&store, &material.id).await.unwrap();
        assert!(matches!(delete(&store, &material.id).await, Err(AppError::NotFound(_))));
    }
}
