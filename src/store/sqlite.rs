//! SQLite-backed durable store

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{
    Feedback, Learner, LearningMaterial, MaterialFilter, MaterialPatch, Page, ProfilePatch,
    QueryRecord, Store,
};
use crate::types::{Difficulty, Grade, LearningStyle, ResolutionStatus, Subject};

const LEARNER_COLUMNS: &str = "id, name, email, password_hash, grade, subjects, learning_style, \
    total_queries_answered, average_performance_score, weak_areas, strong_areas, feedback_score, \
    is_active, created_at, updated_at";

const QUERY_COLUMNS: &str = "id, learner_id, subject, topic, question, ai_response, difficulty, \
    response_time, resolution_status, feedback_rating, feedback_comment, feedback_helpful, \
    created_at, updated_at";

const MATERIAL_COLUMNS: &str = "id, title, subject, topic, description, content, difficulty, grade, \
    learning_style, resource_url, tags, estimated_read_time, usage_count, rating, is_active, \
    created_at, updated_at";

/// SQLite-based durable store
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a store from a connection string: `sqlite::memory:`,
    /// `sqlite://<path>` or a bare path
    pub async fn connect(url: &str) -> Result<Self> {
        if url == "sqlite::memory:" || url == ":memory:" {
            let conn = Connection::open_in_memory()?;
            return Self::from_connection(conn);
        }

        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        Self::open(path).await
    }

    /// Open (or create) a database file at the given path
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        // Enable WAL mode for better performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS learners (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                grade TEXT NOT NULL,
                subjects TEXT NOT NULL DEFAULT '[]',
                learning_style TEXT NOT NULL,
                total_queries_answered INTEGER NOT NULL DEFAULT 0,
                average_performance_score REAL NOT NULL DEFAULT 0,
                weak_areas TEXT NOT NULL DEFAULT '[]',
                strong_areas TEXT NOT NULL DEFAULT '[]',
                feedback_score REAL NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- seq keeps insertion order for timestamp ties
            CREATE TABLE IF NOT EXISTS queries (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                learner_id TEXT NOT NULL REFERENCES learners(id),
                subject TEXT NOT NULL,
                topic TEXT NOT NULL,
                question TEXT NOT NULL,
                ai_response TEXT,
                difficulty TEXT NOT NULL,
                response_time INTEGER NOT NULL DEFAULT 0,
                resolution_status TEXT NOT NULL,
                feedback_rating INTEGER,
                feedback_comment TEXT,
                feedback_helpful INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS materials (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                subject TEXT NOT NULL,
                topic TEXT NOT NULL,
                description TEXT,
                content TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                grade TEXT NOT NULL DEFAULT '[]',
                learning_style TEXT NOT NULL DEFAULT '[]',
                resource_url TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                estimated_read_time INTEGER NOT NULL DEFAULT 10,
                usage_count INTEGER NOT NULL DEFAULT 0,
                rating REAL NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_queries_learner_created ON queries(learner_id, created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_queries_subject_topic ON queries(subject, topic);
            CREATE INDEX IF NOT EXISTS idx_materials_lookup ON materials(subject, topic, difficulty);
        "#)?;

        Ok(())
    }

    /// Insert a new entry, or rewrite every column of an existing one
    fn write_material(conn: &Connection, material: &LearningMaterial, existing: bool) -> Result<()> {
        let sql = if existing {
            "UPDATE materials SET title = ?2, subject = ?3, topic = ?4, description = ?5, content = ?6, \
             difficulty = ?7, grade = ?8, learning_style = ?9, resource_url = ?10, tags = ?11, \
             estimated_read_time = ?12, usage_count = ?13, rating = ?14, is_active = ?15, \
             created_at = ?16, updated_at = ?17 WHERE id = ?1"
                .to_string()
        } else {
            format!(
                "INSERT INTO materials ({MATERIAL_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
            )
        };
        conn.execute(
            &sql,
            params![
                material.id,
                material.title,
                material.subject.as_str(),
                material.topic,
                material.description,
                material.content,
                material.difficulty.as_str(),
                serde_json::to_string(&material.grade)?,
                serde_json::to_string(&material.learning_style)?,
                material.resource_url,
                serde_json::to_string(&material.tags)?,
                material.estimated_read_time,
                material.usage_count as i64,
                material.rating,
                material.is_active,
                timestamp(&material.created_at),
                timestamp(&material.updated_at),
            ],
        )?;
        Ok(())
    }

    fn load_material(conn: &Connection, id: &str) -> Result<Option<LearningMaterial>> {
        let material = conn
            .query_row(
                &format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?1"),
                params![id],
                material_from_row,
            )
            .optional()?;
        Ok(material)
    }

    fn load_query(conn: &Connection, id: &str) -> Result<Option<QueryRecord>> {
        let query = conn
            .query_row(
                &format!("SELECT {QUERY_COLUMNS} FROM queries WHERE id = ?1"),
                params![id],
                query_from_row,
            )
            .optional()?;
        Ok(query)
    }

    fn select_queries(conn: &Connection, sql: &str, args: &[Value]) -> Result<Vec<QueryRecord>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), query_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn select_materials(conn: &Connection, sql: &str, args: &[Value]) -> Result<Vec<LearningMaterial>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), material_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// LIMIT/OFFSET operands are signed in SQLite
fn sql_int(n: usize) -> Result<i64> {
    i64::try_from(n).with_context(|| format!("{} does not fit a SQLite integer", n))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn enum_col<T>(row: &Row, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, format!("unexpected value {:?}", raw)))
}

fn json_col<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn time_col(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn learner_from_row(row: &Row) -> rusqlite::Result<Learner> {
    Ok(Learner {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        grade: enum_col(row, 4, Grade::parse)?,
        subjects: json_col(row, 5)?,
        learning_style: enum_col(row, 6, LearningStyle::parse)?,
        total_queries_answered: row.get::<_, i64>(7)? as u64,
        average_performance_score: row.get(8)?,
        weak_areas: json_col(row, 9)?,
        strong_areas: json_col(row, 10)?,
        feedback_score: row.get(11)?,
        is_active: row.get(12)?,
        created_at: time_col(row, 13)?,
        updated_at: time_col(row, 14)?,
    })
}

fn query_from_row(row: &Row) -> rusqlite::Result<QueryRecord> {
    Ok(QueryRecord {
        id: row.get(0)?,
        learner_id: row.get(1)?,
        subject: enum_col(row, 2, Subject::parse)?,
        topic: row.get(3)?,
        question: row.get(4)?,
        ai_response: row.get(5)?,
        difficulty: enum_col(row, 6, Difficulty::parse)?,
        response_time: row.get::<_, i64>(7)? as u64,
        resolution_status: enum_col(row, 8, ResolutionStatus::parse)?,
        feedback: Feedback {
            rating: row.get(9)?,
            comment: row.get(10)?,
            helpful: row.get(11)?,
        },
        created_at: time_col(row, 12)?,
        updated_at: time_col(row, 13)?,
    })
}

fn material_from_row(row: &Row) -> rusqlite::Result<LearningMaterial> {
    Ok(LearningMaterial {
        id: row.get(0)?,
        title: row.get(1)?,
        subject: enum_col(row, 2, Subject::parse)?,
        topic: row.get(3)?,
        description: row.get(4)?,
        content: row.get(5)?,
        difficulty: enum_col(row, 6, Difficulty::parse)?,
        grade: json_col(row, 7)?,
        learning_style: json_col(row, 8)?,
        resource_url: row.get(9)?,
        tags: json_col(row, 10)?,
        estimated_read_time: row.get(11)?,
        usage_count: row.get::<_, i64>(12)? as u64,
        rating: row.get(13)?,
        is_active: row.get(14)?,
        created_at: time_col(row, 15)?,
        updated_at: time_col(row, 16)?,
    })
}

/// WHERE clause and arguments for a catalog filter
fn material_where(filter: &MaterialFilter) -> (String, Vec<Value>) {
    let mut clauses = vec!["is_active = 1".to_string()];
    let mut args = Vec::new();

    if let Some(subject) = filter.subject {
        args.push(Value::Text(subject.as_str().to_string()));
        clauses.push(format!("subject = ?{}", args.len()));
    }
    if let Some(difficulty) = filter.difficulty {
        args.push(Value::Text(difficulty.as_str().to_string()));
        clauses.push(format!("difficulty = ?{}", args.len()));
    }
    if let Some(grade) = filter.grade {
        args.push(Value::Text(grade.as_str().to_string()));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(materials.grade) WHERE json_each.value = ?{})",
            args.len()
        ));
    }

    (clauses.join(" AND "), args)
}

#[async_trait]
impl Store for SqliteStore {
    async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT id FROM learners LIMIT 1", [], |_| Ok(()))
            .optional()
            .context("Durable store read failed")?;
        Ok(())
    }

    async fn find_learner(&self, id: &str) -> Result<Option<Learner>> {
        let conn = self.conn.lock().await;
        let learner = conn
            .query_row(
                &format!("SELECT {LEARNER_COLUMNS} FROM learners WHERE id = ?1"),
                params![id],
                learner_from_row,
            )
            .optional()?;
        Ok(learner)
    }

    async fn find_learner_by_email(&self, email: &str) -> Result<Option<Learner>> {
        let conn = self.conn.lock().await;
        let learner = conn
            .query_row(
                &format!("SELECT {LEARNER_COLUMNS} FROM learners WHERE email = ?1"),
                params![email],
                learner_from_row,
            )
            .optional()?;
        Ok(learner)
    }

    async fn insert_learner(&self, learner: &Learner) -> Result<bool> {
        let conn = self.conn.lock().await;
        let result = conn.execute(
            &format!(
                "INSERT INTO learners ({LEARNER_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                learner.id,
                learner.name,
                learner.email,
                learner.password_hash,
                learner.grade.as_str(),
                serde_json::to_string(&learner.subjects)?,
                learner.learning_style.as_str(),
                learner.total_queries_answered as i64,
                learner.average_performance_score,
                serde_json::to_string(&learner.weak_areas)?,
                serde_json::to_string(&learner.strong_areas)?,
                learner.feedback_score,
                learner.is_active,
                timestamp(&learner.created_at),
                timestamp(&learner.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => Ok(false),
            Err(e) => Err(e).context("Failed to insert learner"),
        }
    }

    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Option<Learner>> {
        let conn = self.conn.lock().await;
        let now = timestamp(&Utc::now());

        if let Some(subjects) = &patch.subjects {
            conn.execute(
                "UPDATE learners SET subjects = ?1, updated_at = ?2 WHERE id = ?3",
                params![serde_json::to_string(subjects)?, now, id],
            )?;
        }
        if let Some(style) = patch.learning_style {
            conn.execute(
                "UPDATE learners SET learning_style = ?1, updated_at = ?2 WHERE id = ?3",
                params![style.as_str(), now, id],
            )?;
        }

        let learner = conn
            .query_row(
                &format!("SELECT {LEARNER_COLUMNS} FROM learners WHERE id = ?1"),
                params![id],
                learner_from_row,
            )
            .optional()?;
        Ok(learner)
    }

    async fn increment_queries_answered(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE learners SET total_queries_answered = total_queries_answered + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    async fn insert_query(&self, query: &QueryRecord) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO queries ({QUERY_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                query.id,
                query.learner_id,
                query.subject.as_str(),
                query.topic,
                query.question,
                query.ai_response,
                query.difficulty.as_str(),
                query.response_time as i64,
                query.resolution_status.as_str(),
                query.feedback.rating,
                query.feedback.comment,
                query.feedback.helpful,
                timestamp(&query.created_at),
                timestamp(&query.updated_at),
            ],
        ).context("Failed to insert query")?;
        Ok(())
    }

    async fn list_queries(&self, learner_id: &str, page: Page) -> Result<Vec<QueryRecord>> {
        let conn = self.conn.lock().await;
        Self::select_queries(
            &conn,
            &format!(
                "SELECT {QUERY_COLUMNS} FROM queries WHERE learner_id = ?1 \
                 ORDER BY created_at DESC, seq DESC LIMIT ?2 OFFSET ?3"
            ),
            &[
                Value::Text(learner_id.to_string()),
                Value::Integer(sql_int(page.limit)?),
                Value::Integer(sql_int(page.skip)?),
            ],
        )
    }

    async fn count_queries(&self, learner_id: &str) -> Result<u64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM queries WHERE learner_id = ?1",
            params![learner_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn all_queries(&self, learner_id: &str) -> Result<Vec<QueryRecord>> {
        let conn = self.conn.lock().await;
        Self::select_queries(
            &conn,
            &format!(
                "SELECT {QUERY_COLUMNS} FROM queries WHERE learner_id = ?1 \
                 ORDER BY created_at DESC, seq DESC"
            ),
            &[Value::Text(learner_id.to_string())],
        )
    }

    async fn earliest_queries(&self, learner_id: &str, limit: usize) -> Result<Vec<QueryRecord>> {
        let conn = self.conn.lock().await;
        Self::select_queries(
            &conn,
            &format!(
                "SELECT {QUERY_COLUMNS} FROM queries WHERE learner_id = ?1 \
                 ORDER BY seq ASC LIMIT ?2"
            ),
            &[Value::Text(learner_id.to_string()), Value::Integer(sql_int(limit)?)],
        )
    }

    async fn set_feedback(&self, query_id: &str, feedback: &Feedback) -> Result<Option<QueryRecord>> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE queries SET feedback_rating = ?1, feedback_comment = ?2, feedback_helpful = ?3, \
             updated_at = ?4 WHERE id = ?5",
            params![
                feedback.rating,
                feedback.comment,
                feedback.helpful,
                timestamp(&Utc::now()),
                query_id,
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        Self::load_query(&conn, query_id)
    }

    async fn list_materials(&self, filter: &MaterialFilter, page: Page) -> Result<Vec<LearningMaterial>> {
        let conn = self.conn.lock().await;
        let (clause, mut args) = material_where(filter);
        args.push(Value::Integer(sql_int(page.limit)?));
        args.push(Value::Integer(sql_int(page.skip)?));
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE {clause} \
             ORDER BY rating DESC, usage_count DESC, seq ASC LIMIT ?{} OFFSET ?{}",
            args.len() - 1,
            args.len()
        );
        Self::select_materials(&conn, &sql, &args)
    }

    async fn count_materials(&self, filter: &MaterialFilter) -> Result<u64> {
        let conn = self.conn.lock().await;
        let (clause, args) = material_where(filter);
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM materials WHERE {clause}"),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn touch_material(&self, id: &str) -> Result<Option<LearningMaterial>> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE materials SET usage_count = usage_count + 1 WHERE id = ?1",
            params![id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Self::load_material(&conn, id)
    }

    async fn insert_material(&self, material: &LearningMaterial) -> Result<()> {
        let conn = self.conn.lock().await;
        Self::write_material(&conn, material, false).context("Failed to insert material")
    }

    async fn update_material(&self, id: &str, patch: &MaterialPatch) -> Result<Option<LearningMaterial>> {
        let conn = self.conn.lock().await;
        let Some(mut material) = Self::load_material(&conn, id)? else {
            return Ok(None);
        };

        patch.apply(&mut material);
        Self::write_material(&conn, &material, true)?;
        Ok(Some(material))
    }

    async fn delete_material(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let changed = conn.execute("DELETE FROM materials WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    async fn recommended_materials(
        &self,
        subjects: &[Subject],
        grade: Grade,
        limit: usize,
    ) -> Result<Vec<LearningMaterial>> {
        if subjects.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().await;
        let mut args: Vec<Value> = subjects
            .iter()
            .map(|s| Value::Text(s.as_str().to_string()))
            .collect();
        let placeholders = (1..=args.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        args.push(Value::Text(grade.as_str().to_string()));
        let grade_idx = args.len();
        args.push(Value::Integer(sql_int(limit)?));
        let limit_idx = args.len();

        let sql = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials \
             WHERE is_active = 1 AND subject IN ({placeholders}) \
             AND difficulty IN ('Intermediate', 'Advanced') \
             AND EXISTS (SELECT 1 FROM json_each(materials.grade) WHERE json_each.value = ?{grade_idx}) \
             ORDER BY rating DESC, seq ASC LIMIT ?{limit_idx}"
        );
        Self::select_materials(&conn, &sql, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn learner(email: &str) -> Learner {
        Learner::new(
            "Ada".to_string(),
            email.to_string(),
            "hash".to_string(),
            Grade::Eleven,
            vec![Subject::Chemistry],
            LearningStyle::Kinesthetic,
        )
    }

    fn material(title: &str, difficulty: Difficulty, rating: f64) -> LearningMaterial {
        let now = Utc::now();
        LearningMaterial {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            subject: Subject::Chemistry,
            topic: "Stoichiometry".to_string(),
            description: None,
            content: "Moles and ratios".to_string(),
            difficulty,
            grade: vec![Grade::Eleven],
            learning_style: vec![LearningStyle::Visual],
            resource_url: None,
            tags: vec!["moles".to_string()],
            estimated_read_time: 10,
            usage_count: 0,
            rating,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_learner_round_trip_and_unique_email() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.db")).await.unwrap();

        let first = learner("ada@example.com");
        assert!(store.insert_learner(&first).await.unwrap());
        assert!(!store.insert_learner(&learner("ada@example.com")).await.unwrap());

        let loaded = store.find_learner_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(loaded.id, first.id);
        assert_eq!(loaded.password_hash, "hash");
        assert_eq!(loaded.subjects, vec![Subject::Chemistry]);
        assert_eq!(loaded.learning_style, LearningStyle::Kinesthetic);
    }

    #[tokio::test]
    async fn test_ping_and_sqlite_url() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("nested/app.db").display());
        let store = SqliteStore::connect(&url).await.unwrap();
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_offset_beyond_i64_is_an_error() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        let page = Page { skip: usize::MAX, limit: 10 };

        assert!(store.list_queries("anyone", page).await.is_err());
        assert!(store.list_materials(&MaterialFilter::default(), page).await.is_err());
    }

    #[tokio::test]
    async fn test_material_usage_and_recommendations() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        let basic = material("Intro", Difficulty::Beginner, 5.0);
        let good = material("Deep dive", Difficulty::Advanced, 4.5);
        let ok = material("Practice", Difficulty::Intermediate, 3.0);
        for m in [&basic, &good, &ok] {
            store.insert_material(m).await.unwrap();
        }

        let touched = store.touch_material(&good.id).await.unwrap().unwrap();
        assert_eq!(touched.usage_count, 1);

        let picks = store
            .recommended_materials(&[Subject::Chemistry], Grade::Eleven, 5)
            .await
            .unwrap();
        let titles: Vec<_> = picks.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Deep dive", "Practice"]);

        let none = store
            .recommended_materials(&[Subject::Chemistry], Grade::Nine, 5)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_material_filter_patch_and_delete() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        let first = material("A", Difficulty::Beginner, 1.0);
        let second = material("B", Difficulty::Beginner, 2.0);
        store.insert_material(&first).await.unwrap();
        store.insert_material(&second).await.unwrap();

        let filter = MaterialFilter { grade: Some(Grade::Eleven), ..Default::default() };
        let listed = store.list_materials(&filter, Page::new(1, 10)).await.unwrap();
        assert_eq!(listed[0].title, "B");
        assert_eq!(store.count_materials(&filter).await.unwrap(), 2);

        let patch = MaterialPatch { is_active: Some(false), ..Default::default() };
        store.update_material(&second.id, &patch).await.unwrap().unwrap();
        assert_eq!(store.count_materials(&filter).await.unwrap(), 1);

        assert!(store.delete_material(&first.id).await.unwrap());
        assert!(!store.delete_material(&first.id).await.unwrap());
    }
}
