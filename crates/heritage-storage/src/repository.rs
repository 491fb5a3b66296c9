//! Repository implementations for SQLite-backed persistence.
//!
//! Provides RuleRepository, BlogPostRepository and ArtifactRepository that
//! operate on the Database struct using raw SQL. Rows are converted to typed
//! records on read and rejected when they are malformed.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use tracing::{debug, info, warn};
use uuid::Uuid;

use heritage_core::error::HeritageError;
use heritage_core::types::{
    Artifact, BlogPost, Comment, Language, Replies, ResponseRule, DEFAULT_INTENT,
};

use crate::db::Database;

const RULE_COLUMNS: &str = "id, intent, patterns, replies, priority, active, created_at";
const POST_COLUMNS: &str = "id, title, body, author, image_url, comments, created_at, updated_at";
const ARTIFACT_COLUMNS: &str =
    "id, name, description, period, origin, image_url, created_at, updated_at";

// ============================================================================
// RuleRepository
// ============================================================================

/// Repository for chatbot response rules.
pub struct RuleRepository {
    db: Arc<Database>,
}

impl RuleRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a new rule.
    pub fn save(&self, rule: &ResponseRule) -> Result<(), HeritageError> {
        let patterns = serde_json::to_string(&rule.patterns)?;
        let replies = serde_json::to_string(&rule.replies)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO response_rules (id, intent, patterns, replies, priority, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    rule.id.to_string(),
                    rule.intent,
                    patterns,
                    replies,
                    rule.priority,
                    rule.active as i32,
                    rule.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to save rule: {}", e)))?;
            Ok(())
        })
    }

    /// Replace every field of an existing rule except its creation time.
    pub fn update(&self, rule: &ResponseRule) -> Result<(), HeritageError> {
        let patterns = serde_json::to_string(&rule.patterns)?;
        let replies = serde_json::to_string(&rule.replies)?;
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE response_rules
                 SET intent = ?2, patterns = ?3, replies = ?4, priority = ?5, active = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    rule.id.to_string(),
                    rule.intent,
                    patterns,
                    replies,
                    rule.priority,
                    rule.active as i32,
                ],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to update rule: {}", e)))
        })?;
        if changed == 0 {
            return Err(HeritageError::NotFound(format!("rule {}", rule.id)));
        }
        Ok(())
    }

    /// Delete a rule by ID.
    pub fn delete(&self, id: Uuid) -> Result<(), HeritageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM response_rules WHERE id = ?1",
                rusqlite::params![id.to_string()],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to delete rule: {}", e)))?;
            Ok(())
        })
    }

    /// Find a rule by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<ResponseRule>, HeritageError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {} FROM response_rules WHERE id = ?1", RULE_COLUMNS);
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| Ok(row_to_rule(row)))
                .optional()
                .map_err(db_err)?;

            match result {
                Some(rule) => Ok(Some(rule?)),
                None => Ok(None),
            }
        })
    }

    /// All rules, active or not, in rule-source order.
    pub fn list_all(&self) -> Result<Vec<ResponseRule>, HeritageError> {
        self.query_rules(&format!(
            "SELECT {} FROM response_rules
             ORDER BY priority DESC, created_at ASC, rowid ASC",
            RULE_COLUMNS
        ))?
        .into_iter()
        .collect()
    }

    /// Active rules ordered by priority descending, then creation time
    /// ascending.
    ///
    /// Rows that fail to decode are logged and skipped so one bad rule does
    /// not take the chatbot down.
    pub fn list_active(&self) -> Result<Vec<ResponseRule>, HeritageError> {
        let rows = self.query_rules(&format!(
            "SELECT {} FROM response_rules
             WHERE active = 1
             ORDER BY priority DESC, created_at ASC, rowid ASC",
            RULE_COLUMNS
        ))?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!(error = %e, "Skipping malformed response rule"),
            }
        }
        debug!(count = rules.len(), "Loaded active response rules");
        Ok(rules)
    }

    /// Count all rules.
    pub fn count(&self) -> Result<u64, HeritageError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM response_rules", [], |row| row.get(0))
                .map_err(db_err)?;
            Ok(count as u64)
        })
    }

    /// Insert the stock museum rules when the table is empty.
    ///
    /// Returns the number of rules inserted.
    pub fn seed_defaults(&self) -> Result<usize, HeritageError> {
        if self.count()? > 0 {
            return Ok(0);
        }
        let rules = default_rules();
        for rule in &rules {
            self.save(rule)?;
        }
        info!(count = rules.len(), "Seeded default response rules");
        Ok(rules.len())
    }

    /// Run a rule query. The outer error is a database failure, the inner
    /// ones are rows that did not decode.
    fn query_rules(
        &self,
        sql: &str,
    ) -> Result<Vec<Result<ResponseRule, HeritageError>>, HeritageError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(db_err)?;
            let rows = stmt
                .query_map([], |row| Ok(row_to_rule(row)))
                .map_err(db_err)?;

            let mut rules = Vec::new();
            for row in rows {
                rules.push(row.map_err(db_err)?);
            }
            Ok(rules)
        })
    }
}

fn default_rules() -> Vec<ResponseRule> {
    let patterns = |p: &[&str]| p.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        ResponseRule::new(
            "opening_hours",
            patterns(&["opening hours", "open", "hours", "horaires", "ouvert", "مواعيد"]),
            Replies::english("We are open Tuesday to Sunday, 9am to 6pm.")
                .with(Language::Fr, "Nous sommes ouverts du mardi au dimanche, de 9h à 18h.")
                .with(Language::Ar, "نحن مفتوحون من الثلاثاء إلى الأحد، من 9 صباحًا إلى 6 مساءً."),
            2,
        ),
        ResponseRule::new(
            "tickets",
            patterns(&["ticket", "price", "admission", "billet", "tarif", "تذكرة"]),
            Replies::english("Admission is free for under-18s and 8 EUR for adults.")
                .with(Language::Fr, "L'entrée est gratuite pour les moins de 18 ans et de 8 EUR pour les adultes.")
                .with(Language::Ar, "الدخول مجاني لمن هم دون 18 عامًا و8 يورو للبالغين."),
            2,
        ),
        ResponseRule::new(
            "location",
            patterns(&["where", "address", "adresse", "où", "أين"]),
            Replies::english("You will find us in the old town, next to the main square.")
                .with(Language::Fr, "Nous sommes dans la vieille ville, à côté de la place principale.")
                .with(Language::Ar, "ستجدوننا في المدينة القديمة بجوار الساحة الرئيسية."),
            1,
        ),
        ResponseRule::new(
            "greeting",
            patterns(&["hello", "hi", "bonjour", "salut", "مرحبا"]),
            Replies::english("Hello! How can I help you with your visit?")
                .with(Language::Fr, "Bonjour ! Comment puis-je vous aider pour votre visite ?")
                .with(Language::Ar, "مرحبًا! كيف يمكنني مساعدتك في زيارتك؟"),
            0,
        ),
        ResponseRule::new(
            DEFAULT_INTENT,
            Vec::new(),
            Replies::english("I'm not sure I understood. Try asking about opening hours, tickets or our address.")
                .with(Language::Fr, "Je n'ai pas bien compris. Posez-moi une question sur les horaires, les billets ou notre adresse.")
                .with(Language::Ar, "لم أفهم جيدًا. اسألني عن المواعيد أو التذاكر أو العنوان."),
            -1,
        ),
    ]
}

// ============================================================================
// BlogPostRepository
// ============================================================================

/// Repository for blog posts and their comment threads.
pub struct BlogPostRepository {
    db: Arc<Database>,
}

impl BlogPostRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a new blog post.
    pub fn save(&self, post: &BlogPost) -> Result<(), HeritageError> {
        let comments = serde_json::to_string(&post.comments)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO blog_posts (id, title, body, author, image_url, comments, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    post.id.to_string(),
                    post.title,
                    post.body,
                    post.author,
                    post.image_url,
                    comments,
                    post.created_at.timestamp_millis(),
                    post.updated_at.timestamp_millis(),
                ],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to save blog post: {}", e)))?;
            Ok(())
        })
    }

    /// Find a blog post by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPost>, HeritageError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {} FROM blog_posts WHERE id = ?1", POST_COLUMNS);
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_blog_post(row))
                })
                .optional()
                .map_err(db_err)?;

            match result {
                Some(post) => Ok(Some(post?)),
                None => Ok(None),
            }
        })
    }

    /// Newest posts first.
    pub fn list(&self, limit: u64) -> Result<Vec<BlogPost>, HeritageError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM blog_posts ORDER BY created_at DESC LIMIT ?1",
                POST_COLUMNS
            );
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let rows = stmt
                .query_map(rusqlite::params![limit], |row| Ok(row_to_blog_post(row)))
                .map_err(db_err)?;

            let mut posts = Vec::new();
            for row in rows {
                posts.push(row.map_err(db_err)??);
            }
            Ok(posts)
        })
    }

    /// Update the editable fields of a post and bump `updated_at`.
    ///
    /// Comments are left untouched; use [`update_comments`](Self::update_comments).
    pub fn update(&self, post: &BlogPost) -> Result<(), HeritageError> {
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE blog_posts
                 SET title = ?2, body = ?3, author = ?4, image_url = ?5, updated_at = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    post.id.to_string(),
                    post.title,
                    post.body,
                    post.author,
                    post.image_url,
                    Utc::now().timestamp_millis(),
                ],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to update blog post: {}", e)))
        })?;
        if changed == 0 {
            return Err(HeritageError::NotFound(format!("blog post {}", post.id)));
        }
        Ok(())
    }

    /// Overwrite the whole comment collection of a post.
    pub fn update_comments(&self, id: Uuid, comments: &[Comment]) -> Result<(), HeritageError> {
        let json = serde_json::to_string(comments)?;
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE blog_posts SET comments = ?2 WHERE id = ?1",
                rusqlite::params![id.to_string(), json],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to update comments: {}", e)))
        })?;
        if changed == 0 {
            return Err(HeritageError::NotFound(format!("blog post {}", id)));
        }
        debug!(post_id = %id, count = comments.len(), "Comments persisted");
        Ok(())
    }

    /// Delete a blog post by ID.
    pub fn delete(&self, id: Uuid) -> Result<(), HeritageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM blog_posts WHERE id = ?1",
                rusqlite::params![id.to_string()],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to delete blog post: {}", e)))?;
            Ok(())
        })
    }

    /// Count all blog posts.
    pub fn count(&self) -> Result<u64, HeritageError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM blog_posts", [], |row| row.get(0))
                .map_err(db_err)?;
            Ok(count as u64)
        })
    }
}

// ============================================================================
// ArtifactRepository
// ============================================================================

/// Repository for catalogue artifacts.
pub struct ArtifactRepository {
    db: Arc<Database>,
}

impl ArtifactRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a new artifact.
    pub fn save(&self, artifact: &Artifact) -> Result<(), HeritageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO artifacts (id, name, description, period, origin, image_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    artifact.id.to_string(),
                    artifact.name,
                    artifact.description,
                    artifact.period,
                    artifact.origin,
                    artifact.image_url,
                    artifact.created_at.timestamp_millis(),
                    artifact.updated_at.timestamp_millis(),
                ],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to save artifact: {}", e)))?;
            Ok(())
        })
    }

    /// Find an artifact by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Artifact>, HeritageError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {} FROM artifacts WHERE id = ?1", ARTIFACT_COLUMNS);
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_artifact(row))
                })
                .optional()
                .map_err(db_err)?;

            match result {
                Some(artifact) => Ok(Some(artifact?)),
                None => Ok(None),
            }
        })
    }

    /// Newest artifacts first.
    pub fn list(&self, limit: u64) -> Result<Vec<Artifact>, HeritageError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM artifacts ORDER BY created_at DESC LIMIT ?1",
                ARTIFACT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let rows = stmt
                .query_map(rusqlite::params![limit], |row| Ok(row_to_artifact(row)))
                .map_err(db_err)?;

            let mut artifacts = Vec::new();
            for row in rows {
                artifacts.push(row.map_err(db_err)??);
            }
            Ok(artifacts)
        })
    }

    /// Update the editable fields of an artifact and bump `updated_at`.
    pub fn update(&self, artifact: &Artifact) -> Result<(), HeritageError> {
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE artifacts
                 SET name = ?2, description = ?3, period = ?4, origin = ?5, image_url = ?6, updated_at = ?7
                 WHERE id = ?1",
                rusqlite::params![
                    artifact.id.to_string(),
                    artifact.name,
                    artifact.description,
                    artifact.period,
                    artifact.origin,
                    artifact.image_url,
                    Utc::now().timestamp_millis(),
                ],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to update artifact: {}", e)))
        })?;
        if changed == 0 {
            return Err(HeritageError::NotFound(format!("artifact {}", artifact.id)));
        }
        Ok(())
    }

    /// Delete an artifact by ID.
    pub fn delete(&self, id: Uuid) -> Result<(), HeritageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM artifacts WHERE id = ?1",
                rusqlite::params![id.to_string()],
            )
            .map_err(|e| HeritageError::Storage(format!("Failed to delete artifact: {}", e)))?;
            Ok(())
        })
    }

    /// Count all artifacts.
    pub fn count(&self) -> Result<u64, HeritageError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))
                .map_err(db_err)?;
            Ok(count as u64)
        })
    }
}

// ============================================================================
// Helper functions for row-to-entity conversion.
// ============================================================================

fn db_err(e: rusqlite::Error) -> HeritageError {
    HeritageError::Storage(e.to_string())
}

fn parse_id(raw: &str) -> Result<Uuid, HeritageError> {
    Uuid::parse_str(raw).map_err(|e| HeritageError::Storage(format!("Invalid id {}: {}", raw, e)))
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, HeritageError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| HeritageError::Storage(format!("Invalid timestamp: {}", millis)))
}

fn row_to_rule(row: &rusqlite::Row<'_>) -> Result<ResponseRule, HeritageError> {
    let id: String = row.get(0).map_err(db_err)?;
    let intent: String = row.get(1).map_err(db_err)?;
    let patterns_json: String = row.get(2).map_err(db_err)?;
    let replies_json: String = row.get(3).map_err(db_err)?;
    let priority: i32 = row.get(4).map_err(db_err)?;
    let active: i32 = row.get(5).map_err(db_err)?;
    let created_at: i64 = row.get(6).map_err(db_err)?;

    let patterns: Vec<String> = serde_json::from_str(&patterns_json)
        .map_err(|e| HeritageError::Storage(format!("Rule {} has invalid patterns: {}", id, e)))?;
    let replies: Replies = serde_json::from_str(&replies_json)
        .map_err(|e| HeritageError::Storage(format!("Rule {} has invalid replies: {}", id, e)))?;
    if replies.en.trim().is_empty() {
        return Err(HeritageError::Storage(format!(
            "Rule {} has no English reply",
            id
        )));
    }

    Ok(ResponseRule {
        id: parse_id(&id)?,
        intent,
        patterns,
        replies,
        priority,
        active: active != 0,
        created_at: millis_to_datetime(created_at)?,
    })
}

fn row_to_blog_post(row: &rusqlite::Row<'_>) -> Result<BlogPost, HeritageError> {
    let id: String = row.get(0).map_err(db_err)?;
    let comments_json: String = row.get(5).map_err(db_err)?;
    let comments: Vec<Comment> = serde_json::from_str(&comments_json)
        .map_err(|e| HeritageError::Storage(format!("Post {} has invalid comments: {}", id, e)))?;

    Ok(BlogPost {
        id: parse_id(&id)?,
        title: row.get(1).map_err(db_err)?,
        body: row.get(2).map_err(db_err)?,
        author: row.get(3).map_err(db_err)?,
        image_url: row.get(4).map_err(db_err)?,
        comments,
        created_at: millis_to_datetime(row.get(6).map_err(db_err)?)?,
        updated_at: millis_to_datetime(row.get(7).map_err(db_err)?)?,
    })
}

fn row_to_artifact(row: &rusqlite::Row<'_>) -> Result<Artifact, HeritageError> {
    let id: String = row.get(0).map_err(db_err)?;
    Ok(Artifact {
        id: parse_id(&id)?,
        name: row.get(1).map_err(db_err)?,
        description: row.get(2).map_err(db_err)?,
        period: row.get(3).map_err(db_err)?,
        origin: row.get(4).map_err(db_err)?,
        image_url: row.get(5).map_err(db_err)?,
        created_at: millis_to_datetime(row.get(6).map_err(db_err)?)?,
        updated_at: millis_to_datetime(row.get(7).map_err(db_err)?)?,
    })
}
