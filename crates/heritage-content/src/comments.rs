//! Comment submission and moderation.
//!
//! Comments are appended to the parent post's collection and the whole
//! collection is written back. There is no concurrency check: two
//! simultaneous submissions on the same post race and the last write wins.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};
use uuid::Uuid;

use heritage_core::locale::Translator;
use heritage_core::types::{BlogPost, Comment, Language, Severity};
use heritage_storage::BlogPostRepository;

use crate::error::ContentError;
use crate::notify::Notifier;

/// Persistence for comment threads.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<BlogPost>, ContentError>;

    /// Overwrite the comment collection of `parent_id`.
    async fn update_comments(&self, parent_id: Uuid, comments: &[Comment])
        -> Result<(), ContentError>;
}

#[async_trait]
impl CommentStore for BlogPostRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<BlogPost>, ContentError> {
        Ok(self.find_by_id(id)?)
    }

    async fn update_comments(
        &self,
        parent_id: Uuid,
        comments: &[Comment],
    ) -> Result<(), ContentError> {
        Ok(BlogPostRepository::update_comments(self, parent_id, comments)?)
    }
}

/// Submits and moderates visitor comments.
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    notifier: Arc<dyn Notifier>,
    translator: Arc<dyn Translator>,
    language: Language,
}

impl CommentService {
    pub fn new(
        store: Arc<dyn CommentStore>,
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            store,
            notifier,
            translator,
            language: Language::En,
        }
    }

    /// Language used for notification texts.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Add an unvalidated comment to `parent_id`.
    ///
    /// Blank text fails with [`ContentError::Validation`] without touching
    /// the store. Every outcome is reported through the notifier; nothing
    /// is retried.
    pub async fn submit(&self, parent_id: Uuid, text: &str) -> Result<Comment, ContentError> {
        let text = text.trim();
        if text.is_empty() {
            self.notify("comment.empty", Severity::Warning);
            return Err(ContentError::Validation("comment text is empty".to_string()));
        }

        match self.append(parent_id, text).await {
            Ok(comment) => {
                info!(post_id = %parent_id, comment_id = %comment.id, "Comment submitted");
                self.notify("comment.success", Severity::Success);
                Ok(comment)
            }
            Err(e) => {
                error!(post_id = %parent_id, error = %e, "Comment submission failed");
                self.notify("comment.error", Severity::Error);
                Err(e)
            }
        }
    }

    async fn append(&self, parent_id: Uuid, text: &str) -> Result<Comment, ContentError> {
        let post = self.load(parent_id).await?;
        let comment = Comment::new(text);
        let mut comments = post.comments;
        comments.push(comment.clone());
        self.store.update_comments(parent_id, &comments).await?;
        Ok(comment)
    }

    /// Mark a comment as validated so it becomes public.
    pub async fn approve(&self, parent_id: Uuid, comment_id: Uuid) -> Result<Comment, ContentError> {
        let mut comments = self.load(parent_id).await?.comments;
        let comment = comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| ContentError::NotFound(format!("comment {}", comment_id)))?;
        comment.validated = true;
        let approved = comment.clone();

        self.store.update_comments(parent_id, &comments).await?;
        info!(post_id = %parent_id, comment_id = %comment_id, "Comment approved");
        Ok(approved)
    }

    /// Delete a comment.
    pub async fn remove(&self, parent_id: Uuid, comment_id: Uuid) -> Result<(), ContentError> {
        let mut comments = self.load(parent_id).await?.comments;
        let before = comments.len();
        comments.retain(|c| c.id != comment_id);
        if comments.len() == before {
            return Err(ContentError::NotFound(format!("comment {}", comment_id)));
        }

        self.store.update_comments(parent_id, &comments).await?;
        warn!(post_id = %parent_id, comment_id = %comment_id, "Comment removed");
        Ok(())
    }

    /// Validated comments only, in submission order.
    pub async fn published(&self, parent_id: Uuid) -> Result<Vec<Comment>, ContentError> {
        let post = self.load(parent_id).await?;
        Ok(post.comments.into_iter().filter(|c| c.validated).collect())
    }

    /// Comments awaiting moderation.
    pub async fn pending(&self, parent_id: Uuid) -> Result<Vec<Comment>, ContentError> {
        let post = self.load(parent_id).await?;
        Ok(post.comments.into_iter().filter(|c| !c.validated).collect())
    }

    async fn load(&self, parent_id: Uuid) -> Result<BlogPost, ContentError> {
        self.store
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| ContentError::NotFound(format!("blog post {}", parent_id)))
    }

    fn notify(&self, key: &str, severity: Severity) {
        let title = self.translator.translate(&format!("{}.title", key), self.language);
        let description = self
            .translator
            .translate(&format!("{}.description", key), self.language);
        self.notifier.notify(&title, &description, severity);
    }
}

/// Draft comment bound to a post.
///
/// The draft is cleared only after a successful submission, so a failed
/// attempt can be retried as typed.
#[derive(Debug, Clone)]
pub struct CommentForm {
    pub parent_id: Uuid,
    pub text: String,
}

impl CommentForm {
    pub fn new(parent_id: Uuid) -> Self {
        Self {
            parent_id,
            text: String::new(),
        }
    }

    pub async fn submit(&mut self, service: &CommentService) -> Result<Comment, ContentError> {
        let comment = service.submit(self.parent_id, &self.text).await?;
        self.text.clear();
        Ok(comment)
    }
}
