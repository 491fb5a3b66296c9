//! Error types for content workflows.

use heritage_core::error::HeritageError;

/// Errors from comment submission, moderation and uploads.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Persistence failed: {0}")]
    Persistence(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<HeritageError> for ContentError {
    fn from(err: HeritageError) -> Self {
        match err {
            HeritageError::NotFound(what) => ContentError::NotFound(what),
            HeritageError::Validation(msg) => ContentError::Validation(msg),
            other => ContentError::Persistence(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_error_display() {
        assert_eq!(
            ContentError::Validation("comment is empty".to_string()).to_string(),
            "Validation failed: comment is empty"
        );
        assert_eq!(
            ContentError::Persistence("disk full".to_string()).to_string(),
            "Persistence failed: disk full"
        );
        assert_eq!(
            ContentError::NotFound("blog post".to_string()).to_string(),
            "Not found: blog post"
        );
    }

    #[test]
    fn test_from_heritage_error() {
        let err: ContentError = HeritageError::NotFound("post 1".to_string()).into();
        assert!(matches!(err, ContentError::NotFound(ref w) if w == "post 1"));

        let err: ContentError = HeritageError::Storage("locked".to_string()).into();
        assert!(matches!(err, ContentError::Persistence(_)));
        assert!(err.to_string().contains("locked"));

        let err: ContentError = HeritageError::Validation("bad".to_string()).into();
        assert!(matches!(err, ContentError::Validation(_)));
    }
}
