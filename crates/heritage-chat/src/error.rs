//! Error types for the chatbot.

use heritage_core::error::HeritageError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("chat session has been closed")]
    SessionClosed,
    #[error("rule source error: {0}")]
    RuleSource(String),
}

impl From<HeritageError> for ChatError {
    fn from(err: HeritageError) -> Self {
        ChatError::RuleSource(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::Disabled.to_string(), "chat is disabled");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::SessionClosed.to_string(),
            "chat session has been closed"
        );
        assert_eq!(
            ChatError::RuleSource("db offline".to_string()).to_string(),
            "rule source error: db offline"
        );
    }

    #[test]
    fn test_chat_error_from_heritage_error() {
        let err: ChatError = HeritageError::Storage("connection lost".to_string()).into();
        assert!(matches!(err, ChatError::RuleSource(_)));
        assert!(err.to_string().contains("connection lost"));
    }
}
