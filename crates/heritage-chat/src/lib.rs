//! Rule-based chatbot for the Heritage site.
//!
//! Loads intent rules from a [`RuleSource`], matches visitor input against
//! them, and keeps an in-memory conversation with deferred, cancellable
//! replies.

pub mod error;
pub mod matcher;
pub mod session;
pub mod store;

pub use error::ChatError;
pub use matcher::ResponseMatcher;
pub use session::{ConversationSession, SessionState};
pub use store::{ResponseStore, RuleSource};
