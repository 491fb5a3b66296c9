//! Visitor-facing content workflows: comment submission and moderation,
//! user notifications, and image uploads.

pub mod comments;
pub mod error;
pub mod notify;
pub mod upload;

pub use comments::{CommentForm, CommentService, CommentStore};
pub use error::ContentError;
pub use notify::{Notifier, TracingNotifier};
pub use upload::{LocalObjectStore, ObjectStore, UploadPolicy, UploadTicket, Uploader};
