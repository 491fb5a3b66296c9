//! Heritage Storage crate - SQLite persistence for chatbot rules, blog posts
//! and artifacts.
//!
//! Provides a WAL-mode SQLite database with versioned migrations and
//! repository implementations that map rows to the typed records of
//! `heritage-core`, validating them on read.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{ArtifactRepository, BlogPostRepository, RuleRepository};
