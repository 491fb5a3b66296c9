//! Shared records, configuration, localization and error types for the
//! Heritage workspace.

pub mod config;
pub mod error;
pub mod locale;
pub mod logging;
pub mod types;

pub use config::HeritageConfig;
pub use error::{HeritageError, Result};
pub use locale::{Catalog, Translator};
pub use types::*;
