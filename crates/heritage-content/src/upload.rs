//! Image uploads for posts and artifacts.
//!
//! Files are checked against the configured policy, given a collision-free
//! object key, and handed to an [`ObjectStore`] which returns the public URL.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use heritage_core::config::UploadConfig;
use heritage_core::locale::Translator;
use heritage_core::types::{Language, Severity};

use crate::error::ContentError;
use crate::notify::Notifier;

/// Limits applied before a file is stored.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub folder: String,
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            allowed_content_types: config.allowed_content_types.clone(),
            folder: config.folder.clone(),
        }
    }
}

/// A validated upload, ready to be written under `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub key: String,
    pub content_type: String,
    pub size: u64,
}

impl UploadPolicy {
    /// Validate a file and build its object key.
    pub fn prepare(
        &self,
        file_name: &str,
        content_type: &str,
        size: u64,
    ) -> Result<UploadTicket, ContentError> {
        if file_name.trim().is_empty() {
            return Err(ContentError::Validation("file name is empty".to_string()));
        }
        let content_type = content_type.trim().to_ascii_lowercase();
        if !self
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&content_type))
        {
            return Err(ContentError::Validation(format!(
                "content type {} is not allowed",
                content_type
            )));
        }
        if size == 0 {
            return Err(ContentError::Validation("file is empty".to_string()));
        }
        if size > self.max_bytes {
            return Err(ContentError::Validation(format!(
                "file is {} bytes, limit is {} bytes",
                size, self.max_bytes
            )));
        }

        let name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name));
        let folder = self.folder.trim_matches('/');
        let key = if folder.is_empty() {
            name
        } else {
            format!("{}/{}", folder, name)
        };

        Ok(UploadTicket {
            key,
            content_type,
            size,
        })
    }
}

/// Lower-case the name and keep `[a-z0-9._]`. Any other run of characters
/// becomes a single `-`, dropped next to a `.` and at either end.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut separator = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
            if separator && !out.is_empty() && c != '.' && !out.ends_with('.') {
                out.push('-');
            }
            separator = false;
            out.push(c);
        } else {
            separator = true;
        }
    }
    let trimmed = out.trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Blob storage for uploaded files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` and return the public URL.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, ContentError>;
}

/// Object store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, ContentError> {
        let relative = Path::new(key);
        if key.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(ContentError::Validation(format!("invalid object key: {}", key)));
        }

        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ContentError::Persistence(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ContentError::Persistence(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Object stored");
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }
}

/// Validates and stores uploads, notifying the user on rejection.
pub struct Uploader {
    policy: UploadPolicy,
    store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
    translator: Arc<dyn Translator>,
    language: Language,
}

impl Uploader {
    pub fn new(
        policy: UploadPolicy,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            policy,
            store,
            notifier,
            translator,
            language: Language::En,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Store a file and return its public URL.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, ContentError> {
        let ticket = match self.policy.prepare(file_name, content_type, bytes.len() as u64) {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(file = %file_name, error = %e, "Upload rejected");
                let title = self.translator.translate("upload.rejected.title", self.language);
                self.notifier.notify(&title, &e.to_string(), Severity::Warning);
                return Err(e);
            }
        };

        let url = self.store.put(&ticket.key, bytes).await?;
        info!(key = %ticket.key, size = ticket.size, "Upload stored");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use heritage_core::locale::Catalog;

    fn policy() -> UploadPolicy {
        UploadPolicy::from(&UploadConfig::default())
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Roman Amphora (1).JPG"), "roman-amphora-1.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_file_name("mosaïque.png"), "mosa-que.png");
        assert_eq!(sanitize_file_name("..."), "file");
        assert_eq!(sanitize_file_name("a__b.png"), "a__b.png");
    }

    #[test]
    fn test_prepare_builds_prefixed_key() {
        let ticket = policy().prepare("Vase.PNG", "IMAGE/PNG", 1024).unwrap();
        assert!(ticket.key.starts_with("images/"));
        assert!(ticket.key.ends_with("-vase.png"));
        assert_eq!(ticket.content_type, "image/png");
        assert_eq!(ticket.size, 1024);
    }

    #[test]
    fn test_prepare_keys_are_unique() {
        let p = policy();
        let a = p.prepare("vase.png", "image/png", 1).unwrap();
        let b = p.prepare("vase.png", "image/png", 1).unwrap();
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_prepare_without_folder() {
        let p = UploadPolicy {
            folder: "/".to_string(),
            ..policy()
        };
        let ticket = p.prepare("vase.png", "image/png", 1).unwrap();
        assert!(!ticket.key.contains('/'));
    }

    #[test]
    fn test_prepare_rejections() {
        let p = policy();
        assert!(matches!(p.prepare(" ", "image/png", 1), Err(ContentError::Validation(_))));
        assert!(matches!(
            p.prepare("doc.pdf", "application/pdf", 1),
            Err(ContentError::Validation(_))
        ));
        assert!(matches!(p.prepare("vase.png", "image/png", 0), Err(ContentError::Validation(_))));
        assert!(matches!(
            p.prepare("vase.png", "image/png", p.max_bytes + 1),
            Err(ContentError::Validation(_))
        ));
        assert!(p.prepare("vase.png", "image/png", p.max_bytes).is_ok());
    }

    #[tokio::test]
    async fn test_local_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "https://cdn.example.org/media/");
        let url = store.put("images/abc-vase.png", b"png-bytes").await.unwrap();

        assert_eq!(url, "https://cdn.example.org/media/images/abc-vase.png");
        let written = std::fs::read(dir.path().join("images").join("abc-vase.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost");
        assert!(store.put("../escape.png", b"x").await.is_err());
        assert!(store.put("/abs.png", b"x").await.is_err());
        assert!(store.put("", b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_uploader_stores_and_notifies_on_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let uploader = Uploader::new(
            policy(),
            Arc::new(LocalObjectStore::new(dir.path(), "http://localhost/files")),
            notifier.clone(),
            Arc::new(Catalog::builtin()),
        )
        .with_language(Language::Fr);

        let url = uploader.upload("Vase.png", "image/png", b"data").await.unwrap();
        assert!(url.starts_with("http://localhost/files/images/"));
        assert!(notifier.severities().is_empty());

        let err = uploader
            .upload("notes.txt", "text/plain", b"data")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "Fichier refusé");
        assert_eq!(seen[0].2, Severity::Warning);
    }
}
