//! Rule loading and the shared rule snapshot.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::info;

use heritage_core::types::{Language, ResponseRule};
use heritage_storage::RuleRepository;

use crate::error::ChatError;
use crate::matcher::ResponseMatcher;

/// Where chatbot rules come from.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Active rules ordered by priority descending, then creation time
    /// ascending.
    async fn list_active_rules(&self) -> Result<Vec<ResponseRule>, ChatError>;
}

#[async_trait]
impl RuleSource for RuleRepository {
    async fn list_active_rules(&self) -> Result<Vec<ResponseRule>, ChatError> {
        Ok(self.list_active()?)
    }
}

/// Read-only rule set shared by every conversation.
///
/// Sessions take a snapshot when a reply is due, so a [`reload`](Self::reload)
/// only affects replies computed afterwards.
pub struct ResponseStore {
    rules: RwLock<Arc<[ResponseRule]>>,
}

impl ResponseStore {
    /// Wrap a fixed rule set.
    pub fn from_rules(rules: Vec<ResponseRule>) -> Self {
        Self {
            rules: RwLock::new(rules.into()),
        }
    }

    /// Fetch the rules once from `source`.
    pub async fn load(source: &dyn RuleSource) -> Result<Self, ChatError> {
        let rules = source.list_active_rules().await?;
        info!(count = rules.len(), "Response rules loaded");
        Ok(Self::from_rules(rules))
    }

    /// Replace the snapshot with a fresh fetch from `source`.
    ///
    /// On error the previous snapshot is kept.
    pub async fn reload(&self, source: &dyn RuleSource) -> Result<usize, ChatError> {
        let rules = source.list_active_rules().await?;
        let count = rules.len();
        let mut guard = self.rules.write().unwrap_or_else(|e| e.into_inner());
        *guard = rules.into();
        info!(count, "Response rules reloaded");
        Ok(count)
    }

    /// Current rule set.
    pub fn snapshot(&self) -> Arc<[ResponseRule]> {
        let guard = self.rules.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convenience wrapper around [`ResponseMatcher::reply`] on the current
    /// snapshot.
    pub fn reply_for(&self, input: &str, language: Language) -> Option<String> {
        let rules = self.snapshot();
        ResponseMatcher
            .reply(input, &rules, language)
            .map(str::to_string)
    }
}

impl std::fmt::Debug for ResponseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStore")
            .field("rules", &self.len())
            .finish()
    }
}
