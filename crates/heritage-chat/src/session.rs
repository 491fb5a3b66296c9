//! Conversation session: open/closed state, message history, and deferred
//! bot replies.
//!
//! Each visitor message schedules its own reply task. Replies land after the
//! configured delay, in the order their delays expire. Tearing the session
//! down (explicitly or by dropping it) cancels every pending reply, and a
//! cancelled reply is never appended.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use heritage_core::config::ChatConfig;
use heritage_core::locale::Translator;
use heritage_core::types::{ChatMessage, Language};

use crate::error::ChatError;
use crate::matcher::ResponseMatcher;
use crate::store::ResponseStore;

const WELCOME_KEY: &str = "chat.welcome";
const FALLBACK_KEY: &str = "chat.fallback";

/// Whether the chat window is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Default)]
struct History {
    messages: Vec<ChatMessage>,
    /// Id of the seeded welcome message, if one was seeded.
    welcome: Option<Uuid>,
    /// Set on teardown. Checked under the lock before every reply append.
    closed: bool,
}

/// A single visitor conversation.
///
/// Must be used from within a tokio runtime: [`send`](Self::send) spawns the
/// reply task.
pub struct ConversationSession {
    state: SessionState,
    language: Language,
    config: ChatConfig,
    store: Arc<ResponseStore>,
    translator: Arc<dyn Translator>,
    history: Arc<Mutex<History>>,
    cancel: watch::Sender<bool>,
    pending: Vec<JoinHandle<()>>,
}

impl ConversationSession {
    pub fn new(
        config: ChatConfig,
        store: Arc<ResponseStore>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            state: SessionState::Closed,
            language: config.default_language,
            config,
            store,
            translator,
            history: Arc::new(Mutex::new(History::default())),
            cancel,
            pending: Vec::new(),
        }
    }

    // -----------------------------------------------------------------
    // Open / closed
    // -----------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn open(&mut self) {
        self.state = SessionState::Open;
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    pub fn toggle(&mut self) {
        self.state = match self.state {
            SessionState::Open => SessionState::Closed,
            SessionState::Closed => SessionState::Open,
        };
    }

    // -----------------------------------------------------------------
    // Language and welcome message
    // -----------------------------------------------------------------

    pub fn language(&self) -> Language {
        self.language
    }

    /// Seed the welcome message in `language` if the history is empty.
    pub fn initialize(&mut self, language: Language) {
        self.language = language;
        let welcome = self.translator.translate(WELCOME_KEY, language);
        let mut history = lock(&self.history);
        if history.messages.is_empty() {
            history.seed_welcome(welcome);
        }
    }

    /// Switch language.
    ///
    /// While the history is empty or holds only the seeded welcome message,
    /// it is replaced by the welcome message in the new language. Any other
    /// history, including a reply that landed after `clear`, is left as is.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        let welcome = self.translator.translate(WELCOME_KEY, language);
        let mut history = lock(&self.history);
        if history.only_welcome() {
            history.messages.clear();
            history.seed_welcome(welcome);
            debug!(language = %language, "Welcome message re-seeded");
        }
    }

    // -----------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------

    /// Append the visitor's message and schedule the bot reply.
    ///
    /// Blank input is ignored and returns `Ok(None)`. Otherwise returns the
    /// id of the appended outgoing message. The reply is computed against
    /// the rule snapshot current when the delay elapses, in the language
    /// active at the time of sending.
    pub fn send(&mut self, text: &str) -> Result<Option<Uuid>, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        if text.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        let outgoing = ChatMessage::outgoing(text);
        let id = outgoing.id;
        {
            let mut history = lock(&self.history);
            if history.closed {
                return Err(ChatError::SessionClosed);
            }
            history.messages.push(outgoing);
        }

        self.pending.retain(|handle| !handle.is_finished());
        self.pending.push(self.schedule_reply(text.to_string()));
        Ok(Some(id))
    }

    fn schedule_reply(&self, input: String) -> JoinHandle<()> {
        let history = Arc::clone(&self.history);
        let store = Arc::clone(&self.store);
        let translator = Arc::clone(&self.translator);
        let mut cancel = self.cancel.subscribe();
        let delay = Duration::from_millis(self.config.reply_delay_ms);
        let language = self.language;

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.wait_for(|cancelled| *cancelled) => {
                    debug!("Pending reply cancelled");
                    return;
                }
            }

            let rules = store.snapshot();
            let reply = match ResponseMatcher.match_rule(&input, &rules) {
                Some(rule) => {
                    debug!(intent = %rule.intent, "Rule matched");
                    rule.replies.get(language).to_string()
                }
                None => translator.translate(FALLBACK_KEY, language),
            };

            let mut history = lock(&history);
            if history.closed {
                return;
            }
            history.messages.push(ChatMessage::incoming(reply));
        })
    }

    /// Empty the history. The open/closed state is unchanged.
    pub fn clear(&mut self) {
        let mut history = lock(&self.history);
        history.messages.clear();
        history.welcome = None;
    }

    /// Copy of the current history, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.history).messages.clone()
    }

    /// Number of replies still waiting for their delay.
    pub fn pending_replies(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }

    // -----------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------

    /// Cancel pending replies and refuse further messages.
    ///
    /// History stays readable. Also runs on drop.
    pub fn shutdown(&mut self) {
        {
            let mut history = lock(&self.history);
            if history.closed {
                return;
            }
            history.closed = true;
        }
        self.cancel.send_replace(true);
        let cancelled = self.pending.len();
        for handle in self.pending.drain(..) {
            handle.abort();
        }
        info!(cancelled, "Chat session closed");
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl History {
    fn seed_welcome(&mut self, text: String) {
        let message = ChatMessage::incoming(text);
        self.welcome = Some(message.id);
        self.messages.push(message);
    }

    fn only_welcome(&self) -> bool {
        match self.messages.as_slice() {
            [] => true,
            [only] => self.welcome == Some(only.id),
            _ => false,
        }
    }
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("state", &self.state)
            .field("language", &self.language)
            .field("pending", &self.pending.len())
            .finish()
    }
}

fn lock(history: &Mutex<History>) -> MutexGuard<'_, History> {
    history.lock().unwrap_or_else(|e| e.into_inner())
}
