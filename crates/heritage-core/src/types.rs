use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HeritageError;

// =============================================================================
// Language
// =============================================================================

/// Site language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    Ar,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Fr, Language::Ar];

    /// Two-letter language code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Ar => "ar",
        }
    }

    /// Whether text in this language is laid out right-to-left.
    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Ar)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = HeritageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            "ar" => Ok(Language::Ar),
            other => Err(HeritageError::Validation(format!(
                "unsupported language: {other}"
            ))),
        }
    }
}

// =============================================================================
// Chatbot rules
// =============================================================================

/// Intent label reserved for the fallback rule.
pub const DEFAULT_INTENT: &str = "default";

/// Localized reply texts for a rule. English is mandatory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replies {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ar: Option<String>,
}

impl Replies {
    /// English-only replies.
    pub fn english(text: impl Into<String>) -> Self {
        Self {
            en: text.into(),
            fr: None,
            ar: None,
        }
    }

    pub fn with(mut self, language: Language, text: impl Into<String>) -> Self {
        let text = text.into();
        match language {
            Language::En => self.en = text,
            Language::Fr => self.fr = Some(text),
            Language::Ar => self.ar = Some(text),
        }
        self
    }

    /// Reply for `language`, falling back to English when the translation
    /// is missing or empty.
    pub fn get(&self, language: Language) -> &str {
        let localized = match language {
            Language::En => None,
            Language::Fr => self.fr.as_deref(),
            Language::Ar => self.ar.as_deref(),
        };
        match localized {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.en,
        }
    }
}

/// A chatbot rule: intent, substring patterns, and localized replies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRule {
    pub id: Uuid,
    pub intent: String,
    pub patterns: Vec<String>,
    pub replies: Replies,
    pub priority: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl ResponseRule {
    /// Create an active rule with a fresh id.
    pub fn new(
        intent: impl Into<String>,
        patterns: Vec<String>,
        replies: Replies,
        priority: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            intent: intent.into(),
            patterns,
            replies,
            priority,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.intent == DEFAULT_INTENT
    }
}

// =============================================================================
// Chat messages
// =============================================================================

/// Whether a message came from the visitor or the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Bot to visitor.
    Incoming,
    /// Visitor to bot.
    Outgoing,
}

/// A single in-memory chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
}

impl ChatMessage {
    pub fn incoming(text: impl Into<String>) -> Self {
        Self::new(text, Direction::Incoming)
    }

    pub fn outgoing(text: impl Into<String>) -> Self {
        Self::new(text, Direction::Outgoing)
    }

    fn new(text: impl Into<String>, direction: Direction) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp: Utc::now(),
            direction,
        }
    }
}

// =============================================================================
// Content records
// =============================================================================

/// A visitor comment on a blog post. Hidden until validated by a moderator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    #[serde(default)]
    pub validated: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            validated: false,
            created_at: Utc::now(),
        }
    }
}

/// A blog post with its comment thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            author: author.into(),
            image_url: None,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A collection item shown in the artifact catalogue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Historical period, e.g. "Roman", "XIXth century".
    pub period: String,
    pub origin: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        period: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            period: period.into(),
            origin: origin.into(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Severity of a user-facing notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}
