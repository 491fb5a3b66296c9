//! User-facing string lookup.
//!
//! Components only ever read display text through [`Translator`]; no
//! control flow depends on the returned strings.

use std::collections::HashMap;

use crate::types::Language;

/// Localized string lookup.
pub trait Translator: Send + Sync {
    /// Text for `key` in `language`. Implementations fall back to English,
    /// then to the key itself.
    fn translate(&self, key: &str, language: Language) -> String;
}

/// In-memory key/language table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<(Language, String), String>,
}

impl Catalog {
    /// An empty catalog: every lookup returns the key.
    pub fn new() -> Self {
        Self::default()
    }

    /// The strings shipped with the site.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (key, en, fr, ar) in BUILTIN {
            catalog.insert(Language::En, key, en);
            catalog.insert(Language::Fr, key, fr);
            catalog.insert(Language::Ar, key, ar);
        }
        catalog
    }

    pub fn insert(&mut self, language: Language, key: &str, text: &str) {
        self.entries
            .insert((language, key.to_string()), text.to_string());
    }

    fn lookup(&self, key: &str, language: Language) -> Option<&str> {
        self.entries
            .get(&(language, key.to_string()))
            .map(String::as_str)
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str, language: Language) -> String {
        self.lookup(key, language)
            .or_else(|| self.lookup(key, Language::En))
            .unwrap_or(key)
            .to_string()
    }
}

const BUILTIN: &[(&str, &str, &str, &str)] = &[
    (
        "chat.welcome",
        "Welcome! Ask me about opening hours, tickets or how to find us.",
        "Bienvenue ! Posez-moi vos questions sur les horaires, les billets ou l'accès.",
        "مرحبًا بكم! اسألوني عن المواعيد أو التذاكر أو كيفية الوصول إلينا.",
    ),
    (
        "chat.fallback",
        "Sorry, I don't have an answer for that yet.",
        "Désolé, je n'ai pas encore de réponse à cette question.",
        "عذرًا، ليس لدي إجابة على ذلك بعد.",
    ),
    (
        "comment.success.title",
        "Comment sent",
        "Commentaire envoyé",
        "تم إرسال التعليق",
    ),
    (
        "comment.success.description",
        "Your comment will appear once a moderator has approved it.",
        "Votre commentaire apparaîtra après validation par un modérateur.",
        "سيظهر تعليقك بعد موافقة المشرف عليه.",
    ),
    (
        "comment.empty.title",
        "Empty comment",
        "Commentaire vide",
        "تعليق فارغ",
    ),
    (
        "comment.empty.description",
        "Please write something before sending.",
        "Veuillez écrire quelque chose avant d'envoyer.",
        "يرجى كتابة شيء قبل الإرسال.",
    ),
    (
        "comment.error.title",
        "Comment not sent",
        "Commentaire non envoyé",
        "لم يتم إرسال التعليق",
    ),
    (
        "comment.error.description",
        "Something went wrong. Please try again.",
        "Une erreur est survenue. Veuillez réessayer.",
        "حدث خطأ ما. يرجى المحاولة مرة أخرى.",
    ),
    (
        "upload.rejected.title",
        "File rejected",
        "Fichier refusé",
        "تم رفض الملف",
    ),
];
