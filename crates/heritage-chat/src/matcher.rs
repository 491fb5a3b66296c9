//! Response selection.
//!
//! Picks the reply for a visitor message from a rule set using
//! case-insensitive substring patterns, rule priority, and a fallback rule.

use heritage_core::types::{Language, ResponseRule};

/// Stateless rule matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseMatcher;

impl ResponseMatcher {
    /// Select the rule that answers `input`.
    ///
    /// Among active rules with a pattern contained in the trimmed,
    /// lower-cased input, the highest priority wins; equal priorities keep
    /// slice order. With no candidate, the first active `default` rule is
    /// returned, or `None` if there is none.
    pub fn match_rule<'r>(&self, input: &str, rules: &'r [ResponseRule]) -> Option<&'r ResponseRule> {
        let normalized = input.trim().to_lowercase();

        let mut best: Option<&ResponseRule> = None;
        for rule in rules.iter().filter(|r| r.active) {
            if !matches_any(rule, &normalized) {
                continue;
            }
            // Strictly greater keeps the earlier rule on ties.
            if best.map_or(true, |b| rule.priority > b.priority) {
                best = Some(rule);
            }
        }

        best.or_else(|| rules.iter().find(|r| r.active && r.is_default()))
    }

    /// Reply text for `input` in `language`, or `None` when no rule and no
    /// fallback rule apply.
    pub fn reply<'r>(
        &self,
        input: &str,
        rules: &'r [ResponseRule],
        language: Language,
    ) -> Option<&'r str> {
        self.match_rule(input, rules)
            .map(|rule| rule.replies.get(language))
    }
}

fn matches_any(rule: &ResponseRule, normalized: &str) -> bool {
    rule.patterns.iter().any(|pattern| {
        let pattern = pattern.to_lowercase();
        !pattern.trim().is_empty() && normalized.contains(&pattern)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use heritage_core::types::{Replies, DEFAULT_INTENT};

    fn rule(intent: &str, patterns: &[&str], reply: &str, priority: i32) -> ResponseRule {
        ResponseRule::new(
            intent,
            patterns.iter().map(|p| p.to_string()).collect(),
            Replies::english(reply),
            priority,
        )
    }

    fn greeting_rules() -> Vec<ResponseRule> {
        vec![
            rule("greeting", &["hello", "hi"], "Hi there!", 1),
            rule(DEFAULT_INTENT, &[], "I don't understand", 0),
        ]
    }

    #[test]
    fn test_greeting_example() {
        let rules = greeting_rules();
        let m = ResponseMatcher;
        assert_eq!(m.reply("Hello!", &rules, Language::En), Some("Hi there!"));
        assert_eq!(m.reply("xyz", &rules, Language::En), Some("I don't understand"));
    }

    #[test]
    fn test_case_insensitive_and_trimmed() {
        let rules = vec![rule("tickets", &["Ticket Price"], "8 EUR", 1)];
        let m = ResponseMatcher;
        assert_eq!(
            m.reply("   what is the TICKET price?  ", &rules, Language::En),
            Some("8 EUR")
        );
    }

    #[test]
    fn test_highest_priority_wins() {
        let rules = vec![
            rule("low", &["museum"], "low", 1),
            rule("high", &["open"], "high", 5),
        ];
        let m = ResponseMatcher;
        assert_eq!(
            m.reply("is the museum open", &rules, Language::En),
            Some("high")
        );
    }

    #[test]
    fn test_tie_keeps_input_order() {
        let rules = vec![
            rule("first", &["visit"], "first", 5),
            rule("second", &["visit"], "second", 5),
        ];
        let m = ResponseMatcher;
        assert_eq!(m.reply("visit", &rules, Language::En), Some("first"));

        let reversed: Vec<ResponseRule> = rules.into_iter().rev().collect();
        assert_eq!(m.reply("visit", &reversed, Language::En), Some("second"));
    }

    #[test]
    fn test_inactive_rules_never_match() {
        let mut hidden = rule("hidden", &["hello"], "hidden", 10);
        hidden.active = false;
        let rules = vec![hidden, rule("visible", &["hello"], "visible", 1)];
        assert_eq!(
            ResponseMatcher.reply("hello", &rules, Language::En),
            Some("visible")
        );
    }

    #[test]
    fn test_inactive_default_is_ignored() {
        let mut fallback = rule(DEFAULT_INTENT, &[], "fallback", 0);
        fallback.active = false;
        assert_eq!(ResponseMatcher.reply("xyz", &[fallback], Language::En), None);
    }

    #[test]
    fn test_no_match_and_no_default_is_none() {
        let rules = vec![rule("greeting", &["hello"], "Hi", 1)];
        assert!(ResponseMatcher.match_rule("bye", &rules).is_none());
        assert!(ResponseMatcher.match_rule("anything", &[]).is_none());
    }

    #[test]
    fn test_first_default_wins_when_duplicated() {
        let rules = vec![
            rule(DEFAULT_INTENT, &[], "first fallback", 0),
            rule(DEFAULT_INTENT, &[], "second fallback", 9),
        ];
        assert_eq!(
            ResponseMatcher.reply("xyz", &rules, Language::En),
            Some("first fallback")
        );
    }

    #[test]
    fn test_empty_patterns_do_not_match_everything() {
        let rules = vec![
            rule("blank", &["", "  "], "blank", 10),
            rule(DEFAULT_INTENT, &[], "fallback", 0),
        ];
        assert_eq!(
            ResponseMatcher.reply("hello", &rules, Language::En),
            Some("fallback")
        );
    }

    #[test]
    fn test_default_rule_patterns_can_match_directly() {
        let rules = vec![
            rule("greeting", &["hello"], "Hi", 1),
            rule(DEFAULT_INTENT, &["help"], "How can I help?", 0),
        ];
        assert_eq!(
            ResponseMatcher.reply("help me", &rules, Language::En),
            Some("How can I help?")
        );
    }

    #[test]
    fn test_language_selection_with_english_fallback() {
        let mut r = rule("greeting", &["bonjour", "hello"], "Hello!", 1);
        r.replies = r.replies.with(Language::Fr, "Bonjour !");
        let rules = vec![r];
        let m = ResponseMatcher;
        assert_eq!(m.reply("bonjour", &rules, Language::Fr), Some("Bonjour !"));
        assert_eq!(m.reply("bonjour", &rules, Language::Ar), Some("Hello!"));
    }

    #[test]
    fn test_match_does_not_mutate_rules() {
        let rules = greeting_rules();
        let before = rules.clone();
        let _ = ResponseMatcher.reply("hello", &rules, Language::Fr);
        let _ = ResponseMatcher.reply("nothing", &rules, Language::Ar);
        assert_eq!(rules, before);
    }

    #[test]
    fn test_substring_match_inside_words() {
        // Patterns are plain substrings, not whole words.
        let rules = vec![rule("greeting", &["hi"], "Hi!", 1)];
        assert_eq!(ResponseMatcher.reply("this", &rules, Language::En), Some("Hi!"));
    }
}
