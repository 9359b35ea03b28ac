//! Final-answer extraction from free-form completions.
//!
//! Rules are tried in list order and the first hit wins, so priority is
//! simply list position: marker phrases first, trailing number last.

use super::rules::{AnswerRule, PhraseRule, TrailingNumberRule};
use crate::models::{CogsynthError, ExtractionConfig, Result};

/// Ordered chain of answer rules.
pub struct AnswerExtractor {
    rules: Vec<Box<dyn AnswerRule>>,
}

impl AnswerExtractor {
    /// Build the standard chain: one `PhraseRule` per configured marker, then
    /// a `TrailingNumberRule`.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let mut rules: Vec<Box<dyn AnswerRule>> = Vec::with_capacity(config.markers.len() + 1);

        for marker in config.markers.iter().filter(|m| !m.trim().is_empty()) {
            let rule = PhraseRule::new(marker).map_err(|e| {
                CogsynthError::InvalidInput(format!("Bad extraction marker {marker:?}: {e}"))
            })?;
            rules.push(Box::new(rule));
        }
        rules.push(Box::new(TrailingNumberRule::new(config.max_trailing_words)));

        Ok(Self { rules })
    }

    /// Build an extractor from an explicit rule list.
    pub fn from_rules(rules: Vec<Box<dyn AnswerRule>>) -> Self {
        Self { rules }
    }

    /// Append a rule at the lowest priority.
    pub fn with_rule(mut self, rule: impl AnswerRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Names of the rules in priority order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Extract the final answer, or `None` when no rule matches.
    pub fn extract(&self, text: &str) -> Option<String> {
        self.extract_with_rule(text).map(|(_, answer)| answer)
    }

    /// Like [`extract`](Self::extract), also naming the rule that matched.
    pub fn extract_with_rule(&self, text: &str) -> Option<(&str, String)> {
        let normalized = normalize(text);
        self.rules
            .iter()
            .find_map(|rule| rule.try_match(&normalized).map(|a| (rule.name(), a)))
    }
}

/// Trim and drop markdown bold markers.
fn normalize(text: &str) -> String {
    text.trim().replace("**", "")
}
