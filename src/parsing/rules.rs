//! Individual answer extraction rules.
//!
//! Each rule looks at already-normalized text (trimmed, `**` removed) and
//! either produces a non-empty answer or declines.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// One step of the extraction chain.
pub trait AnswerRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Try to pull an answer out of `text`. Never returns an empty string.
    fn try_match(&self, text: &str) -> Option<String>;
}

/// Sentence end: a period followed by whitespace or end of text.
static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(?:\s|$)").unwrap());

/// An integer or decimal not glued to a preceding word. A leading minus is
/// part of the number ("-70"), but in "12-5" the trailing number is `5`.
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w.])(-?\d+(?:\.\d+)?)\b").unwrap());

const QUOTE_CHARS: &[char] = &['"', '\'', '`', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Matches "<marker>[:] <answer>" where the marker is a fixed phrase such as
/// "the final answer is".
pub struct PhraseRule {
    marker: String,
    pattern: Regex,
}

impl PhraseRule {
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        let marker = marker.trim();
        let pattern = RegexBuilder::new(&format!(r"\b{}\s*:*\s*", regex::escape(marker)))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            marker: marker.to_string(),
            pattern,
        })
    }
}

impl AnswerRule for PhraseRule {
    fn name(&self) -> &str {
        &self.marker
    }

    fn try_match(&self, text: &str) -> Option<String> {
        let found = self.pattern.find(text)?;
        let rest = &text[found.end()..];

        let line = rest.split(['\n', '\r']).next().unwrap_or_default();
        let sentence = match SENTENCE_END_RE.find(line) {
            Some(end) => &line[..end.start()],
            None => line,
        };

        let answer = clean_capture(sentence);
        (!answer.is_empty()).then(|| answer.to_string())
    }
}

fn clean_capture(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end();
    trimmed.trim_matches(QUOTE_CHARS).trim()
}

/// Matches a number at or near the end of the text.
///
/// Up to `max_trailing_words` alphabetic words (plus one optional period) may
/// follow the number: "...so you have 6 apples left." yields `6`.
pub struct TrailingNumberRule {
    max_trailing_words: usize,
}

impl TrailingNumberRule {
    pub fn new(max_trailing_words: usize) -> Self {
        Self { max_trailing_words }
    }

    pub fn max_trailing_words(&self) -> usize {
        self.max_trailing_words
    }
}

impl AnswerRule for TrailingNumberRule {
    fn name(&self) -> &str {
        "trailing number"
    }

    fn try_match(&self, text: &str) -> Option<String> {
        let number = NUMBER_RE.captures_iter(text).last()?.get(1)?;

        let tail = text[number.end()..].trim_end();
        let tail = tail.strip_suffix('.').unwrap_or(tail);

        let mut words = 0;
        for word in tail.split_whitespace() {
            if !word.chars().all(char::is_alphabetic) {
                return None;
            }
            words += 1;
            if words > self.max_trailing_words {
                return None;
            }
        }

        Some(number.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase(marker: &str) -> PhraseRule {
        PhraseRule::new(marker).unwrap()
    }

    #[test]
    fn test_phrase_rule_stops_at_sentence_end() {
        let rule = phrase("the answer is");
        assert_eq!(
            rule.try_match("So the answer is 11. Let me double check."),
            Some("11".to_string())
        );
    }

    #[test]
    fn test_phrase_rule_keeps_decimal_point() {
        let rule = phrase("the answer is");
        assert_eq!(
            rule.try_match("The answer is 3.14."),
            Some("3.14".to_string())
        );
    }

    #[test]
    fn test_phrase_rule_stops_at_line_break() {
        let rule = phrase("the final answer is");
        assert_eq!(
            rule.try_match("The final answer is: 42\nExplanation follows"),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_phrase_rule_answer_on_next_line() {
        let rule = phrase("the final answer is");
        assert_eq!(
            rule.try_match("The final answer is:\n\n42"),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_phrase_rule_is_case_insensitive_and_allows_colons() {
        let rule = phrase("the final answer is");
        assert_eq!(
            rule.try_match("THE FINAL ANSWER IS:: yes"),
            Some("yes".to_string())
        );
    }

    #[test]
    fn test_phrase_rule_strips_quotes() {
        let rule = phrase("the output is");
        assert_eq!(
            rule.try_match("Therefore, the output is \u{201C}le\u{201D}."),
            Some("le".to_string())
        );
    }

    #[test]
    fn test_phrase_rule_blank_capture_declines() {
        let rule = phrase("the answer is");
        assert_eq!(rule.try_match("Here is the answer is"), None);
        assert_eq!(rule.try_match("the answer is ."), None);
        assert_eq!(rule.try_match("the answer is \"\""), None);
    }

    #[test]
    fn test_phrase_rule_requires_word_boundary() {
        let rule = phrase("the answer is");
        assert_eq!(rule.try_match("bathe answer is 4"), None);
    }

    #[test]
    fn test_trailing_number_respects_word_budget() {
        let strict = TrailingNumberRule::new(0);
        assert_eq!(strict.try_match("Total: 12."), Some("12".to_string()));
        assert_eq!(strict.try_match("Total: 12 apples."), None);

        let loose = TrailingNumberRule::new(2);
        assert_eq!(
            loose.try_match("you have 7 items remaining."),
            Some("7".to_string())
        );
        assert_eq!(loose.try_match("you have 7 items remaining today."), None);
    }

    #[test]
    fn test_trailing_number_uses_last_number() {
        let rule = TrailingNumberRule::new(2);
        assert_eq!(
            rule.try_match("He has 5 + 6 = 11 balls."),
            Some("11".to_string())
        );
        assert_eq!(
            rule.try_match("ends with a number 3.14"),
            Some("3.14".to_string())
        );
    }

    #[test]
    fn test_trailing_number_keeps_minus_sign() {
        let rule = TrailingNumberRule::new(2);
        assert_eq!(rule.try_match("The total is -70."), Some("-70".to_string()));
        assert_eq!(rule.try_match("-3.5"), Some("-3.5".to_string()));
        assert_eq!(
            rule.try_match("Temperature drops to -4 degrees."),
            Some("-4".to_string())
        );
        assert_eq!(rule.try_match("So 12-5 equals 7"), Some("7".to_string()));
        assert_eq!(rule.try_match("Subtract: 12-5"), Some("5".to_string()));
    }

    #[test]
    fn test_trailing_number_rejects_non_word_tail() {
        let rule = TrailingNumberRule::new(2);
        assert_eq!(rule.try_match("It costs 5 dollars!"), None);
        assert_eq!(rule.try_match("Version 3rd edition"), None);
    }
}
