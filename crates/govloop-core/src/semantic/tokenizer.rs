//! Semantic tokenizer — converts governance text into typed, canonical tokens
//!
//! Handles: whitespace/case normalization, word splitting on punctuation
//! (emails, dotted paths and snake_case words stay whole), identifiers
//! (anything with `@` or `.`, alphanumeric codes), CJK segmentation by
//! longest match, and synonym lookup into canonical lemmas.
//!
//! Guarantees:
//! - Total: every input, including the empty string, yields a token list
//! - Deterministic: same input and table always produce the same tokens

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::synonyms::SynonymTable;

/// Language hint that requests character-set detection
pub const AUTO: &str = "auto";

/// Semantic token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    Action,
    Entity,
    Identifier,
    Value,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenType::Action => write!(f, "ACTION"),
            TokenType::Entity => write!(f, "ENTITY"),
            TokenType::Identifier => write!(f, "IDENTIFIER"),
            TokenType::Value => write!(f, "VALUE"),
        }
    }
}

/// A classified unit of meaning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub raw_value: String,
    pub canonical_value: String,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        raw_value: impl Into<String>,
        canonical_value: impl Into<String>,
    ) -> Self {
        Token {
            token_type,
            raw_value: raw_value.into(),
            canonical_value: canonical_value.into(),
        }
    }
}

/// Tokenizer bound to a synonym table
///
/// Immutable after construction; safe to share across threads.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    table: SynonymTable,
    lexicon: BTreeSet<String>,
    max_lexeme_chars: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(SynonymTable::builtin())
    }
}

impl Tokenizer {
    /// Create a tokenizer over the given synonym table
    pub fn new(table: SynonymTable) -> Self {
        let lexicon = table.cjk_surfaces();
        let max_lexeme_chars = lexicon.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        Tokenizer {
            table,
            lexicon,
            max_lexeme_chars,
        }
    }

    pub fn table(&self) -> &SynonymTable {
        &self.table
    }

    /// Tokenize `text`; `language` is a table code or [`AUTO`]
    pub fn tokenize(&self, text: &str, language: &str) -> Vec<Token> {
        let normalized = normalize_text(text);
        let language = if language == AUTO {
            detect_language(&normalized)
        } else {
            language
        };

        let mut tokens = Vec::new();
        for word in split_words(&normalized) {
            for segment in self.segment(&word) {
                if let Some(token) = self.classify(&segment, language) {
                    tokens.push(token);
                }
            }
        }

        debug!(language, count = tokens.len(), "Tokenized text");
        tokens
    }

    // ── Segmentation ───────────────────────────────────────

    /// Split a word into script runs; CJK runs are segmented by longest
    /// match against the lexicon, unmatched characters grouped together.
    fn segment(&self, word: &str) -> Vec<String> {
        if !word.chars().any(is_cjk) {
            return vec![word.to_string()];
        }

        let mut segments = Vec::new();
        let mut run = String::new();
        let mut run_is_cjk = false;
        for ch in word.chars() {
            let cjk = is_cjk(ch);
            if !run.is_empty() && cjk != run_is_cjk {
                self.flush_run(&mut segments, &run, run_is_cjk);
                run.clear();
            }
            run_is_cjk = cjk;
            run.push(ch);
        }
        if !run.is_empty() {
            self.flush_run(&mut segments, &run, run_is_cjk);
        }
        segments
    }

    fn flush_run(&self, segments: &mut Vec<String>, run: &str, cjk: bool) {
        if cjk {
            segments.extend(self.longest_match(run));
        } else {
            segments.push(run.to_string());
        }
    }

    fn longest_match(&self, run: &str) -> Vec<String> {
        let chars: Vec<char> = run.chars().collect();
        let mut out = Vec::new();
        let mut pending = String::new();
        let mut i = 0;

        while i < chars.len() {
            let longest = self.max_lexeme_chars.min(chars.len() - i);
            let matched = (1..=longest).rev().find_map(|len| {
                let candidate: String = chars[i..i + len].iter().collect();
                self.lexicon.contains(&candidate).then_some((candidate, len))
            });

            match matched {
                Some((lexeme, len)) => {
                    if !pending.is_empty() {
                        out.push(std::mem::take(&mut pending));
                    }
                    out.push(lexeme);
                    i += len;
                }
                None => {
                    pending.push(chars[i]);
                    i += 1;
                }
            }
        }
        if !pending.is_empty() {
            out.push(pending);
        }
        out
    }

    // ── Classification ─────────────────────────────────────

    fn classify(&self, word: &str, language: &str) -> Option<Token> {
        if let Some(canonical) = self.table.lookup_action(language, word) {
            return Some(Token::new(TokenType::Action, word, canonical));
        }
        if let Some(canonical) = self.table.lookup_entity(language, word) {
            return Some(Token::new(TokenType::Entity, word, canonical));
        }
        if self.table.is_stopword(language, word) {
            return None;
        }
        if is_identifier_like(word) {
            return Some(Token::new(TokenType::Identifier, word, word));
        }
        Some(Token::new(TokenType::Value, word, word))
    }
}

// ── Text helpers ──────────────────────────────────────────

/// Collapse whitespace runs to one space, trim, lower-case
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Detect a language code from the character set
pub fn detect_language(text: &str) -> &'static str {
    if text.chars().any(is_kana) {
        "ja"
    } else if text.chars().any(is_hangul) {
        "ko"
    } else if text.chars().any(is_cjk) {
        "zh"
    } else {
        "en"
    }
}

/// Characters kept inside a word when flanked by non-CJK alphanumerics
fn is_connector(ch: char) -> bool {
    matches!(ch, '@' | '.' | '_' | '-')
}

fn joins_connector(ch: Option<&char>) -> bool {
    matches!(ch, Some(&c) if c.is_alphanumeric() && !is_cjk(c))
}

/// Split normalized text on whitespace and punctuation, keeping
/// identifier connectors that sit between non-CJK alphanumerics
fn split_words(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        let keep = if ch.is_alphanumeric() {
            true
        } else if is_connector(ch) {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p));
            joins_connector(prev) && joins_connector(chars.get(i + 1))
        } else {
            false
        };

        if keep {
            current.push(ch);
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn is_identifier_like(word: &str) -> bool {
    if word.contains('@') || word.contains('.') {
        return true;
    }
    let has_digit = word.chars().any(|c| c.is_ascii_digit());
    let has_alpha = word.chars().any(|c| c.is_alphabetic());
    has_digit && has_alpha
}

/// CJK unified ideographs (incl. extension A and compatibility block)
pub(crate) fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}')
}

fn is_kana(ch: char) -> bool {
    matches!(ch, '\u{3040}'..='\u{30FF}')
}

fn is_hangul(ch: char) -> bool {
    matches!(ch, '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Tokenizer::default().tokenize(input, AUTO)
    }

    fn canon(input: &str) -> Vec<(TokenType, String)> {
        tokenize(input)
            .into_iter()
            .map(|t| (t.token_type, t.canonical_value))
            .collect()
    }

    // ── Normalization ──────────────────────────────────

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  Create \t\n  USER  "), "create user");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n\t "), "");
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_only_whitespace() {
        assert!(tokenize("   \n\n\t  ").is_empty());
    }

    #[test]
    fn test_only_punctuation() {
        assert!(tokenize("!!! ,,, ???").is_empty());
    }

    // ── Classification ─────────────────────────────────

    #[test]
    fn test_tokenize_action_entity_value() {
        let tokens = tokenize("Add user alice");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Action, "add", "create"),
                Token::new(TokenType::Entity, "user", "user"),
                Token::new(TokenType::Value, "alice", "alice"),
            ]
        );
    }

    #[test]
    fn test_identifiers_kept_whole() {
        let tokens = tokenize("notify alice@example.com about gl.governance.policy v2");
        let kinds: Vec<(TokenType, &str)> = tokens
            .iter()
            .map(|t| (t.token_type, t.raw_value.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TokenType::Value, "notify"),
                (TokenType::Identifier, "alice@example.com"),
                (TokenType::Value, "about"),
                (TokenType::Identifier, "gl.governance.policy"),
                (TokenType::Identifier, "v2"),
            ]
        );
    }

    #[test]
    fn test_trailing_punctuation_is_boundary() {
        let tokens = tokenize("delete file report.pdf.");
        assert_eq!(tokens[2].raw_value, "report.pdf");
        assert_eq!(tokens[2].token_type, TokenType::Identifier);
    }

    #[test]
    fn test_punctuation_splits_words() {
        assert_eq!(
            canon("create user,role;permission"),
            vec![
                (TokenType::Action, "create".to_string()),
                (TokenType::Entity, "user".to_string()),
                (TokenType::Entity, "role".to_string()),
                (TokenType::Entity, "permission".to_string()),
            ]
        );
    }

    #[test]
    fn test_stopwords_dropped() {
        assert_eq!(canon("create a user"), canon("create user"));
        assert_eq!(canon("the"), vec![]);
    }

    #[test]
    fn test_plain_digits_are_values() {
        let tokens = tokenize("42");
        assert_eq!(tokens, vec![Token::new(TokenType::Value, "42", "42")]);
    }

    // ── CJK ────────────────────────────────────────────

    #[test]
    fn test_cjk_segmentation_longest_match() {
        assert_eq!(
            canon("創建用戶"),
            vec![
                (TokenType::Action, "create".to_string()),
                (TokenType::Entity, "user".to_string()),
            ]
        );
        // 使用者 (3 chars) must win over any shorter prefix
        assert_eq!(
            canon("建立使用者"),
            vec![
                (TokenType::Action, "create".to_string()),
                (TokenType::Entity, "user".to_string()),
            ]
        );
    }

    #[test]
    fn test_cjk_unmatched_characters_grouped() {
        let tokens = tokenize("新增用戶張三");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2], Token::new(TokenType::Value, "張三", "張三"));
    }

    #[test]
    fn test_mixed_script_word_split() {
        assert_eq!(canon("創建user"), canon("create user"));
    }

    #[test]
    fn test_connector_next_to_cjk_is_boundary() {
        let expected = vec![
            (TokenType::Entity, "policy".to_string()),
            (TokenType::Entity, "config".to_string()),
        ];
        assert_eq!(canon("策略.配置"), expected);
        assert_eq!(canon("策略-配置"), expected);
        assert_eq!(canon("用戶_配置"), canon("user config"));
        assert_eq!(canon("刪除 user.用戶"), canon("delete user user"));
        assert_eq!(canon("ops@用戶"), canon("ops user"));
    }

    #[test]
    fn test_no_punctuation_only_tokens() {
        for input in ["策略.配置", "用戶_配置", "刪除 user.用戶", "a.策略", "策略@x.com", "服務-v2"] {
            for token in tokenize(input) {
                assert!(
                    token.raw_value.chars().any(char::is_alphanumeric),
                    "punctuation token {:?} from {:?}",
                    token.raw_value,
                    input
                );
                assert!(
                    !token.raw_value.starts_with(is_connector)
                        && !token.raw_value.ends_with(is_connector),
                    "dangling connector in {:?} from {:?}",
                    token.raw_value,
                    input
                );
            }
        }
    }

    #[test]
    fn test_snake_case_kept_whole_as_value() {
        assert_eq!(
            tokenize("user_id"),
            vec![Token::new(TokenType::Value, "user_id", "user_id")]
        );
    }

    #[test]
    fn test_cjk_punctuation_is_boundary() {
        assert_eq!(canon("創建，用戶。"), canon("create user"));
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("create user"), "en");
        assert_eq!(detect_language("創建用戶"), "zh");
        assert_eq!(detect_language("ユーザー"), "ja");
        assert_eq!(detect_language("사용자"), "ko");
    }

    #[test]
    fn test_explicit_language_hint() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            tokenizer.tokenize("delete user", "en"),
            tokenizer.tokenize("delete user", "zh")
        );
    }

    // ── Determinism proof ──────────────────────────────

    #[test]
    fn test_tokenize_determinism_100_iterations() {
        let input = "Approve policy gl.security.baseline for 用戶 ops@example.org";
        let tokenizer = Tokenizer::default();
        let first = tokenizer.tokenize(input, AUTO);
        for i in 0..100 {
            let result = tokenizer.tokenize(input, AUTO);
            assert_eq!(first, result, "Determinism failure at iteration {}", i);
        }
    }
}
