//! Canonicalizer — byte-for-byte deterministic serialization
//!
//! Two distinct operations live here and must not be confused:
//!
//! - **Semantic** canonicalization (`Canonicalizer::text` / `tokens`):
//!   text → tokens → AST → language-neutral projection. Synonyms in any
//!   supported language collapse to the same bytes.
//! - **Structural** canonicalization (`canonicalize_value`): a restricted JSON
//!   Canonicalization Scheme over arbitrary mappings. Keys are sorted,
//!   separators compact, non-ASCII emitted verbatim. It gives *no*
//!   cross-language equivalence: `{"a": "用戶"}` and `{"a": "user"}` differ.
//!
//! # Guarantees
//!
//! - **Idempotent**: `recanonicalize(canonicalize(x)) == canonicalize(x)`
//! - **Deterministic**: key insertion order never affects output bytes

use std::fmt::Write as _;

use serde_json::Value;

use crate::semantic::ast::AstBuilder;
use crate::semantic::tokenizer::{Token, Tokenizer};
use crate::{Error, Result};

/// Deterministic UTF-8 serialization; never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalForm(String);

impl CanonicalForm {
    pub(crate) fn from_canonical(s: String) -> Self {
        CanonicalForm(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<[u8]> for CanonicalForm {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

// ── Semantic canonicalization ──────────────────────────────

/// Semantic canonicalizer bound to a tokenizer
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    tokenizer: Tokenizer,
}

impl Canonicalizer {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Canonicalizer { tokenizer }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Tokenize, build the AST, and serialize its canonical projection
    pub fn text(&self, text: &str, language: &str) -> CanonicalForm {
        let tokens = self.tokenizer.tokenize(text, language);
        Self::tokens(&tokens)
    }

    /// Canonical form of an already-tokenized phrase
    pub fn tokens(tokens: &[Token]) -> CanonicalForm {
        AstBuilder::build(tokens).canonical_form()
    }
}

// ── Structural canonicalization ────────────────────────────

/// Canonical JSON of `value` with top-level `exclude_fields` removed
///
/// Exclusion applies to the outermost mapping only; nested mappings are
/// serialized in full.
pub fn canonicalize_value(value: &Value, exclude_fields: &[&str]) -> CanonicalForm {
    let mut out = String::new();
    match value {
        Value::Object(map) if !exclude_fields.is_empty() => {
            let filtered: serde_json::Map<String, Value> = map
                .iter()
                .filter(|(k, _)| !exclude_fields.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            write_value(&mut out, &Value::Object(filtered));
        }
        _ => write_value(&mut out, value),
    }
    CanonicalForm(out)
}

/// Parse JSON text and re-emit it canonically
///
/// # Errors
/// `CanonicalError` if `text` is not valid JSON.
pub fn recanonicalize(text: &str) -> Result<CanonicalForm> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::CanonicalError(format!("not canonical JSON: {}", e)))?;
    Ok(canonicalize_value(&value, &[]))
}

pub(crate) fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, &map[key.as_str()]);
            }
            out.push('}');
        }
    }
}

/// JSON string literal; escapes only `"`, `\` and control characters
pub(crate) fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
