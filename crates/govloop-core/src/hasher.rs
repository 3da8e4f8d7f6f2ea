//! Semantic hasher — SHA-256 over canonical forms
//!
//! # Pipeline
//!
//! `text → tokenize → AST → canonical bytes → SHA-256 → "sha256:<hex>"`
//!
//! Every entry point is total: any string (including `""`), any token list,
//! and any JSON value yields a hash.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::digest::Output;
use sha2::{Digest, Sha256};

use crate::canonical::{self, Canonicalizer};
use crate::semantic::tokenizer::{Token, Tokenizer};
use crate::{Error, Result};

/// Prefix of the wire format
pub const HASH_PREFIX: &str = "sha256:";

/// A SHA-256 digest with prefixed and bare hex renderings
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemanticHash(Output<Sha256>);

impl SemanticHash {
    pub fn from_digest(digest: [u8; 32]) -> Self {
        SemanticHash(Output::<Sha256>::clone_from_slice(&digest))
    }

    pub fn digest(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Bare 64-character lowercase hex
    pub fn hex(&self) -> String {
        format!("{:x}", self.0)
    }

    /// `sha256:` followed by [`SemanticHash::hex`]
    pub fn prefixed(&self) -> String {
        format!("{}{}", HASH_PREFIX, self.hex())
    }

    /// Parse either the prefixed or the bare form
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s.strip_prefix(HASH_PREFIX).unwrap_or(s);
        if hex.len() != 64 || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(Error::HashFormat(format!(
                "expected 64 lowercase hex characters, got '{}'",
                s
            )));
        }
        let mut digest = [0u8; 32];
        for (i, byte) in digest.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| Error::HashFormat(e.to_string()))?;
        }
        Ok(Self::from_digest(digest))
    }
}

impl std::fmt::Display for SemanticHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.prefixed())
    }
}

impl std::fmt::Debug for SemanticHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SemanticHash({})", self.prefixed())
    }
}

impl FromStr for SemanticHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SemanticHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.prefixed())
    }
}

impl<'de> Deserialize<'de> for SemanticHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 of raw bytes
pub fn hash_bytes(bytes: &[u8]) -> SemanticHash {
    SemanticHash(Sha256::digest(bytes))
}

/// Structural hash of a JSON value with top-level fields excluded
///
/// Use this for records whose volatile fields (e.g. `timestamp`) must not
/// affect identity. No synonym folding is applied.
pub fn hash_value(value: &serde_json::Value, exclude_fields: &[&str]) -> SemanticHash {
    hash_bytes(canonical::canonicalize_value(value, exclude_fields).as_bytes())
}

/// Full-pipeline hasher bound to a configured tokenizer
#[derive(Debug, Clone, Default)]
pub struct SemanticHasher {
    canonicalizer: Canonicalizer,
}

impl SemanticHasher {
    pub fn new(tokenizer: Tokenizer) -> Self {
        SemanticHasher {
            canonicalizer: Canonicalizer::new(tokenizer),
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        self.canonicalizer.tokenizer()
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Hash text through the full semantic pipeline
    pub fn hash_text(&self, text: &str, language: &str) -> SemanticHash {
        hash_bytes(self.canonicalizer.text(text, language).as_bytes())
    }

    /// Hash an already-tokenized phrase
    pub fn hash_tokens(&self, tokens: &[Token]) -> SemanticHash {
        hash_bytes(Canonicalizer::tokens(tokens).as_bytes())
    }

    /// Hash a mapping structurally; see [`hash_value`]
    pub fn hash_dict(&self, value: &serde_json::Value, exclude_fields: &[&str]) -> SemanticHash {
        hash_value(value, exclude_fields)
    }
}
