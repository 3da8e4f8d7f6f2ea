//! govloop Core - semantic hashing and closed-loop cost/benefit evaluation
//!
//! Two independent pipelines that turn unstructured governance input into
//! deterministic, comparable artifacts.
//!
//! # Architecture
//!
//! ```text
//! Text → Tokenizer → AST → Canonicalizer → Hasher → "sha256:<hex>"
//!          ↑
//!     SynonymTable (data)
//!
//! (CycleCost, CycleBenefit) → CostEvaluator → CostBenefitSnapshot
//!                                   ↓
//!                         summary / history / evidence hash
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: same input always produces identical output
//! - **Total**: tokenizing, canonicalizing, hashing and recording never fail
//! - **Language-neutral**: synonyms across languages hash identically
//! - **Append-only**: evaluator history is never rewritten

pub mod canonical;
pub mod cost;
pub mod error;
pub mod hasher;
pub mod semantic;

pub use canonical::{canonicalize_value, recanonicalize, CanonicalForm, Canonicalizer};
pub use cost::{
    recommend, CostBenefitSnapshot, CostEvaluator, CycleBenefit, CycleCost, CycleRecord,
    Recommendation, Summary, SummaryReport, Trend,
};
pub use error::{Error, Result};
pub use hasher::{hash_bytes, hash_value, SemanticHash, SemanticHasher, HASH_PREFIX};
pub use semantic::{AstBuilder, AstNode, NodeType, SynonymTable, Token, TokenType, Tokenizer, AUTO};
