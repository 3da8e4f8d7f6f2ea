//! Semantic layer — synonym tables, tokenizer, and AST
//!
//! Converts governance text into a language-neutral tree whose canonical
//! projection is identical for same-meaning phrases in any configured
//! language.

pub mod ast;
pub mod synonyms;
pub mod tokenizer;

pub use ast::{AstBuilder, AstNode, NodeType};
pub use synonyms::{LanguageTable, SynonymTable};
pub use tokenizer::{detect_language, Token, TokenType, Tokenizer, AUTO};
