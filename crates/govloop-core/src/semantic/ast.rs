//! Semantic AST — a shallow tree over classified tokens
//!
//! The first ACTION token becomes the root; every other token becomes an
//! immediate child in source order. A phrase with no ACTION token (and the
//! empty phrase) gets a `NONE` sentinel root carrying all tokens as
//! children, so an action-less phrase can never share a hash with an
//! action-bearing one.
//!
//! All AST types are immutable after construction and derive:
//! Debug, Clone, PartialEq, Eq, Serialize, Deserialize

use serde::{Deserialize, Serialize};

use super::tokenizer::{Token, TokenType};
use crate::canonical::{self, CanonicalForm};
use crate::hasher::{self, SemanticHash};
use crate::{Error, Result};

/// Node categories; `None` only ever marks the sentinel root
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Action,
    Entity,
    Identifier,
    Value,
    None,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Action => "ACTION",
            NodeType::Entity => "ENTITY",
            NodeType::Identifier => "IDENTIFIER",
            NodeType::Value => "VALUE",
            NodeType::None => "NONE",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TokenType> for NodeType {
    fn from(t: TokenType) -> Self {
        match t {
            TokenType::Action => NodeType::Action,
            TokenType::Entity => NodeType::Entity,
            TokenType::Identifier => NodeType::Identifier,
            TokenType::Value => NodeType::Value,
        }
    }
}

/// A node of the semantic tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstNode {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Surface form as written
    pub value: String,
    /// Normalized lemma
    pub canonical: String,
    #[serde(default)]
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn leaf(node_type: NodeType, value: impl Into<String>, canonical: impl Into<String>) -> Self {
        AstNode {
            node_type,
            value: value.into(),
            canonical: canonical.into(),
            children: Vec::new(),
        }
    }

    fn from_token(token: &Token) -> Self {
        Self::leaf(
            token.token_type.into(),
            token.raw_value.clone(),
            token.canonical_value.clone(),
        )
    }

    /// The root produced for phrases without an ACTION token
    pub fn sentinel(children: Vec<AstNode>) -> Self {
        AstNode {
            node_type: NodeType::None,
            value: String::new(),
            canonical: String::new(),
            children,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.node_type == NodeType::None
    }

    /// Total nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(AstNode::node_count).sum::<usize>()
    }

    /// Plain nested mapping `{type, value, canonical, children}`
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.node_type.as_str(),
            "value": self.value,
            "canonical": self.canonical,
            "children": self.children.iter().map(AstNode::to_dict).collect::<Vec<_>>(),
        })
    }

    /// Exact inverse of [`AstNode::to_dict`]
    ///
    /// # Errors
    /// `AstError` if the mapping lacks a field or names an unknown type.
    pub fn from_dict(dict: &serde_json::Value) -> Result<Self> {
        AstNode::deserialize(dict).map_err(|e| Error::AstError(e.to_string()))
    }

    /// Language-neutral projection `{type, canonical, children}`
    ///
    /// Surface forms are dropped and children are ordered by their own
    /// canonical encoding, so only the root action is order-sensitive.
    pub fn canonical_value(&self) -> serde_json::Value {
        let mut children: Vec<(String, serde_json::Value)> = self
            .children
            .iter()
            .map(|c| {
                let v = c.canonical_value();
                (canonical::canonicalize_value(&v, &[]).into_string(), v)
            })
            .collect();
        children.sort_by(|a, b| a.0.cmp(&b.0));

        serde_json::json!({
            "type": self.node_type.as_str(),
            "canonical": self.canonical,
            "children": children.into_iter().map(|(_, v)| v).collect::<Vec<_>>(),
        })
    }

    /// Canonical bytes of the projection, written directly without an
    /// intermediate `serde_json::Value`
    pub fn canonical_form(&self) -> CanonicalForm {
        let mut out = String::new();
        self.write_canonical(&mut out);
        CanonicalForm::from_canonical(out)
    }

    fn write_canonical(&self, out: &mut String) {
        let mut children: Vec<String> = self
            .children
            .iter()
            .map(|c| {
                let mut s = String::new();
                c.write_canonical(&mut s);
                s
            })
            .collect();
        children.sort();

        // keys in lexicographic order: canonical, children, type
        out.push_str("{\"canonical\":");
        canonical::write_string(out, &self.canonical);
        out.push_str(",\"children\":[");
        out.push_str(&children.join(","));
        out.push_str("],\"type\":");
        canonical::write_string(out, self.node_type.as_str());
        out.push('}');
    }

    /// SHA-256 of [`AstNode::canonical_form`]
    pub fn semantic_hash(&self) -> SemanticHash {
        hasher::hash_bytes(self.canonical_form().as_bytes())
    }
}

/// Builds the shallow semantic tree from a token sequence
pub struct AstBuilder;

impl AstBuilder {
    pub fn build(tokens: &[Token]) -> AstNode {
        match tokens.iter().position(|t| t.token_type == TokenType::Action) {
            Some(root_idx) => {
                let mut root = AstNode::from_token(&tokens[root_idx]);
                root.children = tokens
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != root_idx)
                    .map(|(_, t)| AstNode::from_token(t))
                    .collect();
                root
            }
            None => AstNode::sentinel(tokens.iter().map(AstNode::from_token).collect()),
        }
    }

    /// Hash a token sequence without materializing canonical JSON twice
    pub fn hash(tokens: &[Token]) -> SemanticHash {
        Self::build(tokens).semantic_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::tokenizer::{Tokenizer, AUTO};

    fn build(text: &str) -> AstNode {
        AstBuilder::build(&Tokenizer::default().tokenize(text, AUTO))
    }

    #[test]
    fn test_first_action_is_root() {
        let ast = build("please create user alice");
        assert_eq!(ast.node_type, NodeType::Action);
        assert_eq!(ast.canonical, "create");
        let children: Vec<&str> = ast.children.iter().map(|c| c.canonical.as_str()).collect();
        assert_eq!(children, vec!["please", "user", "alice"]);
    }

    #[test]
    fn test_second_action_becomes_child() {
        let ast = build("create then delete user");
        assert_eq!(ast.canonical, "create");
        assert!(ast
            .children
            .iter()
            .any(|c| c.node_type == NodeType::Action && c.canonical == "delete"));
    }

    #[test]
    fn test_empty_tokens_give_bare_sentinel() {
        let ast = AstBuilder::build(&[]);
        assert_eq!(ast, AstNode::sentinel(vec![]));
        assert!(ast.is_sentinel());
        assert_eq!(ast.node_count(), 1);
    }

    #[test]
    fn test_no_action_uses_sentinel_root() {
        let ast = build("user alice");
        assert!(ast.is_sentinel());
        assert_eq!(ast.children.len(), 2);
        assert_eq!(ast.children[0].node_type, NodeType::Entity);
    }

    #[test]
    fn test_sentinel_does_not_collide_with_action() {
        let with_action = build("create user");
        let without_action = build("user");
        assert_ne!(with_action.semantic_hash(), without_action.semantic_hash());

        let value_root = AstBuilder::build(&[Token::new(TokenType::Value, "create", "create")]);
        let action_root = AstBuilder::build(&[Token::new(TokenType::Action, "create", "create")]);
        assert_ne!(value_root.semantic_hash(), action_root.semantic_hash());
    }

    #[test]
    fn test_dict_roundtrip() {
        for text in ["create user alice@example.com", "用戶 張三", "", "刪除 policy p1"] {
            let ast = build(text);
            let restored = AstNode::from_dict(&ast.to_dict()).unwrap();
            assert_eq!(ast, restored);
            assert_eq!(ast.children.len(), restored.children.len());
        }
    }

    #[test]
    fn test_to_dict_shape() {
        let dict = build("add role").to_dict();
        assert_eq!(
            dict,
            serde_json::json!({
                "type": "ACTION",
                "value": "add",
                "canonical": "create",
                "children": [
                    {"type": "ENTITY", "value": "role", "canonical": "role", "children": []}
                ]
            })
        );
    }

    #[test]
    fn test_from_dict_rejects_malformed() {
        let err = AstNode::from_dict(&serde_json::json!({"type": "VERB", "value": "x", "canonical": "x"}))
            .unwrap_err();
        assert!(matches!(err, Error::AstError(_)));

        let err = AstNode::from_dict(&serde_json::json!({"type": "ACTION"})).unwrap_err();
        assert!(matches!(err, Error::AstError(_)));
    }

    #[test]
    fn test_from_dict_missing_children_is_leaf() {
        let node = AstNode::from_dict(&serde_json::json!({
            "type": "VALUE", "value": "x", "canonical": "x"
        }))
        .unwrap();
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_canonical_ignores_child_order() {
        assert_eq!(
            build("create user alice").canonical_form(),
            build("create alice user").canonical_form()
        );
    }

    #[test]
    fn test_canonical_form_matches_value_canonicalization() {
        for text in ["create user \"quoted\" alice", "建立使用者 bob", "", "status ok"] {
            let ast = build(text);
            let direct = ast.canonical_form();
            let via_value = canonical::canonicalize_value(&ast.canonical_value(), &[]);
            assert_eq!(direct, via_value, "mismatch for {:?}", text);
        }
    }

    #[test]
    fn test_canonical_form_exact_bytes() {
        let form = build("add user").canonical_form();
        assert_eq!(
            form.as_str(),
            r#"{"canonical":"create","children":[{"canonical":"user","children":[],"type":"ENTITY"}],"type":"ACTION"}"#
        );
    }
}
