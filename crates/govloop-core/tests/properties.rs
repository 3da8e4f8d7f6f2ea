//! Property tests for the semantic pipeline and the cost evaluator

use govloop_core::{
    canonicalize_value, recanonicalize, AstBuilder, AstNode, CostEvaluator, CycleBenefit,
    CycleCost, SemanticHasher, Trend, AUTO,
};
use proptest::prelude::*;
use serde_json::Value;

fn arb_phrase() -> impl Strategy<Value = String> {
    let words = prop::sample::select(vec![
        "create", "delete", "update", "user", "role", "policy", "創建", "用戶", "刪除",
        "alice", "ops@example.com", "gl.core", "v2", "the", "42", "張三",
    ]);
    prop::collection::vec(words, 0..8).prop_map(|w| w.join(" "))
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::from(n)),
        "[a-z用戶 \"\\\\]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn hash_format_holds_for_any_string(s in any::<String>()) {
        let h = SemanticHasher::default().hash_text(&s, AUTO);
        let prefixed = h.prefixed();
        prop_assert!(prefixed.starts_with("sha256:"));
        prop_assert_eq!(prefixed.len(), 71);
        prop_assert!(h.hex().bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn case_and_whitespace_invariance(phrase in arb_phrase(), pad in "[ \t\n]{1,3}") {
        let hasher = SemanticHasher::default();
        let spaced = phrase.split(' ').collect::<Vec<_>>().join(&pad);
        prop_assert_eq!(hasher.hash_text(&phrase, AUTO), hasher.hash_text(&phrase.to_uppercase(), AUTO));
        prop_assert_eq!(hasher.hash_text(&phrase, AUTO), hasher.hash_text(&spaced, AUTO));
    }

    #[test]
    fn ast_dict_roundtrip(phrase in arb_phrase()) {
        let hasher = SemanticHasher::default();
        let ast = AstBuilder::build(&hasher.tokenizer().tokenize(&phrase, AUTO));
        let restored = AstNode::from_dict(&ast.to_dict()).unwrap();
        prop_assert_eq!(restored.children.len(), ast.children.len());
        prop_assert_eq!(&restored.canonical, &ast.canonical);
        prop_assert_eq!(restored.semantic_hash(), ast.semantic_hash());
    }

    #[test]
    fn canonicalization_is_idempotent(value in arb_json()) {
        let once = canonicalize_value(&value, &[]);
        let twice = recanonicalize(once.as_str()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn confidence_bounded_and_monotone(costs in prop::collection::vec(0.0f64..1000.0, 1..20)) {
        let mut evaluator = CostEvaluator::new();
        let mut prev = 0.0;
        for (i, c) in costs.iter().enumerate() {
            let id = format!("c{}", i);
            let snap = evaluator.record_cycle(
                CycleCost::new(&id).with_compute_cost(*c),
                CycleBenefit::new(&id).with_problems_resolved(1),
            );
            prop_assert!(snap.confidence <= 0.99);
            prop_assert!(snap.confidence >= prev);
            prop_assert!(snap.roi.is_finite() && snap.marginal_roi.is_finite());
            prev = snap.confidence;
        }
        prop_assert_eq!(evaluator.history()[0].trend, Trend::InsufficientData);
    }
}
