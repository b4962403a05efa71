//! Semantics Preservation Tests
//!
//! Every optimization must leave match results unchanged. Random pattern
//! trees are compiled once with all optimizations disabled and once with all
//! of them enabled, and both programs must report the same leftmost match
//! and the same captures on every input.

use integration_tests::pattern::{alt, group, literal, plus, seq, star};
use integration_tests::{compile_optimized, compile_plain, MatchError, Matcher, Node};
use proptest::prelude::*;
use regex_bytecode::{BoundaryKind, CharClass, CharRange, CompareTypeAndValuePair};

const STEP_LIMIT: usize = 20_000;

/// Compare both compilations of `node` on `inputs`; inputs that exhaust
/// the step limit on either side are skipped.
fn assert_same_matches(node: &Node, inputs: &[String]) -> Result<(), TestCaseError> {
    let plain = compile_plain(node).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let (optimized, _) = compile_optimized(node).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert!(optimized.validate().is_ok());

    let plain = Matcher::new(&plain)
        .map_err(|e| TestCaseError::fail(e.to_string()))?
        .with_step_limit(STEP_LIMIT);
    let optimized = Matcher::new(&optimized)
        .map_err(|e| TestCaseError::fail(e.to_string()))?
        .with_step_limit(STEP_LIMIT);

    for input in inputs {
        match (plain.find(input), optimized.find(input)) {
            (Err(MatchError::StepLimitExceeded { .. }), _)
            | (_, Err(MatchError::StepLimitExceeded { .. })) => continue,
            (expected, actual) => {
                prop_assert_eq!(expected, actual, "pattern {:?} input {:?}", node, input)
            }
        }
    }
    Ok(())
}

fn class_pair() -> impl Strategy<Value = CompareTypeAndValuePair> {
    prop_oneof![
        4 => prop::char::range('a', 'd').prop_map(|c| CompareTypeAndValuePair::Char(u32::from(c))),
        2 => (prop::char::range('a', 'd'), prop::char::range('a', 'd')).prop_map(|(a, b)| {
            CompareTypeAndValuePair::CharRange(CharRange::new(
                u32::from(a.min(b)),
                u32::from(a.max(b)),
            ))
        }),
        1 => Just(CompareTypeAndValuePair::Inverse),
        1 => Just(CompareTypeAndValuePair::TemporaryInverse),
        1 => Just(CompareTypeAndValuePair::CharClass(CharClass::Xdigit)),
    ]
}

/// Nodes that always consume at least one character
fn atom() -> impl Strategy<Value = Node> {
    prop_oneof![
        3 => "[abc]{1,2}".prop_map(Node::Literal),
        2 => prop::collection::vec(class_pair(), 1..4).prop_map(Node::Class),
    ]
}

fn repeated_body() -> impl Strategy<Value = Node> {
    prop_oneof![
        3 => atom(),
        1 => prop::collection::vec(atom(), 2..3).prop_map(Node::Sequence),
        1 => atom().prop_map(|body| Node::Group(Box::new(body))),
    ]
}

fn node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        8 => atom(),
        1 => Just(Node::Begin),
        1 => Just(Node::End),
        1 => Just(Node::Boundary(BoundaryKind::Word)),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            3 => prop::collection::vec(inner.clone(), 1..4).prop_map(Node::Sequence),
            2 => prop::collection::vec(inner.clone(), 2..4).prop_map(Node::Alternation),
            2 => (repeated_body(), any::<bool>()).prop_map(|(body, greedy)| Node::Star {
                body: Box::new(body),
                greedy,
            }),
            2 => (repeated_body(), any::<bool>()).prop_map(|(body, greedy)| Node::Plus {
                body: Box::new(body),
                greedy,
            }),
            1 => (inner.clone(), any::<bool>()).prop_map(|(body, greedy)| Node::Optional {
                body: Box::new(body),
                greedy,
            }),
            1 => (repeated_body(), 0usize..3, prop::option::of(0usize..3), any::<bool>()).prop_map(
                |(body, min, extra, greedy)| Node::Counted {
                    body: Box::new(body),
                    min,
                    max: extra.map(|extra| min + extra),
                    greedy,
                }
            ),
            1 => inner.clone().prop_map(|body| Node::Group(Box::new(body))),
            1 => inner.prop_map(|body| Node::LookAhead(Box::new(body))),
        ]
    })
}

fn inputs() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[abcd ]{0,7}", 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_optimized_program_matches_like_plain_program(pattern in node(), inputs in inputs()) {
        assert_same_matches(&pattern, &inputs)?;
    }

    #[test]
    fn test_loop_before_random_follower(
        body in repeated_body(),
        follower in node(),
        greedy in any::<bool>(),
        inputs in inputs(),
    ) {
        let pattern = seq(vec![
            Node::Star { body: Box::new(body), greedy },
            follower,
        ]);
        assert_same_matches(&pattern, &inputs)?;
    }

    #[test]
    fn test_optimizing_preserves_length(pattern in node()) {
        let optimizer = regex_optimizer::Optimizer::new();
        let mut bytecode = pattern.compile(&optimizer).unwrap();
        let len = bytecode.len();
        optimizer.optimize(&mut bytecode).unwrap();
        prop_assert_eq!(bytecode.len(), len);
    }
}

/// Hand-picked patterns around the rewrite's decision points
#[test]
fn test_known_patterns() {
    let inputs: Vec<String> = [
        "", "a", "b", "ab", "aab", "aaa", "abab", "ba", "a b", "abcabc", "cab", "dcba",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let patterns = vec![
        seq(vec![star(literal("a")), literal("b")]),
        seq(vec![star(literal("a")), literal("a")]),
        seq(vec![plus(literal("a")), literal("b")]),
        seq(vec![star(literal("ab")), literal("a")]),
        seq(vec![star(literal("ab")), literal("c")]),
        seq(vec![star(alt(vec![literal("a"), literal("b")])), literal("c")]),
        seq(vec![plus(group(literal("a"))), Node::BackReference(1)]),
        seq(vec![group(plus(literal("a"))), Node::BackReference(1)]),
        seq(vec![star(literal("a")), Node::End]),
        seq(vec![star(literal("a")), Node::Begin]),
        seq(vec![plus(literal("a")), Node::Boundary(BoundaryKind::NonWord)]),
        alt(vec![
            seq(vec![literal("ab"), star(literal("c"))]),
            seq(vec![literal("ab"), literal("d")]),
        ]),
        alt(vec![literal("a"), Node::Sequence(vec![]), literal("b"), Node::Sequence(vec![])]),
        seq(vec![
            star(Node::Class(vec![
                CompareTypeAndValuePair::Inverse,
                CompareTypeAndValuePair::Char('a' as u32),
            ])),
            literal("a"),
        ]),
        seq(vec![
            star(literal("b")),
            Node::LookAhead(Box::new(literal("a"))),
        ]),
        Node::Counted {
            body: Box::new(literal("a")),
            min: 2,
            max: Some(3),
            greedy: true,
        },
    ];

    for pattern in &patterns {
        if let Err(error) = assert_same_matches(pattern, &inputs) {
            panic!("{}", error);
        }
    }
}
