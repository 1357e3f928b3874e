//! Property-based tests over generated queries: NNF closure under double
//! negation, size-linear negation, and the `QueryValue` lattice laws.
//! Bounded-depth generators keep shrinking fast while still exercising
//! every connective/modality.

use ldl_monitor::query::{join, meet, AttrValue, Fact, GroundFact, Path, Proposition, Query, QueryValue};
use proptest::prelude::*;

fn ground_fact() -> impl Strategy<Value = GroundFact> {
    prop_oneof![Just("A".to_string()), Just("B".to_string()), Just("C".to_string())]
        .prop_map(|name| GroundFact::new(name.clone(), vec![AttrValue::Str(name)]))
}

fn fact() -> impl Strategy<Value = Fact> {
    prop_oneof![
        ground_fact().prop_map(Fact::Pos),
        ground_fact().prop_map(Fact::Neg),
    ]
}

fn proposition(depth: u32) -> BoxedStrategy<Proposition> {
    let leaf = prop_oneof![
        Just(Proposition::True),
        Just(Proposition::False),
        fact().prop_map(Proposition::Assert),
    ];
    if depth == 0 {
        leaf.boxed()
    } else {
        let recurse = proposition(depth - 1);
        prop_oneof![
            leaf,
            (recurse.clone(), proposition(depth - 1))
                .prop_map(|(a, b)| Proposition::and(vec![a, b])),
            (recurse, proposition(depth - 1)).prop_map(|(a, b)| Proposition::or(vec![a, b])),
        ]
        .boxed()
    }
}

fn path(depth: u32) -> BoxedStrategy<Path> {
    let assert = proposition(1).prop_map(Path::assert);
    if depth == 0 {
        assert.boxed()
    } else {
        prop_oneof![
            assert,
            query(depth - 1).prop_map(Path::test),
            (path(depth - 1), path(depth - 1)).prop_map(|(a, b)| Path::choice(vec![a, b])),
            (path(depth - 1), path(depth - 1)).prop_map(|(a, b)| Path::sequence(vec![a, b])),
            path(depth - 1).prop_map(Path::repeat),
        ]
        .boxed()
    }
}

fn query(depth: u32) -> BoxedStrategy<Query> {
    let leaf = prop_oneof![
        Just(Query::TT),
        Just(Query::FF),
        proposition(1).prop_map(Query::formula),
    ];
    if depth == 0 {
        leaf.boxed()
    } else {
        prop_oneof![
            leaf,
            (query(depth - 1), query(depth - 1)).prop_map(|(a, b)| Query::and(vec![a, b])),
            (query(depth - 1), query(depth - 1)).prop_map(|(a, b)| Query::or(vec![a, b])),
            (path(depth - 1), query(depth - 1)).prop_map(|(p, q)| Query::exists(p, q)),
            (path(depth - 1), query(depth - 1)).prop_map(|(p, q)| Query::all(p, q)),
        ]
        .boxed()
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

    /// NNF closure — `not(not(q)) == q` up to the ordering smart
    /// constructors already normalize deterministically.
    #[test]
    fn not_not_is_identity(q in query(3)) {
        prop_assert_eq!(q.not().not(), q);
    }

    /// Size-linear negation — `size(not(q)) <= c * size(q)` for a small
    /// constant; `not` only swaps connective kinds and re-wraps facts, so
    /// it never more than doubles structural size.
    #[test]
    fn negation_is_size_linear(q in query(3)) {
        let negated = q.not();
        prop_assert!(negated.size() <= 4 * q.size().max(1));
    }

    /// NNF closure, propositional half — same closure for `Proposition`.
    #[test]
    fn proposition_not_not_is_identity(p in proposition(3)) {
        prop_assert_eq!(p.not().not(), p);
    }

    #[test]
    fn proposition_negation_is_size_linear(p in proposition(3)) {
        let negated = p.not();
        prop_assert!(negated.size() <= 4 * p.size().max(1));
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    /// `meet`/`join` are commutative and idempotent on `Stable` values,
    /// and `complement` is involutive on both variants.
    #[test]
    fn meet_join_commute_on_stable(a in any::<bool>(), b in any::<bool>()) {
        let (sa, sb) = (QueryValue::Stable(a), QueryValue::Stable(b));
        prop_assert_eq!(meet(sa.clone(), sb.clone()), meet(sb.clone(), sa.clone()));
        prop_assert_eq!(join(sa, sb), join(QueryValue::Stable(b), QueryValue::Stable(a)));
    }

    #[test]
    fn meet_is_idempotent_on_stable(a in any::<bool>()) {
        let s = QueryValue::Stable(a);
        prop_assert_eq!(meet(s.clone(), s.clone()), s.clone());
        prop_assert_eq!(join(s.clone(), s.clone()), s);
    }

    #[test]
    fn complement_is_involutive(q in query(2)) {
        let v = QueryValue::Unstable(q);
        prop_assert_eq!(v.complement().complement(), v);
    }
}
