//! Property tests for the subtype checker using proptest.
//!
//! Properties:
//!
//! 1. Reflexivity: every ground type accepts a structural copy of itself
//! 2. An unbound pattern variable accepts anything and records a compatible binding
//! 3. Re-checking the same variable against the same type keeps the binding
//! 4. An unbound candidate variable is bound to the pattern
//! 5. Nested scalar intervals are accepted, wider ones rejected
//! 6. Cyclic wrap always lands inside the bounds and fixes in-range values

use std::sync::Arc;

use proptest::prelude::*;

use crate::persist::describe;
use crate::*;

// ---------------------------------------------------------------------------
// Strategies for generating types
// ---------------------------------------------------------------------------

const LABEL_POOL: &[&str] = &["x", "y", "z", "count", "rate", "id"];

fn arb_flag() -> impl Strategy<Value = Option<bool>> {
    prop_oneof![Just(None), Just(Some(true)), Just(Some(false))]
}

fn arb_discrete() -> impl Strategy<Value = TypeRef> {
    prop_oneof![
        (-50i64..50, 0i64..50, arb_flag(), arb_flag()).prop_map(|(lwb, span, cyclic, ordered)| {
            Arc::new(Type::Discrete(DiscreteType {
                cyclic,
                ordered,
                ..DiscreteType::new(lwb, lwb + span)
            }))
        }),
        prop::collection::vec(
            prop::option::of(prop::sample::select(&["a", "c", "g", "t"][..])),
            1..5
        )
        .prop_map(|names| {
            Arc::new(Type::Discrete(DiscreteType::symbolic_partial(
                names.into_iter().map(|n| n.map(str::to_string)).collect(),
            )))
        }),
    ]
}

fn arb_continuous() -> impl Strategy<Value = TypeRef> {
    (-100i32..100, 1i32..100, arb_flag()).prop_map(|(lwb, span, cyclic)| {
        Arc::new(Type::Continuous(ContinuousType {
            cyclic,
            ..ContinuousType::new(f64::from(lwb) / 4.0, f64::from(lwb + span) / 4.0)
        }))
    })
}

fn arb_ground_leaf() -> BoxedStrategy<TypeRef> {
    prop_oneof![
        Just(TRIV.clone()),
        Just(STRING.clone()),
        Just(DISCRETE.clone()),
        Just(BOOLEAN.clone()),
        Just(Type::object("Shape")),
        arb_discrete(),
        arb_continuous(),
    ]
    .boxed()
}

fn arb_ground_type(depth: u32) -> BoxedStrategy<TypeRef> {
    if depth == 0 {
        return arb_ground_leaf();
    }
    let inner = arb_ground_type(depth - 1);
    prop_oneof![
        3 => arb_ground_leaf(),
        1 => inner.clone().prop_map(Type::vector),
        1 => (inner.clone(), inner.clone()).prop_map(|(p, r)| Type::function(p, r)),
        1 => prop::collection::vec(inner.clone(), 0..4).prop_map(Type::structured),
        1 => prop::collection::vec((prop::sample::select(LABEL_POOL), inner.clone()), 1..3)
            .prop_map(Type::labeled),
        1 => prop::collection::vec(inner.clone(), 1..3).prop_map(Type::union),
        1 => (inner.clone(), inner).prop_map(|(d, p)| {
            Type::model(d, p, TRIV.clone(), VECTOR.clone())
        }),
    ]
    .boxed()
}

fn deep_copy(ty: &TypeRef) -> TypeRef {
    match describe(ty).resolve() {
        Ok(copy) => copy,
        Err(err) => panic!("ground types always resolve: {err}"),
    }
}

proptest! {
    #[test]
    fn ground_types_accept_structural_copies(ty in arb_ground_type(3)) {
        let copy = deep_copy(&ty);
        prop_assert!(has_member(&ty, &copy), "{} rejected its copy", ty);
        prop_assert!(has_member(&ty, &ty));
    }

    #[test]
    fn unbound_variable_is_top(ty in arb_ground_type(2)) {
        let v = TypeVarId::fresh();
        let var = Arc::new(Type::Variable(v));
        let mut subst = Substitution::new();
        prop_assert!(is_member(&var, &ty, &mut subst));
        let bound = subst.lookup(v).cloned();
        prop_assert!(bound.is_some());
        prop_assert!(bound.is_some_and(|b| has_member(&b, &ty)));
    }

    #[test]
    fn repeated_binding_is_idempotent(ty in arb_ground_type(2)) {
        let v = TypeVarId::fresh();
        let var = Arc::new(Type::Variable(v));
        let mut subst = Substitution::new();
        prop_assert!(is_member(&var, &ty, &mut subst));
        let first = subst.clone();
        prop_assert!(is_member(&var, &ty, &mut subst));
        prop_assert_eq!(first, subst);
    }

    #[test]
    fn candidate_variable_takes_pattern(ty in arb_ground_type(2)) {
        let v = TypeVarId::fresh();
        let var = Arc::new(Type::Variable(v));
        let mut subst = Substitution::new();
        prop_assert!(is_member(&ty, &var, &mut subst));
        prop_assert!(subst.lookup(v).is_some_and(|b| Arc::ptr_eq(b, &ty)));
    }

    #[test]
    fn nested_intervals(lwb in -1000i64..1000, a in 0i64..100, b in 0i64..100, c in 0i64..100) {
        let outer = Type::discrete(lwb, lwb + a + b + c);
        let inner = Type::discrete(lwb + a, lwb + a + b);
        prop_assert!(has_member(&outer, &inner));
        prop_assert!(has_member(&SCALAR, &inner));
        if a + c > 0 {
            prop_assert!(!has_member(&inner, &outer));
        }
    }

    #[test]
    fn discrete_wrap_lands_in_range(lwb in -100i64..100, span in 0i64..50, x in -1000i64..1000) {
        let d = DiscreteType::new(lwb, lwb + span).with_cyclic(true);
        let w = d.wrap(x);
        prop_assert!(d.contains(w));
        prop_assert_eq!((w - x).rem_euclid(span + 1), 0);
        if d.contains(x) {
            prop_assert_eq!(w, x);
        }
    }

    #[test]
    fn continuous_wrap_lands_in_range(lwb in -100i32..100, span in 1i32..50, x in -1.0e4f64..1.0e4) {
        let c = ContinuousType::new(f64::from(lwb), f64::from(lwb + span)).with_cyclic(true);
        let w = c.wrap(x);
        prop_assert!(c.contains(w), "{} wrapped to {}", x, w);
        if c.contains(x) {
            prop_assert_eq!(w, x);
        }
    }
}
