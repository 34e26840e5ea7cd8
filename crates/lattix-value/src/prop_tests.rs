//! Property tests for values and vector views using proptest.
//!
//! Properties:
//!
//! 1. Scalar status is `Invalid` exactly when the payload is out of bounds
//! 2. Sub-range views re-index their backing vector
//! 3. Row/column selections read through to the selected cells, also when stacked
//! 4. Concatenation maps each global index to the right part and offset
//! 5. Cyclic wrap on values lands in bounds and keeps in-range values
//! 6. Curried application agrees with direct evaluation

use proptest::prelude::*;

use lattix_types::{DISCRETE, Type};

use crate::vector::Concat;
use crate::*;

fn arb_ints(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-1000i64..1000, 1..max_len)
}

/// A table of `rows` rows and three integer columns.
fn table(rows: &[i64]) -> Vector {
    Vector::zip(vec![
        Vector::ints(rows.to_vec()),
        Vector::ints(rows.iter().map(|x| x * 2).collect()),
        Vector::ints(rows.iter().map(|x| x - 7).collect()),
    ])
}

fn component_of(v: &Value, m: usize) -> Value {
    match v.as_tuple().and_then(|t| t.component(m).cloned()) {
        Ok(c) => c,
        Err(err) => panic!("expected a tuple with component {m}: {err}"),
    }
}

proptest! {
    #[test]
    fn scalar_status_tracks_bounds(lwb in -100i64..100, span in 0i64..50, x in -200i64..200) {
        let ty = Type::discrete(lwb, lwb + span);
        let d = Discrete::typed(&ty, x).expect("discrete type");
        let inside = lwb <= x && x <= lwb + span;
        prop_assert_eq!(d.status(), if inside { Status::Proper } else { Status::Invalid });

        let cty = Type::continuous(lwb as f64, (lwb + span) as f64);
        let c = Continuous::typed(&cty, x as f64 / 2.0).expect("continuous type");
        let cinside = (lwb as f64) <= x as f64 / 2.0 && x as f64 / 2.0 <= (lwb + span) as f64;
        prop_assert_eq!(c.status(), if cinside { Status::Proper } else { Status::Invalid });
    }

    #[test]
    fn sub_view_is_transparent(xs in arb_ints(40), a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
        let (i, j) = {
            let (p, q) = (a.index(xs.len()), b.index(xs.len()));
            (p.min(q), p.max(q))
        };
        let s = Vector::ints(xs.clone());
        let view = s.sub(i, j).expect("valid range");
        prop_assert_eq!(view.len(), j - i + 1);
        for k in 0..view.len() {
            prop_assert_eq!(view.element(k), s.element(i + k));
        }
    }

    #[test]
    fn selection_reads_selected_cells(
        xs in arb_ints(30),
        rows in prop::collection::vec(any::<prop::sample::Index>(), 0..20),
        cols in prop::collection::vec(0usize..3, 1..4),
    ) {
        let t = table(&xs);
        let rows: Vec<usize> = rows.iter().map(|r| r.index(xs.len())).collect();
        let view = t.select(Some(rows.clone()), Some(cols.clone())).expect("valid indices");
        prop_assert_eq!(view.len(), rows.len());
        for (k, &r) in rows.iter().enumerate() {
            let got = view.element(k).expect("row");
            let want = t.element(r).expect("row");
            for (m, &c) in cols.iter().enumerate() {
                prop_assert_eq!(component_of(&got, m), component_of(&want, c));
            }
        }
    }

    #[test]
    fn stacked_selections_collapse(
        xs in arb_ints(30),
        outer in prop::collection::vec(any::<prop::sample::Index>(), 1..20),
        inner in prop::collection::vec(any::<prop::sample::Index>(), 0..20),
    ) {
        let t = table(&xs);
        let outer: Vec<usize> = outer.iter().map(|r| r.index(xs.len())).collect();
        let inner: Vec<usize> = inner.iter().map(|r| r.index(outer.len())).collect();
        let once = t.select(Some(outer.clone()), Some(vec![2, 0])).expect("valid");
        let twice = once.select(Some(inner.clone()), Some(vec![1])).expect("valid");
        let sel = twice.as_selection().expect("selection");
        prop_assert!(sel.backing().as_selection().is_none());
        for (k, &r) in inner.iter().enumerate() {
            let got = twice.element(k).expect("row");
            let want = t.element(outer[r]).expect("row");
            prop_assert_eq!(component_of(&got, 0), component_of(&want, 0));
        }
    }

    #[test]
    fn concat_maps_indices(lens in prop::collection::vec(0usize..6, 0..6)) {
        let mut next = 0i64;
        let parts: Vec<Vector> = lens
            .iter()
            .map(|&n| {
                let part: Vec<i64> = (next..next + n as i64).collect();
                next += n as i64;
                Vector::ints(part)
            })
            .collect();
        let c = Concat::new(parts);
        prop_assert_eq!(c.len(), lens.iter().sum::<usize>());
        for i in 0..c.len() {
            let (part, local) = c.locate(i).expect("in range");
            prop_assert!(local < lens[part]);
            prop_assert_eq!(lens[..part].iter().sum::<usize>() + local, i);
            prop_assert_eq!(c.int_at(i), Ok(i as i64));
        }
        prop_assert!(c.locate(c.len()).is_err());
    }

    #[test]
    fn wrapped_values_are_proper(lwb in -50i64..50, span in 0i64..20, x in -500i64..500) {
        let ty = Type::cyclic_discrete(lwb, lwb + span);
        let d = Discrete::typed(&ty, x).expect("discrete type");
        let w = d.wrap_to_range();
        prop_assert_eq!(w.status(), Status::Proper);
        if d.status() == Status::Proper {
            prop_assert_eq!(w.get(), x);
        }
    }

    #[test]
    fn currying_agrees_with_direct_call(args in prop::collection::vec(-1000i64..1000, 1..6)) {
        let n = args.len();
        let params = vec![DISCRETE.clone(); n];
        let f = FnValue::curried(Type::curried(&params, DISCRETE.clone()), n, |xs| {
            let mut acc = 0i64;
            for (i, x) in xs.iter().enumerate() {
                acc = acc * 31 + x.as_int()? * (i as i64 + 1);
            }
            Ok(Value::discrete(acc))
        })
        .expect("n layers");
        let direct = args
            .iter()
            .enumerate()
            .fold(0i64, |acc, (i, x)| acc * 31 + x * (i as i64 + 1));

        let mut current = Value::Function(f);
        for (k, x) in args.iter().enumerate() {
            current = current
                .as_function()
                .expect("still a function")
                .apply(&Value::discrete(*x))
                .expect("accepted");
            if k + 1 < n {
                prop_assert!(matches!(current, Value::Function(_)));
            }
        }
        prop_assert_eq!(current, Value::discrete(direct));
    }
}
