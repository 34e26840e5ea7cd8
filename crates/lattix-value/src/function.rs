//! Function values and the currying protocol.
//!
//! Every function takes exactly one argument. An n-ary function is a chain
//! of n stages: each stage checks its argument against its parameter type
//! and returns either the next stage or, at the last stage, the result.
//! One substitution is carried down each chain, so the stages of a
//! polymorphic function agree on what their shared variables stand for.

use std::fmt;
use std::sync::Arc;

use lattix_types::{CONTINUOUS, DISCRETE, Slot, Substitution, TypeRef};
use tracing::trace;

use crate::error::{Result, ValueError};
use crate::scratch::{ScratchContinuous, ScratchDiscrete};
use crate::value::Value;

pub trait Function: Send + Sync {
    fn ty(&self) -> TypeRef;

    fn apply(&self, arg: &Value) -> Result<Value>;
}

type Body = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

#[derive(Clone)]
pub struct FnValue(Arc<dyn Function>);

/// Reject `arg` unless `param` accepts its type under `subst`.
fn check_argument(param: &Slot, arg: &Value, subst: &mut Substitution) -> Result<()> {
    let found = arg.ty();
    if param.accepts_in(&found, subst) {
        Ok(())
    } else {
        Err(ValueError::ArgumentType {
            expected: subst.apply(&param.ty).to_string(),
            found: found.to_string(),
        })
    }
}

fn param_slot(ty: &TypeRef) -> Result<&Slot> {
    ty.as_function()
        .map(|ft| &ft.param)
        .ok_or_else(|| ValueError::shape("a function type", ty))
}

/// Number of nested `->` layers along the result chain of `ty`.
fn function_depth(ty: &TypeRef) -> usize {
    let mut depth = 0;
    let mut current = ty;
    while let Some(ft) = current.as_function() {
        depth += 1;
        current = &ft.result.ty;
    }
    depth
}

struct Unary<F> {
    ty: TypeRef,
    f: F,
}

impl<F> Function for Unary<F>
where
    F: Fn(&Value) -> Result<Value> + Send + Sync,
{
    fn ty(&self) -> TypeRef {
        self.ty.clone()
    }

    fn apply(&self, arg: &Value) -> Result<Value> {
        check_argument(param_slot(&self.ty)?, arg, &mut Substitution::new())?;
        (self.f)(arg)
    }
}

/// One stage of a curried function: the arguments seen so far and the
/// bindings they produced.
struct Stage {
    ty: TypeRef,
    remaining: usize,
    args: Vec<Value>,
    subst: Substitution,
    body: Arc<Body>,
}

impl Function for Stage {
    fn ty(&self) -> TypeRef {
        self.subst.apply(&self.ty)
    }

    fn apply(&self, arg: &Value) -> Result<Value> {
        let ft = self
            .ty
            .as_function()
            .ok_or_else(|| ValueError::shape("a function type", &self.ty))?;
        let mut subst = self.subst.clone();
        check_argument(&ft.param, arg, &mut subst)?;
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.extend_from_slice(&self.args);
        args.push(arg.clone());
        if self.remaining == 1 {
            return (self.body)(&args);
        }
        trace!(
            supplied = args.len(),
            remaining = self.remaining - 1,
            "curried stage"
        );
        Ok(FnValue::new(Stage {
            ty: ft.result.ty.clone(),
            remaining: self.remaining - 1,
            args,
            subst,
            body: Arc::clone(&self.body),
        })
        .into())
    }
}

impl FnValue {
    pub fn new<F: Function + 'static>(f: F) -> Self {
        FnValue(Arc::new(f))
    }

    /// A one-argument function of type `ty`.
    pub fn unary<F>(ty: TypeRef, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        FnValue::new(Unary { ty, f })
    }

    /// An `arity`-argument function of the nested type
    /// `p0 -> p1 -> ... -> result`. `body` runs once all arguments are in.
    pub fn curried<F>(ty: TypeRef, arity: usize, body: F) -> Result<Self>
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        if arity == 0 {
            return Err(ValueError::EmptyInput {
                operation: "curried function",
            });
        }
        if function_depth(&ty) < arity {
            return Err(ValueError::shape("a function type of matching arity", &ty));
        }
        Ok(Self::first_stage(ty, arity, body))
    }

    /// `curried` without the arity check, for types built with exactly
    /// `arity` layers.
    pub(crate) fn first_stage<F>(ty: TypeRef, arity: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        FnValue::new(Stage {
            ty,
            remaining: arity.max(1),
            args: Vec::new(),
            subst: Substitution::new(),
            body: Arc::new(body),
        })
    }

    pub fn ty(&self) -> TypeRef {
        self.0.ty()
    }

    pub fn apply(&self, arg: &Value) -> Result<Value> {
        self.0.apply(arg)
    }

    /// Apply `args` one at a time.
    pub fn apply_all(&self, args: &[Value]) -> Result<Value> {
        let mut current = Value::Function(self.clone());
        for arg in args {
            current = current.as_function()?.apply(arg)?;
        }
        Ok(current)
    }

    pub fn apply_double(&self, arg: &Value) -> Result<f64> {
        self.apply(arg)?.as_double()
    }

    pub fn apply_int(&self, arg: &Value) -> Result<i64> {
        self.apply(arg)?.as_int()
    }

    /// Evaluate a unary integer function over raw payloads, reusing one
    /// scratch cell for the arguments.
    pub fn apply_each_int(&self, xs: &[i64]) -> Result<Vec<i64>> {
        let param = param_slot(&self.ty())?.ty.clone();
        let cell_ty = if param.as_discrete().is_some() {
            param
        } else {
            DISCRETE.clone()
        };
        let mut cell = ScratchDiscrete::new(&cell_ty)?;
        xs.iter()
            .map(|&x| {
                cell.set(x);
                self.apply_int(&cell.snapshot()?)
            })
            .collect()
    }

    pub fn apply_each_double(&self, xs: &[f64]) -> Result<Vec<f64>> {
        let param = param_slot(&self.ty())?.ty.clone();
        let cell_ty = if param.as_continuous().is_some() {
            param
        } else {
            CONTINUOUS.clone()
        };
        let mut cell = ScratchContinuous::new(&cell_ty)?;
        xs.iter()
            .map(|&x| {
                cell.set(x);
                self.apply_double(&cell.snapshot()?)
            })
            .collect()
    }

    pub fn ptr_eq(&self, other: &FnValue) -> bool {
        self.addr() == other.addr()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for FnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnValue({})", self.ty())
    }
}

#[cfg(test)]
mod tests {
    use lattix_types::{ANY, Type};

    use super::*;
    use crate::status::Status;

    fn add3() -> FnValue {
        let ty = Type::curried(
            &[DISCRETE.clone(), DISCRETE.clone(), DISCRETE.clone()],
            DISCRETE.clone(),
        );
        FnValue::curried(ty, 3, |args| {
            let mut total = 0;
            for a in args {
                total += a.as_int()?;
            }
            Ok(Value::discrete(total))
        })
        .expect("three layers")
    }

    #[test]
    fn partial_application_yields_functions() {
        let f = add3();
        let g = f.apply(&Value::discrete(1)).expect("first");
        assert!(matches!(g, Value::Function(_)));
        let h = g.as_function().and_then(|g| g.apply(&Value::discrete(2))).expect("second");
        assert!(matches!(h, Value::Function(_)));
        let r = h.as_function().and_then(|h| h.apply(&Value::discrete(3))).expect("third");
        assert_eq!(r, Value::discrete(6));
        assert_eq!(f.apply_all(&[1, 2, 3].map(Value::discrete)), Ok(Value::discrete(6)));
    }

    #[test]
    fn stages_are_reusable() {
        let f = add3();
        let plus10 = f.apply_all(&[Value::discrete(4), Value::discrete(6)]).expect("partial");
        let plus10 = plus10.as_function().expect("function");
        assert_eq!(plus10.apply_int(&Value::discrete(1)), Ok(11));
        assert_eq!(plus10.apply_int(&Value::discrete(5)), Ok(15));
    }

    #[test]
    fn arguments_are_checked_per_stage() {
        let f = add3();
        let err = f.apply(&Value::str("one")).expect_err("string");
        assert!(matches!(err, ValueError::ArgumentType { .. }));
        assert!(matches!(
            f.apply_all(&[Value::discrete(1), Value::str("two")]),
            Err(ValueError::ArgumentType { .. })
        ));
        assert!(matches!(
            f.apply_all(&[1, 2, 3, 4].map(Value::discrete)),
            Err(ValueError::Shape { .. })
        ));
    }

    #[test]
    fn polymorphic_chain_shares_bindings() {
        let a = Type::variable();
        let pair = FnValue::curried(Type::curried(&[a.clone(), a.clone()], a), 2, |args| {
            Ok(args[1].clone())
        })
        .expect("two layers");
        let after_int = pair.apply(&Value::discrete(1)).expect("binds a");
        let after_int = after_int.as_function().expect("function");
        assert!(after_int.ty().to_string().starts_with("Discrete"));
        assert!(matches!(
            after_int.apply(&Value::str("x")),
            Err(ValueError::ArgumentType { .. })
        ));
        let after_str = pair.apply(&Value::str("x")).expect("independent chain");
        assert!(
            after_str
                .as_function()
                .and_then(|g| g.apply(&Value::str("y")))
                .is_ok()
        );
    }

    #[test]
    fn arity_must_fit_the_type() {
        let ty = Type::function(ANY.clone(), ANY.clone());
        assert!(FnValue::curried(ty.clone(), 2, |_| Ok(Value::Triv)).is_err());
        assert!(FnValue::curried(ty, 0, |_| Ok(Value::Triv)).is_err());
    }

    #[test]
    fn scratch_backed_bulk_application() {
        let small = Type::discrete(0, 9);
        let status_code = FnValue::unary(Type::function(small, DISCRETE.clone()), |x| {
            Ok(Value::discrete(i64::from(x.status() == Status::Invalid)))
        });
        assert_eq!(status_code.apply_each_int(&[3, 12, -1, 9]), Ok(vec![0, 1, 1, 0]));

        let half = FnValue::unary(Type::function(CONTINUOUS.clone(), CONTINUOUS.clone()), |x| {
            Ok(Value::continuous(x.as_double()? / 2.0))
        });
        assert_eq!(half.apply_each_double(&[1.0, 3.0]), Ok(vec![0.5, 1.5]));
        let err = half.apply_double(&Value::str("x")).expect_err("string");
        assert!(matches!(err, ValueError::ArgumentType { .. }));
    }
}
