//! Builtin function values over the core value kinds.
//!
//! Each constructor returns a fresh function value; polymorphic ones get
//! fresh type variables per call.

use lattix_types::{ANY, CONTINUOUS, DISCRETE, SCALAR, STRUCTURED, Type, TypeRef, VECTOR};

use crate::error::{Result, ValueError};
use crate::function::FnValue;
use crate::value::Value;
use crate::vector::Vector;

fn to_index(v: &Value) -> Result<usize> {
    let n = v.as_int()?;
    usize::try_from(n).map_err(|_| ValueError::shape("a non-negative index", n))
}

fn curried(params: &[TypeRef], result: TypeRef, body: fn(&[Value]) -> Result<Value>) -> FnValue {
    FnValue::first_stage(Type::curried(params, result), params.len(), body)
}

/// `a -> a`
pub fn identity() -> FnValue {
    let a = Type::variable();
    FnValue::unary(Type::function(a.clone(), a), |x| Ok(x.clone()))
}

/// Cyclic wrap as a function: `Scalar -> Scalar`.
pub fn in_range() -> FnValue {
    FnValue::unary(Type::function(SCALAR.clone(), SCALAR.clone()), |x| {
        x.wrap_to_range()
    })
}

/// `[Type] -> Discrete`
pub fn length() -> FnValue {
    FnValue::unary(Type::function(VECTOR.clone(), DISCRETE.clone()), |v| {
        Ok(Value::discrete(v.as_vector()?.len() as i64))
    })
}

/// `[a] -> Discrete -> a`
pub fn element() -> FnValue {
    let a = Type::variable();
    curried(&[Type::vector(a.clone()), DISCRETE.clone()], a, |args| {
        args[0].as_vector()?.element(to_index(&args[1])?)
    })
}

/// `Discrete -> (...) -> Type`
pub fn component() -> FnValue {
    curried(&[DISCRETE.clone(), STRUCTURED.clone()], ANY.clone(), |args| {
        args[1].as_tuple()?.component(to_index(&args[0])?).cloned()
    })
}

/// `(a -> b) -> [a] -> [b]`, lazily.
pub fn map() -> FnValue {
    let a = Type::variable();
    let b = Type::variable();
    curried(
        &[Type::function(a.clone(), b.clone()), Type::vector(a)],
        Type::vector(b),
        |args| {
            let f = args[0].as_function()?;
            Ok(args[1].as_vector()?.map(f).into())
        },
    )
}

/// `(b -> a -> b) -> b -> [a] -> b`
pub fn fold_left() -> FnValue {
    let a = Type::variable();
    let b = Type::variable();
    let step = Type::curried(&[b.clone(), a.clone()], b.clone());
    curried(&[step, b.clone(), Type::vector(a)], b, |args| {
        let f = args[0].as_function()?;
        let mut acc = args[1].clone();
        for x in args[2].as_vector()?.iter() {
            acc = f.apply_all(&[acc, x?])?;
        }
        Ok(acc)
    })
}

/// `[Type] -> [Continuous]`
pub fn weights() -> FnValue {
    FnValue::unary(
        Type::function(VECTOR.clone(), Type::vector(CONTINUOUS.clone())),
        |v| Ok(v.as_vector()?.weights()?.into()),
    )
}

/// `Discrete -> Discrete -> [a] -> [a]`, elements `lo..=hi`.
pub fn sub() -> FnValue {
    let a = Type::variable();
    curried(
        &[DISCRETE.clone(), DISCRETE.clone(), Type::vector(a.clone())],
        Type::vector(a),
        |args| {
            let lo = to_index(&args[0])?;
            let hi = to_index(&args[1])?;
            Ok(args[2].as_vector()?.sub(lo, hi)?.into())
        },
    )
}

/// `[[a]] -> [a]`
pub fn concat() -> FnValue {
    let a = Type::variable();
    FnValue::unary(
        Type::function(Type::vector(Type::vector(a.clone())), Type::vector(a)),
        |v| {
            let parts = v
                .as_vector()?
                .iter()
                .map(|part| part.and_then(|p| p.as_vector().cloned()))
                .collect::<Result<Vec<Vector>>>()?;
            Ok(Vector::concat(parts).into())
        },
    )
}
