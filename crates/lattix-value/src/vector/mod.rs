//! Homogeneous sequences and the views composed over them.
//!
//! A [`Vector`] is a shared handle to something implementing [`Sequence`].
//! Storage types own their data; view types hold a handle to a backing
//! vector plus their transformation parameters and never copy or mutate
//! what they wrap, so one backing vector may sit under any number of views.

mod concat;
mod dense;
mod fill;
mod map;
mod select;
mod view;
mod weight;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use lattix_types::{ANY, CONTINUOUS, DISCRETE, Type, TypeRef};

use crate::error::{Result, ValueError, check_index};
use crate::function::FnValue;
use crate::value::Value;

pub use concat::Concat;
pub use dense::{ContinuousVector, DenseVector, DiscreteVector, EmptyVector};
pub use fill::{ConstantVector, IotaVector};
pub use map::LazyMap;
pub use select::Selection;
pub use view::{ColumnView, SubVector, ZipVector};
pub use weight::{WeightMode, Weighted};

/// The sequence contract.
///
/// `int_at`/`double_at` are fast paths and must agree with `element` when
/// overridden.
pub trait Sequence: Send + Sync {
    /// The full vector type, not the element type.
    fn ty(&self) -> TypeRef;

    fn len(&self) -> usize;

    fn element(&self, idx: usize) -> Result<Value>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn int_at(&self, idx: usize) -> Result<i64> {
        self.element(idx)?.as_int()
    }

    fn double_at(&self, idx: usize) -> Result<f64> {
        self.element(idx)?.as_double()
    }

    /// Fractional membership of element `idx`.
    fn weight(&self, idx: usize) -> Result<f64> {
        check_index(idx, self.len())?;
        Ok(1.0)
    }

    /// A cheaper column projection, if this sequence has one.
    fn column(&self, _col: usize) -> Option<Result<Vector>> {
        None
    }

    fn as_selection(&self) -> Option<&Selection> {
        None
    }
}

/// Shared handle to a sequence.
#[derive(Clone)]
pub struct Vector(Arc<dyn Sequence>);

impl Vector {
    pub fn new<S: Sequence + 'static>(seq: S) -> Self {
        Vector(Arc::new(seq))
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Vector::new(DenseVector::new(values))
    }

    pub fn ints(xs: Vec<i64>) -> Self {
        Vector::new(DiscreteVector::untyped(xs))
    }

    pub fn doubles(xs: Vec<f64>) -> Self {
        Vector::new(ContinuousVector::untyped(xs))
    }

    pub fn empty(elt: TypeRef) -> Self {
        Vector::new(EmptyVector::new(elt))
    }

    pub fn ty(&self) -> TypeRef {
        self.0.ty()
    }

    pub fn elt_type(&self) -> TypeRef {
        elt_of(&self.0.ty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn element(&self, idx: usize) -> Result<Value> {
        self.0.element(idx)
    }

    pub fn int_at(&self, idx: usize) -> Result<i64> {
        self.0.int_at(idx)
    }

    pub fn double_at(&self, idx: usize) -> Result<f64> {
        self.0.double_at(idx)
    }

    pub fn weight(&self, idx: usize) -> Result<f64> {
        self.0.weight(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Value>> + '_ {
        (0..self.len()).map(|i| self.element(i))
    }

    pub fn to_values(&self) -> Result<Vec<Value>> {
        self.iter().collect()
    }

    /// The weight of every element, as a continuous vector.
    pub fn weights(&self) -> Result<Vector> {
        let ws = (0..self.len())
            .map(|i| self.weight(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Vector::doubles(ws))
    }

    /// View of elements `lo..=hi`.
    pub fn sub(&self, lo: usize, hi: usize) -> Result<Vector> {
        SubVector::new(self.clone(), lo, hi).map(Vector::new)
    }

    /// The first `n` elements, or the whole vector if it is shorter.
    pub fn prefix(&self, n: usize) -> Result<Vector> {
        if n >= self.len() {
            Ok(self.clone())
        } else if n == 0 {
            Ok(Vector::empty(self.elt_type()))
        } else {
            self.sub(0, n - 1)
        }
    }

    /// Component `col` of every tuple element.
    pub fn column(&self, col: usize) -> Result<Vector> {
        if let Some(fast) = self.0.column(col) {
            return fast;
        }
        ColumnView::new(self.clone(), col).map(Vector::new)
    }

    /// Reorder or subset rows and, independently, tuple components.
    /// `None` keeps every row (or component) in order.
    pub fn select(&self, rows: Option<Vec<usize>>, cols: Option<Vec<usize>>) -> Result<Vector> {
        Selection::over(self, rows, cols)
    }

    /// Replace every element's weight.
    pub fn weighted(&self, weights: Vec<f64>) -> Result<Vector> {
        Weighted::new(self.clone(), weights, WeightMode::Override).map(Vector::new)
    }

    /// Scale every element's weight.
    pub fn multiply_weights(&self, weights: Vec<f64>) -> Result<Vector> {
        Weighted::new(self.clone(), weights, WeightMode::Multiply).map(Vector::new)
    }

    /// Scale weights, then keep only the rows whose weight is positive.
    pub fn non_zero_weighted(&self, weights: Vec<f64>) -> Result<Vector> {
        let weighted = self.multiply_weights(weights)?;
        let mut keep = Vec::new();
        for i in 0..weighted.len() {
            if weighted.weight(i)? > 0.0 {
                keep.push(i);
            }
        }
        weighted.select(Some(keep), None)
    }

    /// Lazily apply `f` to each element.
    pub fn map(&self, f: &FnValue) -> Vector {
        Vector::new(LazyMap::new(self.clone(), f.clone()))
    }

    pub fn concat(parts: Vec<Vector>) -> Vector {
        Vector::new(Concat::new(parts))
    }

    /// Rows are tuples of the columns' elements.
    pub fn zip(columns: Vec<Vector>) -> Vector {
        Vector::new(ZipVector::new(columns))
    }

    pub fn zip_labeled<S: Into<String>>(columns: Vec<(S, Vector)>) -> Vector {
        Vector::new(ZipVector::labeled(columns))
    }

    pub fn as_selection(&self) -> Option<&Selection> {
        self.0.as_selection()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

/// Element type of a vector type, or `ANY` if `ty` is not one.
pub(crate) fn elt_of(ty: &TypeRef) -> TypeRef {
    ty.as_vector()
        .map(|v| v.elt.ty.clone())
        .unwrap_or_else(|| ANY.clone())
}

/// The element type shared by `types`, or `ANY` when they differ.
pub(crate) fn common_type<'a>(mut types: impl Iterator<Item = &'a TypeRef>) -> TypeRef {
    let Some(first) = types.next() else {
        return ANY.clone();
    };
    if types.all(|t| Arc::ptr_eq(t, first) || **t == **first) {
        first.clone()
    } else {
        ANY.clone()
    }
}

pub(crate) fn expect_discrete(elt: &TypeRef) -> Result<()> {
    if elt.as_discrete().is_some() {
        Ok(())
    } else {
        Err(ValueError::TypeMismatch {
            expected: DISCRETE.to_string(),
            found: elt.to_string(),
        })
    }
}

pub(crate) fn expect_continuous(elt: &TypeRef) -> Result<()> {
    if elt.as_continuous().is_some() {
        Ok(())
    } else {
        Err(ValueError::TypeMismatch {
            expected: CONTINUOUS.to_string(),
            found: elt.to_string(),
        })
    }
}

pub(crate) fn vector_of(elt: TypeRef) -> TypeRef {
    Type::vector(elt)
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        if self.addr() == other.addr() {
            return true;
        }
        self.len() == other.len()
            && (0..self.len()).all(|i| match (self.element(i), other.element(i)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            })
    }
}

impl Eq for Vector {}

impl Hash for Vector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for v in self.iter().flatten() {
            v.hash(state);
        }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match v {
                Ok(v) => write!(f, "{v}")?,
                Err(_) => write!(f, "?")?,
            }
        }
        write!(f, "]")
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_default_to_one_and_compose() {
        let v = Vector::ints(vec![1, 2, 3, 4]);
        assert_eq!(v.weight(2), Ok(1.0));
        assert!(v.weight(4).is_err());

        let w = v.weighted(vec![0.5, 0.0, 2.0, 1.0]).expect("lengths match");
        let m = w.multiply_weights(vec![2.0, 2.0, 2.0, -1.0]).expect("lengths match");
        assert_eq!(m.weights().expect("weights").to_string(), "[1.0,0.0,4.0,-1.0]");
        assert_eq!(m.element(2), Ok(Value::discrete(3)));

        let err = v.weighted(vec![1.0]).expect_err("too short");
        assert_eq!(err, ValueError::LengthMismatch { expected: 4, found: 1 });
    }

    #[test]
    fn non_zero_weighting_drops_rows() {
        let v = Vector::ints(vec![10, 20, 30, 40]);
        let nz = v.non_zero_weighted(vec![1.0, 0.0, 0.5, -2.0]).expect("ok");
        assert_eq!(nz.len(), 2);
        assert_eq!(nz.to_string(), "[10,30]");
        assert_eq!(nz.weight(1), Ok(0.5));
    }

    #[test]
    fn prefix_and_sub_bounds() {
        let v = Vector::ints((0..6).collect());
        assert_eq!(v.prefix(3).expect("ok").to_string(), "[0,1,2]");
        assert_eq!(v.prefix(0).expect("ok").len(), 0);
        assert_eq!(v.prefix(10).expect("ok").len(), 6);
        assert_eq!(
            v.sub(2, 6).map(|_| ()),
            Err(ValueError::IndexOutOfRange { index: 6, len: 6 })
        );
        assert!(v.sub(4, 3).is_err());
    }

    #[test]
    fn element_wise_equality() {
        let a = Vector::ints(vec![1, 2, 3]);
        let b = Vector::from_values(vec![
            Value::discrete(1),
            Value::continuous(2.0),
            Value::discrete(3),
        ]);
        assert_eq!(a, b);
        assert_ne!(a, Vector::ints(vec![1, 2]));
        assert_eq!(a.sub(1, 2).expect("ok"), Vector::ints(vec![2, 3]));
    }

    #[test]
    fn display() {
        let v = Vector::from_values(vec![
            Value::tuple(vec![Value::discrete(1), Value::str("a")]),
            Value::tuple(vec![Value::discrete(2), Value::str("b")]),
        ]);
        insta::assert_snapshot!(v.to_string(), @"[(1,a),(2,b)]");
        insta::assert_snapshot!(Vector::empty(DISCRETE.clone()).to_string(), @"[]");
    }
}
