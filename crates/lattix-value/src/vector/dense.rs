use std::sync::Arc;

use lattix_types::{CONTINUOUS, DISCRETE, Substitution, TypeRef};

use super::{Sequence, common_type, elt_of, expect_continuous, expect_discrete, vector_of};
use crate::error::{Result, ValueError, check_index};
use crate::status::Status;
use crate::value::{Continuous, Discrete, Value};

/// Owned array of arbitrary values.
#[derive(Debug)]
pub struct DenseVector {
    ty: TypeRef,
    values: Arc<[Value]>,
}

impl DenseVector {
    /// Element type is the values' common type, or `ANY` when they differ.
    pub fn new(values: Vec<Value>) -> Self {
        let types: Vec<TypeRef> = values.iter().map(Value::ty).collect();
        Self {
            ty: vector_of(common_type(types.iter())),
            values: values.into(),
        }
    }

    /// Every value must be accepted by the element slot of `ty`, under one
    /// substitution for the whole vector.
    pub fn with_type(ty: &TypeRef, values: Vec<Value>) -> Result<Self> {
        let Some(vt) = ty.as_vector() else {
            return Err(ValueError::TypeMismatch {
                expected: "[Type]".to_string(),
                found: ty.to_string(),
            });
        };
        let mut subst = Substitution::new();
        for v in &values {
            let found = v.ty();
            if !vt.elt.accepts_in(&found, &mut subst) {
                return Err(ValueError::TypeMismatch {
                    expected: subst.apply(&vt.elt.ty).to_string(),
                    found: found.to_string(),
                });
            }
        }
        Ok(Self {
            ty: ty.clone(),
            values: values.into(),
        })
    }
}

impl Sequence for DenseVector {
    fn ty(&self) -> TypeRef {
        self.ty.clone()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn element(&self, idx: usize) -> Result<Value> {
        check_index(idx, self.values.len())?;
        Ok(self.values[idx].clone())
    }
}

fn check_statuses(statuses: &[Status], len: usize) -> Result<()> {
    if statuses.len() != len {
        return Err(ValueError::LengthMismatch {
            expected: len,
            found: statuses.len(),
        });
    }
    if statuses.contains(&Status::NotApplicable) {
        return Err(ValueError::InvalidStatus(Status::NotApplicable));
    }
    Ok(())
}

/// Packed integer payloads sharing one discrete element type.
pub struct DiscreteVector {
    ty: TypeRef,
    elt: TypeRef,
    xs: Arc<[i64]>,
    statuses: Option<Arc<[Status]>>,
}

impl DiscreteVector {
    pub fn new(elt: &TypeRef, xs: Vec<i64>) -> Result<Self> {
        expect_discrete(elt)?;
        Ok(Self {
            ty: vector_of(elt.clone()),
            elt: elt.clone(),
            xs: xs.into(),
            statuses: None,
        })
    }

    pub(crate) fn untyped(xs: Vec<i64>) -> Self {
        Self {
            ty: vector_of(DISCRETE.clone()),
            elt: DISCRETE.clone(),
            xs: xs.into(),
            statuses: None,
        }
    }

    /// Attach one explicit status per element. Elements stay subject to
    /// the bounds check, so a `Proper` out-of-range payload reads back as
    /// `Invalid`.
    pub fn with_statuses(mut self, statuses: Vec<Status>) -> Result<Self> {
        check_statuses(&statuses, self.xs.len())?;
        self.statuses = Some(statuses.into());
        Ok(self)
    }

    fn status(&self, idx: usize) -> Status {
        self.statuses
            .as_ref()
            .map_or(Status::Proper, |s| s[idx])
    }
}

impl Sequence for DiscreteVector {
    fn ty(&self) -> TypeRef {
        self.ty.clone()
    }

    fn len(&self) -> usize {
        self.xs.len()
    }

    fn element(&self, idx: usize) -> Result<Value> {
        check_index(idx, self.xs.len())?;
        Discrete::with_status(&self.elt, self.status(idx), self.xs[idx]).map(Value::Discrete)
    }

    fn int_at(&self, idx: usize) -> Result<i64> {
        check_index(idx, self.xs.len())?;
        Ok(self.xs[idx])
    }

    fn double_at(&self, idx: usize) -> Result<f64> {
        self.int_at(idx).map(|x| x as f64)
    }
}

/// Packed real payloads sharing one continuous element type.
pub struct ContinuousVector {
    ty: TypeRef,
    elt: TypeRef,
    xs: Arc<[f64]>,
    statuses: Option<Arc<[Status]>>,
}

impl ContinuousVector {
    pub fn new(elt: &TypeRef, xs: Vec<f64>) -> Result<Self> {
        expect_continuous(elt)?;
        Ok(Self {
            ty: vector_of(elt.clone()),
            elt: elt.clone(),
            xs: xs.into(),
            statuses: None,
        })
    }

    pub(crate) fn untyped(xs: Vec<f64>) -> Self {
        Self {
            ty: vector_of(CONTINUOUS.clone()),
            elt: CONTINUOUS.clone(),
            xs: xs.into(),
            statuses: None,
        }
    }

    pub fn with_statuses(mut self, statuses: Vec<Status>) -> Result<Self> {
        check_statuses(&statuses, self.xs.len())?;
        self.statuses = Some(statuses.into());
        Ok(self)
    }

    fn status(&self, idx: usize) -> Status {
        self.statuses
            .as_ref()
            .map_or(Status::Proper, |s| s[idx])
    }
}

impl Sequence for ContinuousVector {
    fn ty(&self) -> TypeRef {
        self.ty.clone()
    }

    fn len(&self) -> usize {
        self.xs.len()
    }

    fn element(&self, idx: usize) -> Result<Value> {
        check_index(idx, self.xs.len())?;
        Continuous::with_status(&self.elt, self.status(idx), self.xs[idx]).map(Value::Continuous)
    }

    fn int_at(&self, idx: usize) -> Result<i64> {
        self.double_at(idx).map(|x| x as i64)
    }

    fn double_at(&self, idx: usize) -> Result<f64> {
        check_index(idx, self.xs.len())?;
        Ok(self.xs[idx])
    }
}

/// Zero-length vector of a given element type.
pub struct EmptyVector {
    ty: TypeRef,
}

impl EmptyVector {
    pub fn new(elt: TypeRef) -> Self {
        Self { ty: vector_of(elt) }
    }

    pub fn elt(&self) -> TypeRef {
        elt_of(&self.ty)
    }
}

impl Sequence for EmptyVector {
    fn ty(&self) -> TypeRef {
        self.ty.clone()
    }

    fn len(&self) -> usize {
        0
    }

    fn element(&self, idx: usize) -> Result<Value> {
        Err(ValueError::IndexOutOfRange { index: idx, len: 0 })
    }
}

#[cfg(test)]
mod tests {
    use lattix_types::{BOOLEAN, PROBABILITY, STRING, Type, has_member};

    use super::*;
    use crate::vector::Vector;

    #[test]
    fn dense_element_type_is_common_or_any() {
        let v = DenseVector::new(vec![Value::discrete(1), Value::discrete(2)]);
        assert!(has_member(&Type::vector(DISCRETE.clone()), &v.ty()));
        let mixed = DenseVector::new(vec![Value::discrete(1), Value::str("x")]);
        assert_eq!(mixed.ty().to_string(), "[Type]");
    }

    #[test]
    fn dense_with_type_checks_elements() {
        let ty = Type::vector(BOOLEAN.clone());
        assert!(DenseVector::with_type(&ty, vec![Value::boolean(true)]).is_ok());
        let err = DenseVector::with_type(&ty, vec![Value::str("yes")]).expect_err("string");
        assert!(matches!(err, ValueError::TypeMismatch { .. }));
        assert!(DenseVector::with_type(&STRING, vec![]).is_err());
    }

    #[test]
    fn dense_elements_share_one_binding() {
        let ty = Type::vector(Type::variable());
        let same = vec![Value::discrete(1), Value::discrete(2)];
        assert!(DenseVector::with_type(&ty, same).is_ok());
        let mixed = vec![Value::discrete(1), Value::str("x")];
        assert!(matches!(
            DenseVector::with_type(&ty, mixed),
            Err(ValueError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn discrete_vector_fast_paths_agree() {
        let elt = Type::discrete(0, 5);
        let v = Vector::new(DiscreteVector::new(&elt, vec![1, 9, 4]).expect("discrete"));
        for i in 0..v.len() {
            let e = v.element(i).expect("in range");
            assert_eq!(v.int_at(i), e.as_int());
            assert_eq!(v.double_at(i), e.as_double());
        }
        assert_eq!(v.element(1).expect("in range").status(), Status::Invalid);
        assert!(v.int_at(3).is_err());
        assert!(DiscreteVector::new(&PROBABILITY, vec![]).is_err());
    }

    #[test]
    fn explicit_statuses() {
        let v = ContinuousVector::new(&PROBABILITY, vec![0.1, 0.2, 2.0])
            .expect("continuous")
            .with_statuses(vec![Status::Proper, Status::Unobserved, Status::Proper])
            .expect("lengths match");
        let v = Vector::new(v);
        assert_eq!(v.to_string(), "[0.1,0.2*M*,2.0*Value out of range.*]");

        let err = DiscreteVector::untyped(vec![1, 2])
            .with_statuses(vec![Status::Proper])
            .map(|_| ())
            .expect_err("short");
        assert_eq!(err, ValueError::LengthMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn empty_vector() {
        let e = EmptyVector::new(STRING.clone());
        assert_eq!(e.len(), 0);
        assert!(std::sync::Arc::ptr_eq(&e.elt(), &STRING));
        assert_eq!(
            e.element(0).map(|_| ()),
            Err(ValueError::IndexOutOfRange { index: 0, len: 0 })
        );
    }
}
