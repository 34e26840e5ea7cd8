use lattix_types::{CONTINUOUS, DISCRETE, TypeRef};

use super::{Sequence, vector_of};
use crate::error::{Result, check_index};
use crate::value::Value;

/// `len` copies of one value.
pub struct ConstantVector {
    ty: TypeRef,
    value: Value,
    len: usize,
}

impl ConstantVector {
    pub fn new(value: Value, len: usize) -> Self {
        Self {
            ty: vector_of(value.ty()),
            value,
            len,
        }
    }
}

impl Sequence for ConstantVector {
    fn ty(&self) -> TypeRef {
        self.ty.clone()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn element(&self, idx: usize) -> Result<Value> {
        check_index(idx, self.len)?;
        Ok(self.value.clone())
    }
}

/// `0, 1, ..., len - 1`, as discrete values or, in real mode, continuous.
pub struct IotaVector {
    len: usize,
    real: bool,
}

impl IotaVector {
    pub fn new(len: usize) -> Self {
        Self { len, real: false }
    }

    pub fn real(len: usize) -> Self {
        Self { len, real: true }
    }
}

impl Sequence for IotaVector {
    fn ty(&self) -> TypeRef {
        if self.real {
            vector_of(CONTINUOUS.clone())
        } else {
            vector_of(DISCRETE.clone())
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn element(&self, idx: usize) -> Result<Value> {
        check_index(idx, self.len)?;
        Ok(if self.real {
            Value::continuous(idx as f64)
        } else {
            Value::discrete(idx as i64)
        })
    }

    fn int_at(&self, idx: usize) -> Result<i64> {
        check_index(idx, self.len)?;
        Ok(idx as i64)
    }

    fn double_at(&self, idx: usize) -> Result<f64> {
        check_index(idx, self.len)?;
        Ok(idx as f64)
    }
}
