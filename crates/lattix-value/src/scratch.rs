//! Reusable scalar cells for tight loops.
//!
//! A scratch cell holds one scalar whose payload is overwritten in place,
//! avoiding an allocation per element when a function is applied across a
//! primitive array. Cells are `!Sync`; share the values produced by
//! [`ScratchDiscrete::snapshot`] instead.

use std::cell::Cell;
use std::marker::PhantomData;

use lattix_types::TypeRef;

use crate::error::{Result, ValueError};
use crate::status::Status;
use crate::value::{Continuous, Discrete, Value};

type NotSync = PhantomData<Cell<()>>;

pub struct ScratchDiscrete {
    ty: TypeRef,
    lwb: i64,
    upb: i64,
    x: i64,
    status: Status,
    _not_sync: NotSync,
}

impl ScratchDiscrete {
    pub fn new(ty: &TypeRef) -> Result<Self> {
        let dt = ty.as_discrete().ok_or_else(|| ValueError::TypeMismatch {
            expected: "Discrete".to_string(),
            found: ty.to_string(),
        })?;
        Ok(Self {
            ty: ty.clone(),
            lwb: dt.lwb,
            upb: dt.upb,
            x: dt.lwb,
            status: Status::Proper,
            _not_sync: PhantomData,
        })
    }

    pub fn set(&mut self, x: i64) {
        self.x = x;
        self.status = if self.lwb <= x && x <= self.upb {
            Status::Proper
        } else {
            Status::Invalid
        };
    }

    pub fn get(&self) -> i64 {
        self.x
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// An immutable value holding the current payload.
    pub fn snapshot(&self) -> Result<Value> {
        Discrete::with_status(&self.ty, self.status, self.x).map(Value::Discrete)
    }
}

pub struct ScratchContinuous {
    ty: TypeRef,
    lwb: f64,
    upb: f64,
    x: f64,
    status: Status,
    _not_sync: NotSync,
}

impl ScratchContinuous {
    pub fn new(ty: &TypeRef) -> Result<Self> {
        let ct = ty.as_continuous().ok_or_else(|| ValueError::TypeMismatch {
            expected: "Continuous".to_string(),
            found: ty.to_string(),
        })?;
        Ok(Self {
            ty: ty.clone(),
            lwb: ct.lwb,
            upb: ct.upb,
            x: ct.lwb,
            status: Status::Proper,
            _not_sync: PhantomData,
        })
    }

    pub fn set(&mut self, x: f64) {
        self.x = x;
        self.status = if self.lwb <= x && x <= self.upb {
            Status::Proper
        } else {
            Status::Invalid
        };
    }

    pub fn get(&self) -> f64 {
        self.x
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn snapshot(&self) -> Result<Value> {
        Continuous::with_status(&self.ty, self.status, self.x).map(Value::Continuous)
    }
}
