//! Tagged runtime values.
//!
//! Every value carries the type it inhabits. Scalars also carry a [`Status`]
//! that is recomputed against the type's bounds at construction: a payload
//! outside the bounds is kept as is and marked `Invalid`.

use std::any::Any;
use std::f64::consts::PI;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use lattix_types::{
    BOOLEAN, CONTINUOUS, ContinuousType, DISCRETE, DiscreteType, STRING, Substitution, TRIV, Type,
    TypeRef,
};

use crate::error::{Result, ValueError, check_index};
use crate::function::FnValue;
use crate::model::ModelValue;
use crate::status::Status;
use crate::vector::Vector;

/// Smallest positive `f64`, the default half-width of a continuous value's
/// accuracy interval.
pub const DEFAULT_DELTA: f64 = f64::from_bits(1);

fn settle_status(status: Status, in_range: bool) -> Result<Status> {
    match status {
        Status::NotApplicable => Err(ValueError::InvalidStatus(status)),
        Status::Proper if !in_range => Ok(Status::Invalid),
        other => Ok(other),
    }
}

/// After a cyclic wrap the payload is back in range, so a range-derived
/// status is recomputed; any other status is the caller's and stays.
fn status_after_wrap(status: Status) -> Status {
    match status {
        Status::Invalid => Status::Proper,
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Discrete
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Discrete {
    ty: TypeRef,
    status: Status,
    x: i64,
}

impl Discrete {
    pub fn new(x: i64) -> Self {
        Self {
            ty: DISCRETE.clone(),
            status: Status::Proper,
            x,
        }
    }

    pub fn typed(ty: &TypeRef, x: i64) -> Result<Self> {
        Self::with_status(ty, Status::Proper, x)
    }

    /// `Proper` is downgraded to `Invalid` when `x` is out of bounds; other
    /// statuses are kept.
    pub fn with_status(ty: &TypeRef, status: Status, x: i64) -> Result<Self> {
        let Some(dt) = ty.as_discrete() else {
            return Err(ValueError::TypeMismatch {
                expected: DISCRETE.to_string(),
                found: ty.to_string(),
            });
        };
        Ok(Self {
            ty: ty.clone(),
            status: settle_status(status, dt.contains(x))?,
            x,
        })
    }

    /// The value whose code is named `name` in a symbolic type.
    pub fn symbol(ty: &TypeRef, name: &str) -> Result<Self> {
        let code = ty
            .as_discrete()
            .and_then(|dt| dt.code_of(name))
            .ok_or_else(|| ValueError::TypeMismatch {
                expected: ty.to_string(),
                found: format!("symbol `{name}`"),
            })?;
        Self::typed(ty, code)
    }

    pub fn get(&self) -> i64 {
        self.x
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn discrete_type(&self) -> Option<&DiscreteType> {
        self.ty.as_discrete()
    }

    pub fn symbol_name(&self) -> Option<&str> {
        self.discrete_type()?.symbol(self.x)
    }

    /// Map a cyclic value back into its bounds. Non-cyclic values are
    /// returned unchanged.
    pub fn wrap_to_range(&self) -> Self {
        match self.discrete_type() {
            Some(dt) if dt.is_cyclic() => Self {
                ty: self.ty.clone(),
                status: status_after_wrap(self.status),
                x: dt.wrap(self.x),
            },
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Discrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol_name() {
            Some(name) => write!(f, "{name}")?,
            None => write!(f, "{}", self.x)?,
        }
        if let Some(flag) = self.status.flag() {
            write!(f, "{flag}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Continuous
// ---------------------------------------------------------------------------

/// How far the true value may lie from a continuous point estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Accuracy {
    /// `x ± delta`.
    Absolute(f64),
    /// `x ± |x * delta|`.
    Relative(f64),
    /// Explicit interval, independent of `x`.
    Asymmetric { low: f64, high: f64 },
}

impl Default for Accuracy {
    fn default() -> Self {
        Accuracy::Absolute(DEFAULT_DELTA)
    }
}

/// Closed interval of reals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub lwb: f64,
    pub upb: f64,
}

#[derive(Clone)]
pub struct Continuous {
    ty: TypeRef,
    status: Status,
    x: f64,
    accuracy: Accuracy,
}

impl Continuous {
    pub fn new(x: f64) -> Self {
        Self {
            ty: CONTINUOUS.clone(),
            status: Status::Proper,
            x,
            accuracy: Accuracy::default(),
        }
    }

    pub fn typed(ty: &TypeRef, x: f64) -> Result<Self> {
        Self::with_status(ty, Status::Proper, x)
    }

    pub fn with_status(ty: &TypeRef, status: Status, x: f64) -> Result<Self> {
        let Some(ct) = ty.as_continuous() else {
            return Err(ValueError::TypeMismatch {
                expected: CONTINUOUS.to_string(),
                found: ty.to_string(),
            });
        };
        Ok(Self {
            ty: ty.clone(),
            status: settle_status(status, ct.contains(x))?,
            x,
            accuracy: Accuracy::default(),
        })
    }

    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn get(&self) -> f64 {
        self.x
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn continuous_type(&self) -> Option<&ContinuousType> {
        self.ty.as_continuous()
    }

    /// Interval the true value lies in, clipped to the type's bounds.
    pub fn accuracy(&self) -> Range {
        let (low, high) = match self.accuracy {
            Accuracy::Absolute(delta) => (self.x - delta, self.x + delta),
            Accuracy::Relative(delta) => {
                let spread = (self.x * delta).abs();
                (self.x - spread, self.x + spread)
            }
            Accuracy::Asymmetric { low, high } => (low, high),
        };
        match self.continuous_type() {
            Some(ct) => Range {
                lwb: low.max(ct.lwb),
                upb: high.min(ct.upb),
            },
            None => Range {
                lwb: low,
                upb: high,
            },
        }
    }

    pub fn wrap_to_range(&self) -> Self {
        match self.continuous_type() {
            Some(ct) if ct.is_cyclic() => Self {
                ty: self.ty.clone(),
                status: status_after_wrap(self.status),
                x: ct.wrap(self.x),
                accuracy: self.accuracy,
            },
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Continuous {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.x)?;
        if let Some(flag) = self.status.flag() {
            write!(f, "{flag}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tuple
// ---------------------------------------------------------------------------

/// A structured value: fixed, ordered, possibly labelled components.
#[derive(Debug, Clone)]
pub struct Tuple {
    ty: TypeRef,
    components: Arc<[Value]>,
}

impl Tuple {
    /// A tuple typed by its components' own types.
    pub fn new(components: Vec<Value>) -> Self {
        let ty = Type::structured(components.iter().map(Value::ty).collect());
        Self {
            ty,
            components: components.into(),
        }
    }

    pub fn labeled<S: Into<String>>(fields: Vec<(S, Value)>) -> Self {
        let (types, components): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .map(|(label, value)| ((label.into(), value.ty()), value))
            .unzip();
        Self {
            ty: Type::labeled(types),
            components: components.into(),
        }
    }

    /// A tuple of the given structured type. Each component must be
    /// accepted by the matching slot; all slots share one substitution.
    pub fn with_type(ty: &TypeRef, components: Vec<Value>) -> Result<Self> {
        let Some(st) = ty.as_structured() else {
            return Err(ValueError::TypeMismatch {
                expected: "(...)".to_string(),
                found: ty.to_string(),
            });
        };
        if let Some(slots) = &st.components {
            if slots.len() != components.len() {
                return Err(ValueError::LengthMismatch {
                    expected: slots.len(),
                    found: components.len(),
                });
            }
            let mut subst = Substitution::new();
            for (slot, value) in slots.iter().zip(&components) {
                let found = value.ty();
                if !slot.accepts_in(&found, &mut subst) {
                    return Err(ValueError::TypeMismatch {
                        expected: subst.apply(&slot.ty).to_string(),
                        found: found.to_string(),
                    });
                }
            }
        }
        Ok(Self::from_parts(ty.clone(), components.into()))
    }

    pub(crate) fn from_parts(ty: TypeRef, components: Arc<[Value]>) -> Self {
        Self { ty, components }
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn arity(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[Value] {
        &self.components
    }

    pub fn component(&self, idx: usize) -> Result<&Value> {
        check_index(idx, self.components.len())?;
        Ok(&self.components[idx])
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.ty.as_structured()?.label(idx)
    }

    pub fn int_component(&self, idx: usize) -> Result<i64> {
        self.component(idx)?.as_int()
    }

    pub fn double_component(&self, idx: usize) -> Result<f64> {
        self.component(idx)?.as_double()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match self.label(i) {
                Some(label) if !label.is_empty() => write!(f, "{label} = {c}")?,
                _ => write!(f, "{c}")?,
            }
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// Wraps an opaque host value.
#[derive(Clone)]
pub struct ObjectValue {
    ty: TypeRef,
    payload: Arc<dyn Any + Send + Sync>,
}

impl ObjectValue {
    /// Object typed by the Rust type name of `value`.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            ty: Type::object(std::any::type_name::<T>()),
            payload: Arc::new(value),
        }
    }

    pub fn with_type<T: Any + Send + Sync>(ty: &TypeRef, value: T) -> Result<Self> {
        if !matches!(&**ty, Type::Object(_)) {
            return Err(ValueError::TypeMismatch {
                expected: "Obj".to_string(),
                found: ty.to_string(),
            });
        }
        Ok(Self {
            ty: ty.clone(),
            payload: Arc::new(value),
        })
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn class(&self) -> Option<&str> {
        match &*self.ty {
            Type::Object(o) => o.class.as_deref(),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.payload) as *const () as usize
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum Value {
    Triv,
    Str(Arc<str>),
    Discrete(Discrete),
    Continuous(Continuous),
    Structured(Tuple),
    Vector(Vector),
    Function(FnValue),
    Object(ObjectValue),
    Model(ModelValue),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn discrete(x: i64) -> Self {
        Value::Discrete(Discrete::new(x))
    }

    pub fn continuous(x: f64) -> Self {
        Value::Continuous(Continuous::new(x))
    }

    /// `true` and `false` over the standard boolean type (codes 0 and 1).
    pub fn boolean(b: bool) -> Self {
        Value::Discrete(Discrete {
            ty: BOOLEAN.clone(),
            status: Status::Proper,
            x: if b { 0 } else { 1 },
        })
    }

    pub fn pi() -> Self {
        Value::continuous(PI)
    }

    pub fn tuple(components: Vec<Value>) -> Self {
        Value::Structured(Tuple::new(components))
    }

    pub fn ty(&self) -> TypeRef {
        match self {
            Value::Triv => TRIV.clone(),
            Value::Str(_) => STRING.clone(),
            Value::Discrete(d) => d.ty.clone(),
            Value::Continuous(c) => c.ty.clone(),
            Value::Structured(t) => t.ty.clone(),
            Value::Vector(v) => v.ty(),
            Value::Function(f) => f.ty(),
            Value::Object(o) => o.ty.clone(),
            Value::Model(m) => m.ty(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Value::Discrete(d) => d.status,
            Value::Continuous(c) => c.status,
            Value::Str(_) => Status::Proper,
            _ => Status::NotApplicable,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Triv => "triv",
            Value::Str(_) => "string",
            Value::Discrete(_) => "discrete",
            Value::Continuous(_) => "continuous",
            Value::Structured(_) => "tuple",
            Value::Vector(_) => "vector",
            Value::Function(_) => "function",
            Value::Object(_) => "object",
            Value::Model(_) => "model",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Discrete(_) | Value::Continuous(_))
    }

    /// Integer payload. Continuous values truncate toward zero.
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Discrete(d) => Ok(d.x),
            Value::Continuous(c) => Ok(c.x as i64),
            other => Err(ValueError::shape("a scalar", other.kind())),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match self {
            Value::Discrete(d) => Ok(d.x as f64),
            Value::Continuous(c) => Ok(c.x),
            other => Err(ValueError::shape("a scalar", other.kind())),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(ValueError::shape("a string", other.kind())),
        }
    }

    pub fn as_tuple(&self) -> Result<&Tuple> {
        match self {
            Value::Structured(t) => Ok(t),
            other => Err(ValueError::shape("a tuple", other.kind())),
        }
    }

    pub fn as_vector(&self) -> Result<&Vector> {
        match self {
            Value::Vector(v) => Ok(v),
            other => Err(ValueError::shape("a vector", other.kind())),
        }
    }

    pub fn as_function(&self) -> Result<&FnValue> {
        match self {
            Value::Function(f) => Ok(f),
            other => Err(ValueError::shape("a function", other.kind())),
        }
    }

    pub fn as_object(&self) -> Result<&ObjectValue> {
        match self {
            Value::Object(o) => Ok(o),
            other => Err(ValueError::shape("an object", other.kind())),
        }
    }

    pub fn as_model(&self) -> Result<&ModelValue> {
        match self {
            Value::Model(m) => Ok(m),
            other => Err(ValueError::shape("a model", other.kind())),
        }
    }

    /// Cyclic wrap for scalars; anything else is a shape error.
    pub fn wrap_to_range(&self) -> Result<Value> {
        match self {
            Value::Discrete(d) => Ok(Value::Discrete(d.wrap_to_range())),
            Value::Continuous(c) => Ok(Value::Continuous(c.wrap_to_range())),
            other => Err(ValueError::shape("a scalar", other.kind())),
        }
    }

    fn scalar(&self) -> Option<f64> {
        match self {
            Value::Discrete(d) => Some(d.x as f64),
            Value::Continuous(c) => Some(c.x),
            _ => None,
        }
    }
}

impl From<Tuple> for Value {
    fn from(t: Tuple) -> Self {
        Value::Structured(t)
    }
}

impl From<Vector> for Value {
    fn from(v: Vector) -> Self {
        Value::Vector(v)
    }
}

impl From<FnValue> for Value {
    fn from(f: FnValue) -> Self {
        Value::Function(f)
    }
}

fn numbers_equal(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn hash_number<H: Hasher>(x: f64, state: &mut H) {
    let bits = if x == 0.0 {
        0.0_f64.to_bits()
    } else if x.is_nan() {
        f64::NAN.to_bits()
    } else {
        x.to_bits()
    };
    state.write_u64(bits);
}

/// Scalars compare numerically regardless of kind, type or status.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.scalar(), other.scalar()) {
            return numbers_equal(a, b);
        }
        match (self, other) {
            (Value::Triv, Value::Triv) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Structured(a), Value::Structured(b)) => a.components == b.components,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.addr() == b.addr(),
            (Value::Model(a), Value::Model(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(x) = self.scalar() {
            state.write_u8(0);
            hash_number(x, state);
            return;
        }
        match self {
            Value::Triv => state.write_u8(1),
            Value::Str(s) => {
                state.write_u8(2);
                s.hash(state);
            }
            Value::Structured(t) => {
                state.write_u8(3);
                t.components.hash(state);
            }
            Value::Vector(v) => {
                state.write_u8(4);
                v.hash(state);
            }
            Value::Function(f) => {
                state.write_u8(5);
                state.write_usize(f.addr());
            }
            Value::Object(o) => {
                state.write_u8(6);
                state.write_usize(o.addr());
            }
            Value::Model(m) => {
                state.write_u8(7);
                state.write_usize(m.addr());
            }
            Value::Discrete(_) | Value::Continuous(_) => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Triv => write!(f, "()"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Discrete(d) => write!(f, "{d}"),
            Value::Continuous(c) => write!(f, "{c}"),
            Value::Structured(t) => write!(f, "{t}"),
            Value::Vector(v) => write!(f, "{v}"),
            Value::Function(func) => write!(f, "{}", func.ty()),
            Value::Object(o) => match o.class() {
                Some(class) => write!(f, "<{class}>"),
                None => write!(f, "<object>"),
            },
            Value::Model(_) => write!(f, "Model"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(self.kind())
            .field(&format_args!("{self}"))
            .finish()
    }
}
