//! Type lattice for the lattix runtime.
//!
//! Types are immutable and shared through [`TypeRef`] (`Arc<Type>`). Pointer
//! identity of a `TypeRef` is what name equivalence compares, so the standard
//! types below are process-wide singletons.
//!
//! Membership (`pattern` accepts `candidate`) is structural by default and is
//! decided by the [`Checker`] in `check.rs`. Type variables are never mutated;
//! their bindings live in a [`Substitution`] owned by one top-level check.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

mod check;
pub mod persist;
pub mod trace;

#[cfg(test)]
mod prop_tests;

pub use check::{CheckOptions, Checker, has_member, is_member, require_member};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier for a type variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(pub u32);

static GLOBAL_TYPE_VAR: AtomicU32 = AtomicU32::new(0);

impl TypeVarId {
    /// Allocate a variable id that no other caller in this process will see.
    pub fn fresh() -> Self {
        TypeVarId(GLOBAL_TYPE_VAR.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TypeVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Shared handle to an immutable type node.
pub type TypeRef = Arc<Type>;

// ---------------------------------------------------------------------------
// Scalar types
// ---------------------------------------------------------------------------

/// Whether a scalar type has a real bound on one side.
///
/// A bound sitting exactly at the representable extreme means "no bound";
/// one step inside the extreme is ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bounded {
    Yes,
    No,
    Maybe,
}

/// Symbol table of a symbolic discrete type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbols {
    /// Symbolic, but the number and names of symbols are not fixed.
    Unspecified,
    /// One slot per code `0..n`; `None` leaves that name unconstrained.
    Known(Vec<Option<String>>),
}

/// The abstract scalar type: accepts discrete and continuous types whose
/// bounds fit inside its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarType {
    pub lwb: f64,
    pub upb: f64,
    /// `None` when the type does not care about cyclicity.
    pub cyclic: Option<bool>,
}

impl ScalarType {
    pub fn new(lwb: f64, upb: f64) -> Self {
        Self {
            lwb,
            upb,
            cyclic: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(-f64::MAX, f64::MAX)
    }

    pub fn with_cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = Some(cyclic);
        self
    }

    pub fn has_upper_bound(&self) -> Bounded {
        Bounded::Maybe
    }

    pub fn has_lower_bound(&self) -> Bounded {
        Bounded::Maybe
    }
}

/// Integer-valued scalar type with inclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteType {
    pub lwb: i64,
    pub upb: i64,
    pub cyclic: Option<bool>,
    pub ordered: Option<bool>,
    pub symbols: Option<Symbols>,
}

impl DiscreteType {
    pub fn new(lwb: i64, upb: i64) -> Self {
        Self {
            lwb,
            upb,
            cyclic: None,
            ordered: None,
            symbols: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(i64::MIN, i64::MAX)
    }

    /// A symbolic type whose codes `0..names.len()` all have a name.
    pub fn symbolic<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::symbolic_partial(names.into_iter().map(|n| Some(n.into())).collect())
    }

    /// A symbolic type with a fixed number of codes, some of them unnamed.
    pub fn symbolic_partial(names: Vec<Option<String>>) -> Self {
        let upb = names.len() as i64 - 1;
        Self {
            lwb: 0,
            upb,
            cyclic: None,
            ordered: None,
            symbols: Some(Symbols::Known(names)),
        }
    }

    /// A symbolic type with an unknown symbol table.
    pub fn symbolic_unspecified() -> Self {
        Self {
            symbols: Some(Symbols::Unspecified),
            ..Self::unbounded()
        }
    }

    pub fn with_cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = Some(cyclic);
        self
    }

    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = Some(ordered);
        self
    }

    pub fn is_cyclic(&self) -> bool {
        self.cyclic == Some(true)
    }

    pub fn is_symbolic(&self) -> bool {
        self.symbols.is_some()
    }

    pub fn contains(&self, x: i64) -> bool {
        self.lwb <= x && x <= self.upb
    }

    pub fn symbol(&self, code: i64) -> Option<&str> {
        match &self.symbols {
            Some(Symbols::Known(names)) => {
                let idx = usize::try_from(code).ok()?;
                names.get(idx)?.as_deref()
            }
            _ => None,
        }
    }

    pub fn code_of(&self, name: &str) -> Option<i64> {
        match &self.symbols {
            Some(Symbols::Known(names)) => names
                .iter()
                .position(|n| n.as_deref() == Some(name))
                .map(|i| i as i64),
            _ => None,
        }
    }

    /// Map `x` into `[lwb, upb]`, treating the interval as `upb - lwb + 1`
    /// distinct codes. Bounds themselves map to themselves.
    pub fn wrap(&self, x: i64) -> i64 {
        let lwb = i128::from(self.lwb);
        let period = i128::from(self.upb) - lwb + 1;
        if period <= 0 || self.contains(x) {
            return x;
        }
        let wrapped = lwb + (i128::from(x) - lwb).rem_euclid(period);
        // In range by construction, so the conversion cannot fail.
        i64::try_from(wrapped).unwrap_or(x)
    }

    pub fn has_upper_bound(&self) -> Bounded {
        match self.upb {
            i64::MAX => Bounded::No,
            u if u == i64::MAX - 1 => Bounded::Maybe,
            _ => Bounded::Yes,
        }
    }

    pub fn has_lower_bound(&self) -> Bounded {
        match self.lwb {
            i64::MIN => Bounded::No,
            l if l == i64::MIN + 1 => Bounded::Maybe,
            _ => Bounded::Yes,
        }
    }
}

/// Real-valued scalar type with inclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousType {
    pub lwb: f64,
    pub upb: f64,
    pub cyclic: Option<bool>,
}

impl ContinuousType {
    pub fn new(lwb: f64, upb: f64) -> Self {
        Self {
            lwb,
            upb,
            cyclic: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(-f64::MAX, f64::MAX)
    }

    pub fn with_cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = Some(cyclic);
        self
    }

    pub fn is_cyclic(&self) -> bool {
        self.cyclic == Some(true)
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lwb <= x && x <= self.upb
    }

    /// Map `x` into `[lwb, upb]`.
    ///
    /// The wrap step is the gap between the crossed bound and its nearest
    /// representable neighbour outside the interval, so one step past `upb`
    /// lands on `lwb` and one step below `lwb` lands on `upb`.
    pub fn wrap(&self, x: f64) -> f64 {
        let period = self.upb - self.lwb;
        if x.is_nan() || !period.is_finite() || period < 0.0 || self.contains(x) {
            return x;
        }
        if x > self.upb {
            let eps = self.upb.next_up() - self.upb;
            let offset = ((x - self.upb) - eps) % (period + eps);
            (self.lwb + offset).clamp(self.lwb, self.upb)
        } else {
            let eps = self.lwb - self.lwb.next_down();
            let offset = ((self.lwb - x) - eps) % (period + eps);
            (self.upb - offset).clamp(self.lwb, self.upb)
        }
    }

    pub fn has_upper_bound(&self) -> Bounded {
        if self.upb >= f64::MAX {
            Bounded::No
        } else if self.upb == f64::MAX.next_down() {
            Bounded::Maybe
        } else {
            Bounded::Yes
        }
    }

    pub fn has_lower_bound(&self) -> Bounded {
        if self.lwb <= -f64::MAX {
            Bounded::No
        } else if self.lwb == (-f64::MAX).next_up() {
            Bounded::Maybe
        } else {
            Bounded::Yes
        }
    }
}

// ---------------------------------------------------------------------------
// Compound types
// ---------------------------------------------------------------------------

/// A nested type together with its equivalence rule.
///
/// With `check_name` set, only the very same `TypeRef` is accepted;
/// otherwise any structural member is.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub ty: TypeRef,
    pub check_name: bool,
}

impl Slot {
    pub fn structural(ty: TypeRef) -> Self {
        Self {
            ty,
            check_name: false,
        }
    }

    pub fn named(ty: TypeRef) -> Self {
        Self {
            ty,
            check_name: true,
        }
    }

    /// Whether `candidate` may fill this slot, checked in a fresh context.
    pub fn accepts(&self, candidate: &TypeRef) -> bool {
        self.accepts_in(candidate, &mut Substitution::new())
    }

    /// Like [`Slot::accepts`], binding variables in `subst` so that sibling
    /// slots checked against the same substitution stay consistent.
    pub fn accepts_in(&self, candidate: &TypeRef, subst: &mut Substitution) -> bool {
        if self.check_name {
            Arc::ptr_eq(&self.ty, candidate)
        } else {
            is_member(&self.ty, candidate, subst)
        }
    }
}

/// Tuple type. `components == None` is the top tuple type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredType {
    pub components: Option<Vec<Slot>>,
    /// One optional label per component.
    pub labels: Option<Vec<Option<String>>>,
}

impl StructuredType {
    pub fn any() -> Self {
        Self {
            components: None,
            labels: None,
        }
    }

    pub fn new(types: Vec<TypeRef>) -> Self {
        Self {
            components: Some(types.into_iter().map(Slot::structural).collect()),
            labels: None,
        }
    }

    pub fn labeled<S: Into<String>>(fields: Vec<(S, TypeRef)>) -> Self {
        let (labels, slots): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .map(|(label, ty)| (Some(label.into()), Slot::structural(ty)))
            .unzip();
        Self {
            components: Some(slots),
            labels: Some(labels),
        }
    }

    pub fn from_slots(slots: Vec<Slot>, labels: Option<Vec<Option<String>>>) -> Self {
        Self {
            components: Some(slots),
            labels,
        }
    }

    pub fn arity(&self) -> Option<usize> {
        self.components.as_ref().map(Vec::len)
    }

    pub fn component(&self, idx: usize) -> Option<&TypeRef> {
        self.components.as_ref()?.get(idx).map(|s| &s.ty)
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.as_ref()?.get(idx)?.as_deref()
    }
}

/// Tagged union of alternative types.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub alternatives: Vec<Slot>,
}

/// Homogeneous sequence type.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorType {
    pub elt: Slot,
    pub index: Slot,
    pub is_sequence: Option<bool>,
}

impl VectorType {
    pub fn new(elt: TypeRef) -> Self {
        Self {
            elt: Slot::structural(elt),
            index: Slot::structural(ANY.clone()),
            is_sequence: None,
        }
    }

    pub fn accepts_element(&self, candidate: &TypeRef) -> bool {
        self.elt.accepts(candidate)
    }

    pub fn accepts_index(&self, candidate: &TypeRef) -> bool {
        self.index.accepts(candidate)
    }
}

/// Single-parameter function type. Multi-argument functions nest in the
/// result position.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub param: Slot,
    pub result: Slot,
}

impl FunctionType {
    pub fn new(param: TypeRef, result: TypeRef) -> Self {
        Self {
            param: Slot::structural(param),
            result: Slot::structural(result),
        }
    }

    pub fn accepts_param(&self, candidate: &TypeRef) -> bool {
        self.param.accepts(candidate)
    }

    pub fn accepts_result(&self, candidate: &TypeRef) -> bool {
        self.result.accepts(candidate)
    }
}

/// Opaque host object type, identified by a class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    /// `None` accepts every object type.
    pub class: Option<String>,
    /// Only the same class is accepted, never a descendant.
    pub exact: bool,
    /// Classes this one descends from.
    pub supertypes: Vec<String>,
}

impl ObjectType {
    pub fn any() -> Self {
        Self {
            class: None,
            exact: false,
            supertypes: Vec::new(),
        }
    }

    pub fn named(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            exact: false,
            supertypes: Vec::new(),
        }
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    pub fn with_supertype(mut self, class: impl Into<String>) -> Self {
        self.supertypes.push(class.into());
        self
    }

    /// Whether objects of `other` may stand in for objects of `self`.
    pub fn accepts_class(&self, other: &ObjectType) -> bool {
        let Some(class) = &self.class else {
            return true;
        };
        let Some(other_class) = &other.class else {
            return false;
        };
        if class == other_class {
            return true;
        }
        !self.exact && other.supertypes.iter().any(|s| s == class)
    }
}

/// Probabilistic model type: data, parameter, shared ("input") and
/// sufficient-statistic spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelType {
    pub data: TypeRef,
    pub param: TypeRef,
    pub shared: TypeRef,
    pub sufficient: TypeRef,
}

// ---------------------------------------------------------------------------
// Type
// ---------------------------------------------------------------------------

/// A node of the type lattice.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Top of the lattice.
    Any,
    Triv,
    Str,
    Scalar(ScalarType),
    Discrete(DiscreteType),
    Continuous(ContinuousType),
    Structured(StructuredType),
    Union(UnionType),
    Vector(VectorType),
    Function(FunctionType),
    Object(ObjectType),
    Model(ModelType),
    Variable(TypeVarId),
}

impl Type {
    pub fn discrete(lwb: i64, upb: i64) -> TypeRef {
        Arc::new(Type::Discrete(DiscreteType::new(lwb, upb)))
    }

    pub fn cyclic_discrete(lwb: i64, upb: i64) -> TypeRef {
        Arc::new(Type::Discrete(
            DiscreteType::new(lwb, upb).with_cyclic(true),
        ))
    }

    pub fn symbolic<I, S>(names: I) -> TypeRef
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Type::Discrete(DiscreteType::symbolic(names)))
    }

    pub fn continuous(lwb: f64, upb: f64) -> TypeRef {
        Arc::new(Type::Continuous(ContinuousType::new(lwb, upb)))
    }

    pub fn cyclic_continuous(lwb: f64, upb: f64) -> TypeRef {
        Arc::new(Type::Continuous(
            ContinuousType::new(lwb, upb).with_cyclic(true),
        ))
    }

    pub fn structured(components: Vec<TypeRef>) -> TypeRef {
        Arc::new(Type::Structured(StructuredType::new(components)))
    }

    pub fn labeled<S: Into<String>>(fields: Vec<(S, TypeRef)>) -> TypeRef {
        Arc::new(Type::Structured(StructuredType::labeled(fields)))
    }

    pub fn union(alternatives: Vec<TypeRef>) -> TypeRef {
        Arc::new(Type::Union(UnionType {
            alternatives: alternatives.into_iter().map(Slot::structural).collect(),
        }))
    }

    pub fn vector(elt: TypeRef) -> TypeRef {
        Arc::new(Type::Vector(VectorType::new(elt)))
    }

    pub fn function(param: TypeRef, result: TypeRef) -> TypeRef {
        Arc::new(Type::Function(FunctionType::new(param, result)))
    }

    /// `p0 -> p1 -> ... -> result`, nested to the right.
    pub fn curried(params: &[TypeRef], result: TypeRef) -> TypeRef {
        params
            .iter()
            .rev()
            .fold(result, |acc, p| Type::function(p.clone(), acc))
    }

    pub fn object(class: impl Into<String>) -> TypeRef {
        Arc::new(Type::Object(ObjectType::named(class)))
    }

    pub fn model(data: TypeRef, param: TypeRef, shared: TypeRef, sufficient: TypeRef) -> TypeRef {
        Arc::new(Type::Model(ModelType {
            data,
            param,
            shared,
            sufficient,
        }))
    }

    /// A fresh, unbound type variable.
    pub fn variable() -> TypeRef {
        Arc::new(Type::Variable(TypeVarId::fresh()))
    }

    /// Short lowercase name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Type::Any => "any",
            Type::Triv => "triv",
            Type::Str => "string",
            Type::Scalar(_) => "scalar",
            Type::Discrete(_) => "discrete",
            Type::Continuous(_) => "continuous",
            Type::Structured(_) => "structured",
            Type::Union(_) => "union",
            Type::Vector(_) => "vector",
            Type::Function(_) => "function",
            Type::Object(_) => "object",
            Type::Model(_) => "model",
            Type::Variable(_) => "variable",
        }
    }

    pub fn as_discrete(&self) -> Option<&DiscreteType> {
        match self {
            Type::Discrete(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_continuous(&self) -> Option<&ContinuousType> {
        match self {
            Type::Continuous(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_structured(&self) -> Option<&StructuredType> {
        match self {
            Type::Structured(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorType> {
        match self {
            Type::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn has_upper_bound(&self) -> Option<Bounded> {
        match self {
            Type::Scalar(s) => Some(s.has_upper_bound()),
            Type::Discrete(d) => Some(d.has_upper_bound()),
            Type::Continuous(c) => Some(c.has_upper_bound()),
            _ => None,
        }
    }

    pub fn has_lower_bound(&self) -> Option<Bounded> {
        match self {
            Type::Scalar(s) => Some(s.has_lower_bound()),
            Type::Discrete(d) => Some(d.has_lower_bound()),
            Type::Continuous(c) => Some(c.has_lower_bound()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Standard types
// ---------------------------------------------------------------------------

pub static ANY: Lazy<TypeRef> = Lazy::new(|| Arc::new(Type::Any));
pub static TRIV: Lazy<TypeRef> = Lazy::new(|| Arc::new(Type::Triv));
pub static STRING: Lazy<TypeRef> = Lazy::new(|| Arc::new(Type::Str));
pub static BOOLEAN: Lazy<TypeRef> = Lazy::new(|| {
    Arc::new(Type::Discrete(
        DiscreteType::symbolic(["true", "false"])
            .with_cyclic(false)
            .with_ordered(false),
    ))
});
pub static SCALAR: Lazy<TypeRef> = Lazy::new(|| Arc::new(Type::Scalar(ScalarType::unbounded())));
pub static DISCRETE: Lazy<TypeRef> =
    Lazy::new(|| Arc::new(Type::Discrete(DiscreteType::unbounded())));
pub static CONTINUOUS: Lazy<TypeRef> =
    Lazy::new(|| Arc::new(Type::Continuous(ContinuousType::unbounded())));
pub static STRUCTURED: Lazy<TypeRef> =
    Lazy::new(|| Arc::new(Type::Structured(StructuredType::any())));
pub static VECTOR: Lazy<TypeRef> = Lazy::new(|| Type::vector(ANY.clone()));
pub static FUNCTION: Lazy<TypeRef> = Lazy::new(|| Type::function(ANY.clone(), ANY.clone()));
pub static OBJECT: Lazy<TypeRef> = Lazy::new(|| Arc::new(Type::Object(ObjectType::any())));
pub static MODEL: Lazy<TypeRef> =
    Lazy::new(|| Type::model(ANY.clone(), ANY.clone(), ANY.clone(), ANY.clone()));
pub static SYMBOLIC: Lazy<TypeRef> =
    Lazy::new(|| Arc::new(Type::Discrete(DiscreteType::symbolic_unspecified())));
pub static PROBABILITY: Lazy<TypeRef> = Lazy::new(|| {
    Arc::new(Type::Continuous(
        ContinuousType::new(0.0, 1.0).with_cyclic(false),
    ))
});
pub static DNA: Lazy<TypeRef> = Lazy::new(|| {
    Arc::new(Type::Discrete(
        DiscreteType::symbolic(["a", "c", "g", "t"])
            .with_cyclic(false)
            .with_ordered(false),
    ))
});

fn standard_table() -> [(&'static str, &'static TypeRef); 15] {
    [
        ("Type", &*ANY),
        ("Triv", &*TRIV),
        ("Str", &*STRING),
        ("Boolean", &*BOOLEAN),
        ("Scalar", &*SCALAR),
        ("Discrete", &*DISCRETE),
        ("Continuous", &*CONTINUOUS),
        ("Structured", &*STRUCTURED),
        ("Vector", &*VECTOR),
        ("Function", &*FUNCTION),
        ("Obj", &*OBJECT),
        ("Model", &*MODEL),
        ("Symbolic", &*SYMBOLIC),
        ("Probability", &*PROBABILITY),
        ("DNA", &*DNA),
    ]
}

/// All standard types with their names.
pub fn standard_types() -> impl Iterator<Item = (&'static str, &'static TypeRef)> {
    standard_table().into_iter()
}

/// Name of `ty` if it is one of the standard singletons (by identity).
pub fn standard_name(ty: &TypeRef) -> Option<&'static str> {
    standard_table()
        .into_iter()
        .find(|(_, std_ty)| Arc::ptr_eq(std_ty, ty))
        .map(|(name, _)| name)
}

/// The standard singleton registered under `name`.
pub fn standard_type(name: &str) -> Option<TypeRef> {
    standard_table()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ty)| ty.clone())
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

fn write_bounds(
    f: &mut fmt::Formatter<'_>,
    head: &str,
    parts: Vec<String>,
) -> fmt::Result {
    if parts.is_empty() {
        write!(f, "{head}")
    } else {
        write!(f, "{head}({})", parts.join(","))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "Type"),
            Type::Triv => write!(f, "()"),
            Type::Str => write!(f, "String"),
            Type::Scalar(s) => {
                let mut parts = Vec::new();
                if s.lwb > -f64::MAX {
                    parts.push(format!("LWB={}", s.lwb));
                }
                if s.upb < f64::MAX {
                    parts.push(format!("UPB={}", s.upb));
                }
                if let Some(c) = s.cyclic {
                    parts.push(format!("cyclic={c}"));
                }
                write_bounds(f, "Scalar", parts)
            }
            Type::Discrete(d) => match &d.symbols {
                Some(Symbols::Unspecified) => write!(f, "Symbolic"),
                Some(Symbols::Known(names)) => {
                    let names: Vec<&str> =
                        names.iter().map(|n| n.as_deref().unwrap_or("_")).collect();
                    write!(f, "Symbolic({})", names.join(","))
                }
                None => {
                    let mut parts = Vec::new();
                    if d.lwb != i64::MIN {
                        parts.push(format!("LWB={}", d.lwb));
                    }
                    if d.upb != i64::MAX {
                        parts.push(format!("UPB={}", d.upb));
                    }
                    if let Some(c) = d.cyclic {
                        parts.push(format!("cyclic={c}"));
                    }
                    if let Some(o) = d.ordered {
                        parts.push(format!("ordered={o}"));
                    }
                    write_bounds(f, "Discrete", parts)
                }
            },
            Type::Continuous(c) => {
                let mut parts = Vec::new();
                if c.lwb > -f64::MAX {
                    parts.push(format!("LWB={}", c.lwb));
                }
                if c.upb < f64::MAX {
                    parts.push(format!("UPB={}", c.upb));
                }
                if let Some(cy) = c.cyclic {
                    parts.push(format!("cyclic={cy}"));
                }
                write_bounds(f, "Continuous", parts)
            }
            Type::Structured(s) => match &s.components {
                None => write!(f, "(...)"),
                Some(slots) => {
                    write!(f, "(")?;
                    for (i, slot) in slots.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        if let Some(label) = s.label(i) {
                            write!(f, "{label}=")?;
                        }
                        write!(f, "{}", slot.ty)?;
                    }
                    write!(f, ")")
                }
            },
            Type::Union(u) => {
                for (i, alt) in u.alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", alt.ty)?;
                }
                Ok(())
            }
            Type::Vector(v) => write!(f, "[{}]", v.elt.ty),
            Type::Function(func) => match &*func.param.ty {
                Type::Function(_) | Type::Union(_) => {
                    write!(f, "({}) -> {}", func.param.ty, func.result.ty)
                }
                _ => write!(f, "{} -> {}", func.param.ty, func.result.ty),
            },
            Type::Object(o) => match &o.class {
                Some(class) => write!(f, "Obj({class})"),
                None => write!(f, "Obj"),
            },
            Type::Model(m) => write!(f, "Model({}|{},{})", m.data, m.param, m.shared),
            Type::Variable(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Variable bindings collected during one subtype check.
///
/// Created fresh per top-level check and threaded by reference through every
/// recursive comparison. It is never stored on a type node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    type_map: BTreeMap<TypeVarId, TypeRef>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, var: TypeVarId, ty: TypeRef) {
        self.type_map.insert(var, ty);
    }

    pub fn lookup(&self, var: TypeVarId) -> Option<&TypeRef> {
        self.type_map.get(&var)
    }

    pub fn bindings(&self) -> &BTreeMap<TypeVarId, TypeRef> {
        &self.type_map
    }

    pub fn len(&self) -> usize {
        self.type_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.type_map.is_empty()
    }

    /// Follow variable-to-variable bindings until reaching a non-variable
    /// or an unbound variable.
    pub fn resolve(&self, ty: &TypeRef) -> TypeRef {
        let mut current = ty.clone();
        // A chain longer than the map must contain a cycle.
        for _ in 0..=self.type_map.len() {
            let next = match &*current {
                Type::Variable(v) => match self.lookup(*v) {
                    Some(bound) => bound.clone(),
                    None => return current,
                },
                _ => return current,
            };
            current = next;
        }
        current
    }

    /// Replace every bound variable in `ty` by its binding.
    ///
    /// A variable whose binding mentions itself is left in place at the
    /// point of recursion.
    pub fn apply(&self, ty: &TypeRef) -> TypeRef {
        let mut active = Vec::new();
        self.apply_inner(ty, &mut active)
    }

    fn apply_inner(&self, ty: &TypeRef, active: &mut Vec<TypeVarId>) -> TypeRef {
        if self.is_empty() {
            return ty.clone();
        }
        match &**ty {
            Type::Variable(v) => {
                if active.contains(v) {
                    return ty.clone();
                }
                match self.lookup(*v) {
                    Some(bound) => {
                        active.push(*v);
                        let resolved = self.apply_inner(bound, active);
                        active.pop();
                        resolved
                    }
                    None => ty.clone(),
                }
            }
            Type::Structured(s) => match &s.components {
                None => ty.clone(),
                Some(slots) => {
                    let slots = slots
                        .iter()
                        .map(|slot| self.apply_slot(slot, active))
                        .collect();
                    Arc::new(Type::Structured(StructuredType::from_slots(
                        slots,
                        s.labels.clone(),
                    )))
                }
            },
            Type::Union(u) => Arc::new(Type::Union(UnionType {
                alternatives: u
                    .alternatives
                    .iter()
                    .map(|slot| self.apply_slot(slot, active))
                    .collect(),
            })),
            Type::Vector(v) => Arc::new(Type::Vector(VectorType {
                elt: self.apply_slot(&v.elt, active),
                index: self.apply_slot(&v.index, active),
                is_sequence: v.is_sequence,
            })),
            Type::Function(func) => Arc::new(Type::Function(FunctionType {
                param: self.apply_slot(&func.param, active),
                result: self.apply_slot(&func.result, active),
            })),
            Type::Model(m) => Arc::new(Type::Model(ModelType {
                data: self.apply_inner(&m.data, active),
                param: self.apply_inner(&m.param, active),
                shared: self.apply_inner(&m.shared, active),
                sufficient: self.apply_inner(&m.sufficient, active),
            })),
            _ => ty.clone(),
        }
    }

    fn apply_slot(&self, slot: &Slot, active: &mut Vec<TypeVarId>) -> Slot {
        Slot {
            ty: self.apply_inner(&slot.ty, active),
            check_name: slot.check_name,
        }
    }
}
