//! lattix: the type/value substrate of a dynamically typed, structurally
//! subtyped runtime.
//!
//! This crate re-exports the public contract of its layers:
//!
//! - [`diag`]: diagnostic categories and errors
//! - [`types`]: the type lattice, substitutions and the subtype checker
//! - [`value`]: tagged values, vector views, curried functions and the
//!   model contract

pub use lattix_diag as diag;
pub use lattix_types as types;
pub use lattix_value as value;

pub use lattix_diag::{Category, Diagnostic, DiagnosticError, Severity};
pub use lattix_types::{
    CheckOptions, Checker, Substitution, Type, TypeRef, TypeVarId, has_member, is_member,
    require_member,
};
pub use lattix_value::{
    Accuracy, Continuous, Discrete, FnValue, Function, Model, ModelValue, ObjectValue, Sequence,
    Status, Tuple, Value, ValueError, Vector, builtins,
};
