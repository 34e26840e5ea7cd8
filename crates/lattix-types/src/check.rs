//! The subtype checker.
//!
//! `Checker::check(pattern, candidate)` answers "may a value of type
//! `candidate` be used where `pattern` is required". Variables on either side
//! are resolved against the substitution the checker borrows; the checker
//! never raises, a conflict is just `false`.

use std::sync::Arc;

use lattix_diag::{Category, Diagnostic, DiagnosticError};
use tracing::{debug, trace};

use crate::trace::{CheckAction, CheckStep};
use crate::{
    DiscreteType, Slot, StructuredType, Substitution, Symbols, Type, TypeRef, TypeVarId,
    UnionType,
};

/// Knobs for a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Maximum nesting of recursive comparisons before the check gives up.
    pub max_depth: usize,
    /// Record a [`CheckStep`] for every decision.
    pub trace: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            trace: false,
        }
    }
}

/// Membership test for `candidate` in `pattern`, binding variables in `subst`.
pub fn is_member(pattern: &TypeRef, candidate: &TypeRef, subst: &mut Substitution) -> bool {
    Checker::new(subst).check(pattern, candidate)
}

/// Membership test in a fresh, throwaway substitution.
pub fn has_member(pattern: &TypeRef, candidate: &TypeRef) -> bool {
    let mut subst = Substitution::new();
    is_member(pattern, candidate, &mut subst)
}

/// Like [`has_member`], but a rejection becomes a diagnostic.
pub fn require_member(pattern: &TypeRef, candidate: &TypeRef) -> Result<(), DiagnosticError> {
    if has_member(pattern, candidate) {
        return Ok(());
    }
    Err(DiagnosticError::single(
        Diagnostic::error(
            Category::TypeMismatch,
            format!("`{candidate}` is not a member of `{pattern}`"),
        )
        .with_context("expected", pattern)
        .with_context("found", candidate),
    ))
}

pub struct Checker<'s> {
    subst: &'s mut Substitution,
    options: CheckOptions,
    depth: usize,
    trace: Vec<CheckStep>,
}

impl<'s> Checker<'s> {
    pub fn new(subst: &'s mut Substitution) -> Self {
        Self::with_options(subst, CheckOptions::default())
    }

    pub fn with_options(subst: &'s mut Substitution, options: CheckOptions) -> Self {
        Self {
            subst,
            options,
            depth: 0,
            trace: Vec::new(),
        }
    }

    pub fn substitution(&self) -> &Substitution {
        self.subst
    }

    pub fn trace(&self) -> &[CheckStep] {
        &self.trace
    }

    pub fn take_trace(&mut self) -> Vec<CheckStep> {
        std::mem::take(&mut self.trace)
    }

    /// Whether `candidate` is a member of `pattern`.
    pub fn check(&mut self, pattern: &TypeRef, candidate: &TypeRef) -> bool {
        if self.depth >= self.options.max_depth {
            debug!(
                max_depth = self.options.max_depth,
                %pattern,
                %candidate,
                "subtype check exceeded depth limit"
            );
            self.push_step(
                CheckAction::DepthExceeded,
                pattern,
                candidate,
                format!("depth {}", self.depth),
            );
            return false;
        }
        self.depth += 1;
        let ok = self.check_inner(pattern, candidate);
        self.depth -= 1;
        ok
    }

    /// Unify a candidate-side variable with `pattern`.
    ///
    /// Unbound: bind to `pattern`. Bound to `b`: keep `b` if `pattern`
    /// accepts it, tighten to `pattern` if `b` accepts `pattern`, otherwise
    /// fail.
    pub fn unify(&mut self, var: TypeVarId, pattern: &TypeRef) -> bool {
        let var_ty = Arc::new(Type::Variable(var));
        let Some(bound) = self.subst.lookup(var).cloned() else {
            if self.is_same_var(pattern, var) {
                return true;
            }
            trace!(%var, %pattern, "binding candidate variable");
            self.push_step(
                CheckAction::Bind,
                pattern,
                &var_ty,
                format!("{var} := {pattern}"),
            );
            self.subst.bind(var, pattern.clone());
            return true;
        };
        if self.attempt(pattern, &bound) {
            self.push_step(CheckAction::Keep, pattern, &var_ty, format!("{var} = {bound}"));
            return true;
        }
        if self.attempt(&bound, pattern) {
            debug!(%var, from = %bound, to = %pattern, "tightening variable binding");
            self.push_step(
                CheckAction::Tighten,
                pattern,
                &var_ty,
                format!("{var} := {pattern} (was {bound})"),
            );
            self.subst.bind(var, pattern.clone());
            return true;
        }
        self.push_step(
            CheckAction::Reject,
            pattern,
            &var_ty,
            format!("{var} = {bound} conflicts with {pattern}"),
        );
        false
    }

    fn check_inner(&mut self, pattern: &TypeRef, candidate: &TypeRef) -> bool {
        match (&**pattern, &**candidate) {
            (Type::Variable(a), Type::Variable(b)) if a == b => {
                self.push_step(CheckAction::Identity, pattern, candidate, "same variable".into());
                true
            }
            (Type::Variable(v), _) => self.check_pattern_var(*v, pattern, candidate),
            (_, Type::Variable(v)) => self.unify(*v, pattern),
            _ if Arc::ptr_eq(pattern, candidate) => {
                self.push_step(CheckAction::Identity, pattern, candidate, "same node".into());
                true
            }
            _ => {
                let ok = self.check_structure(pattern, candidate);
                if !ok {
                    self.push_step(
                        CheckAction::Reject,
                        pattern,
                        candidate,
                        format!("{} does not accept {}", pattern.kind(), candidate.kind()),
                    );
                }
                ok
            }
        }
    }

    /// A pattern-side variable: unbound acts as the top type and records the
    /// candidate; bound defers to its binding, which is never rebound here.
    fn check_pattern_var(
        &mut self,
        var: TypeVarId,
        pattern: &TypeRef,
        candidate: &TypeRef,
    ) -> bool {
        let Some(bound) = self.subst.lookup(var).cloned() else {
            if self.is_same_var(candidate, var) {
                return true;
            }
            trace!(%var, %candidate, "binding pattern variable");
            self.push_step(
                CheckAction::Bind,
                pattern,
                candidate,
                format!("{var} := {candidate}"),
            );
            self.subst.bind(var, candidate.clone());
            return true;
        };
        if let Type::Variable(other) = &**candidate {
            return self.unify(*other, &bound);
        }
        if self.attempt(&bound, candidate) {
            self.push_step(CheckAction::Keep, pattern, candidate, format!("{var} = {bound}"));
            return true;
        }
        self.push_step(
            CheckAction::Reject,
            pattern,
            candidate,
            format!("{var} = {bound} conflicts with {candidate}"),
        );
        false
    }

    fn check_structure(&mut self, pattern: &TypeRef, candidate: &TypeRef) -> bool {
        match (&**pattern, &**candidate) {
            (Type::Any, _) => true,
            (Type::Triv, Type::Triv) | (Type::Str, Type::Str) => true,

            (Type::Scalar(p), Type::Scalar(c)) => {
                interval_within(p.lwb, p.upb, c.lwb, c.upb) && flag_ok(p.cyclic, c.cyclic)
            }
            (Type::Scalar(p), Type::Discrete(c)) => {
                interval_within(p.lwb, p.upb, c.lwb as f64, c.upb as f64)
                    && flag_ok(p.cyclic, c.cyclic)
            }
            (Type::Scalar(p), Type::Continuous(c)) => {
                interval_within(p.lwb, p.upb, c.lwb, c.upb) && flag_ok(p.cyclic, c.cyclic)
            }
            (Type::Discrete(p), Type::Discrete(c)) => discrete_accepts(p, c),
            (Type::Continuous(p), Type::Continuous(c)) => {
                interval_within(p.lwb, p.upb, c.lwb, c.upb) && flag_ok(p.cyclic, c.cyclic)
            }

            (Type::Structured(p), Type::Structured(c)) => {
                self.check_structured(pattern, candidate, p, c)
            }
            (Type::Union(p), _) => self.check_union(pattern, candidate, p),

            (Type::Vector(p), Type::Vector(c)) => {
                self.push_step(
                    CheckAction::Decompose,
                    pattern,
                    candidate,
                    "element and index".into(),
                );
                if !flag_ok(p.is_sequence, c.is_sequence) {
                    return false;
                }
                self.check_slot(&p.elt, &c.elt.ty) && self.check_slot(&p.index, &c.index.ty)
            }
            (Type::Function(p), Type::Function(c)) => {
                self.push_step(
                    CheckAction::Decompose,
                    pattern,
                    candidate,
                    "parameter and result".into(),
                );
                self.check_slot(&p.param, &c.param.ty)
                    && self.check_slot(&p.result, &c.result.ty)
            }
            (Type::Object(p), Type::Object(c)) => p.accepts_class(c),
            (Type::Model(p), Type::Model(c)) => {
                self.push_step(CheckAction::Decompose, pattern, candidate, "model spaces".into());
                self.check(&p.data, &c.data)
                    && self.check(&p.param, &c.param)
                    && self.check(&p.shared, &c.shared)
                    && self.check(&p.sufficient, &c.sufficient)
            }
            _ => false,
        }
    }

    fn check_structured(
        &mut self,
        pattern: &TypeRef,
        candidate: &TypeRef,
        p: &StructuredType,
        c: &StructuredType,
    ) -> bool {
        let Some(want) = &p.components else {
            return true;
        };
        let Some(have) = &c.components else {
            return false;
        };
        if want.len() != have.len() {
            return false;
        }
        self.push_step(
            CheckAction::Decompose,
            pattern,
            candidate,
            format!("{} components", want.len()),
        );
        want.iter()
            .zip(have)
            .all(|(slot, other)| self.check_slot(slot, &other.ty))
    }

    fn check_union(&mut self, pattern: &TypeRef, candidate: &TypeRef, p: &UnionType) -> bool {
        self.push_step(
            CheckAction::Decompose,
            pattern,
            candidate,
            format!("{} alternatives", p.alternatives.len()),
        );
        if let Type::Union(c) = &**candidate {
            let all_covered = c
                .alternatives
                .iter()
                .all(|alt| p.alternatives.iter().any(|slot| self.attempt_slot(slot, &alt.ty)));
            if all_covered {
                return true;
            }
        }
        p.alternatives
            .iter()
            .any(|slot| self.attempt_slot(slot, candidate))
    }

    fn check_slot(&mut self, slot: &Slot, candidate: &TypeRef) -> bool {
        if slot.check_name {
            let same = Arc::ptr_eq(&slot.ty, candidate);
            self.push_step(
                CheckAction::NameCheck,
                &slot.ty,
                candidate,
                if same { "same node" } else { "different node" }.into(),
            );
            same
        } else {
            self.check(&slot.ty, candidate)
        }
    }

    fn attempt_slot(&mut self, slot: &Slot, candidate: &TypeRef) -> bool {
        let saved = self.subst.clone();
        let ok = self.check_slot(slot, candidate);
        if !ok {
            *self.subst = saved;
        }
        ok
    }

    /// Run a sub-check, rolling back any bindings it made if it fails.
    fn attempt(&mut self, pattern: &TypeRef, candidate: &TypeRef) -> bool {
        let saved = self.subst.clone();
        let ok = self.check(pattern, candidate);
        if !ok {
            *self.subst = saved;
        }
        ok
    }

    fn is_same_var(&self, ty: &TypeRef, var: TypeVarId) -> bool {
        matches!(&*self.subst.resolve(ty), Type::Variable(v) if *v == var)
    }

    fn push_step(
        &mut self,
        action: CheckAction,
        pattern: &TypeRef,
        candidate: &TypeRef,
        detail: String,
    ) {
        if self.options.trace {
            let step = self.trace.len() + 1;
            self.trace.push(CheckStep {
                step,
                action,
                pattern: pattern.to_string(),
                candidate: candidate.to_string(),
                detail,
            });
        }
    }
}

fn interval_within(lwb: f64, upb: f64, c_lwb: f64, c_upb: f64) -> bool {
    c_upb <= upb && c_lwb >= lwb
}

/// A flag the pattern cares about must match; the candidate's "don't care"
/// counts as `false`.
fn flag_ok(pattern: Option<bool>, candidate: Option<bool>) -> bool {
    match pattern {
        None => true,
        Some(want) => candidate.unwrap_or(false) == want,
    }
}

fn discrete_accepts(p: &DiscreteType, c: &DiscreteType) -> bool {
    if c.upb > p.upb || c.lwb < p.lwb {
        return false;
    }
    if !flag_ok(p.cyclic, c.cyclic) {
        return false;
    }
    if let Some(want) = p.ordered {
        if c.ordered != Some(want) {
            return false;
        }
    }
    match (&p.symbols, &c.symbols) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(Symbols::Unspecified), Some(_)) => true,
        (Some(Symbols::Known(_)), Some(Symbols::Unspecified)) => false,
        (Some(Symbols::Known(want)), Some(Symbols::Known(have))) => {
            want.len() == have.len()
                && want
                    .iter()
                    .zip(have)
                    .all(|(w, h)| w.is_none() || w == h)
        }
    }
}
