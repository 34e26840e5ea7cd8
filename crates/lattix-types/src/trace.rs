//! Step-by-step traces of subtype checks.
//!
//! Tracing is opt-in through [`crate::CheckOptions::trace`]; nothing is
//! recorded (or rendered) when it is off.

use serde::Serialize;

/// A single step in a check trace.
#[derive(Debug, Clone, Serialize)]
pub struct CheckStep {
    pub step: usize,
    pub action: CheckAction,
    pub pattern: String,
    pub candidate: String,
    pub detail: String,
}

/// What the checker did at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckAction {
    /// Same node, or the same variable on both sides.
    Identity,
    /// Structural recursion into nested types.
    Decompose,
    /// Unbound variable bound (e.g. t0 := Discrete).
    Bind,
    /// Candidate variable rebound to a narrower pattern.
    Tighten,
    /// Existing binding already compatible.
    Keep,
    /// Slot compared by identity.
    NameCheck,
    /// Recursion limit hit; the check fails.
    DepthExceeded,
    /// Candidate rejected.
    Reject,
}
