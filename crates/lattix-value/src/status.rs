use std::fmt;

use serde::{Deserialize, Serialize};

/// Why (or whether) a scalar's payload can be trusted.
///
/// A plain enum, so equality is by value on both sides of any copy or
/// serialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Status is meaningless for this kind of value (tuples, vectors).
    NotApplicable,
    /// Observed, relevant and within range.
    Proper,
    /// Outside the declared bounds of the value's type.
    Invalid,
    /// Missing at acquisition time.
    Unobserved,
    /// Present, possibly in range, but meaningless in context.
    Irrelevant,
    /// Set by a causal intervention rather than observed.
    Intervened,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::NotApplicable,
        Status::Proper,
        Status::Invalid,
        Status::Unobserved,
        Status::Irrelevant,
        Status::Intervened,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Status::NotApplicable => "Not implemented or undefined.",
            Status::Proper => "Proper value.",
            Status::Invalid => "Value out of range.",
            Status::Unobserved => "Unobserved value.",
            Status::Irrelevant => "Irrelevant or nonsensical value.",
            Status::Intervened => "A Causal intervention has occured.",
        }
    }

    pub fn is_proper(self) -> bool {
        self == Status::Proper
    }

    /// Suffix appended when rendering a scalar with this status.
    pub fn flag(self) -> Option<String> {
        match self {
            Status::Proper => None,
            Status::Intervened => Some("*I*".to_string()),
            Status::Unobserved => Some("*M*".to_string()),
            other => Some(format!("*{}*", other.description())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
