//! Diagnostics for the lattix type and value layers.
//!
//! Errors raised by `lattix-types` and `lattix-value` are converted into a
//! [`Diagnostic`] so hosts can render shape and resource failures uniformly.
//! Range problems and unification conflicts are not diagnostics: they show up
//! as an invalid status or a `false` membership result.

use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Diagnostic severity and categories
// ---------------------------------------------------------------------------

/// How severe a diagnostic is. Every failure at this layer is an error;
/// the field is serialized so hosts can merge these with their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
}

/// Broad category for diagnostics. Used for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A value's runtime variant is not the one an operation assumes.
    ShapeMismatch,
    /// An element index outside `0..len`.
    IndexOutOfRange,
    /// Two sequences that must line up do not.
    LengthMismatch,
    /// An argument rejected by a function's parameter type.
    ArgumentType,
    /// A status that cannot be attached to a scalar.
    InvalidStatus,
    /// A declared type rejected by the type it must inhabit.
    TypeMismatch,
    /// An operation that needs at least one element got none.
    EmptyInput,
    /// The operation is not provided by this implementation.
    Unsupported,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::ShapeMismatch,
        Category::IndexOutOfRange,
        Category::LengthMismatch,
        Category::ArgumentType,
        Category::InvalidStatus,
        Category::TypeMismatch,
        Category::EmptyInput,
        Category::Unsupported,
    ];

    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::ShapeMismatch => "shape_mismatch",
            Category::IndexOutOfRange => "index_out_of_range",
            Category::LengthMismatch => "length_mismatch",
            Category::ArgumentType => "argument_type",
            Category::InvalidStatus => "invalid_status",
            Category::TypeMismatch => "type_mismatch",
            Category::EmptyInput => "empty_input",
            Category::Unsupported => "unsupported",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Category::ShapeMismatch => "L0001",
            Category::IndexOutOfRange => "L0002",
            Category::LengthMismatch => "L0003",
            Category::ArgumentType => "L0004",
            Category::InvalidStatus => "L0005",
            Category::TypeMismatch => "L0006",
            Category::EmptyInput => "L0007",
            Category::Unsupported => "L0100",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::ShapeMismatch => "A value does not have the shape the operation expects.",
            Category::IndexOutOfRange => "An element index lies outside the sequence.",
            Category::LengthMismatch => "Sequences that must have equal length do not.",
            Category::ArgumentType => "A function argument is not a member of its parameter type.",
            Category::InvalidStatus => "The status cannot be attached to a scalar value.",
            Category::TypeMismatch => "A type is not a member of the type it must inhabit.",
            Category::EmptyInput => "The operation needs at least one element.",
            Category::Unsupported => "The value does not implement this operation.",
        }
    }

    pub fn example_fix(self) -> &'static str {
        match self {
            Category::ShapeMismatch => "Check the value's type with a membership test first.",
            Category::IndexOutOfRange => "Keep indices below the reported length.",
            Category::LengthMismatch => "Trim or pad the shorter sequence before combining.",
            Category::ArgumentType => "Convert the argument or pick a function with a wider type.",
            Category::InvalidStatus => "Use Proper, Invalid, Unobserved, Irrelevant or Intervened.",
            Category::TypeMismatch => "Widen the expected type or narrow the supplied one.",
            Category::EmptyInput => "Guard the call with a length check.",
            Category::Unsupported => "Use a concrete implementation that overrides the operation.",
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic message.
///
/// There are no source spans at this layer; instead a diagnostic carries
/// `key = value` context pairs (requested index, backing length, rendered
/// types) that are enough to locate the misuse.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Stable diagnostic code (e.g. L0001), taken from the category.
    pub code: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub context: Vec<(String, String)>,
    pub help: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            code: category.code(),
            severity,
            category,
            message: message.into(),
            context: Vec::new(),
            help: None,
        }
    }

    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.push((key.into(), value.to_string()));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Look up a context entry by key.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
        };
        write!(f, "{prefix}[{}]: {}", self.code, self.message)?;
        for (key, value) in &self.context {
            write!(f, "\n  {key} = {value}")?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error type for crates that produce diagnostics
// ---------------------------------------------------------------------------

/// Error type wrapping one or more diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .0.first().map(|d| d.to_string()).unwrap_or_default())]
pub struct DiagnosticError(pub Vec<Diagnostic>);

impl DiagnosticError {
    pub fn single(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }

    pub fn multiple(diags: Vec<Diagnostic>) -> Self {
        Self(diags)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }

    /// Category of the first diagnostic, if any.
    pub fn category(&self) -> Option<Category> {
        self.0.first().map(|d| d.category)
    }
}

impl From<Diagnostic> for DiagnosticError {
    fn from(diag: Diagnostic) -> Self {
        Self::single(diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_builder() {
        let diag = Diagnostic::error(Category::IndexOutOfRange, "index 7 out of range")
            .with_context("index", 7)
            .with_context("len", 5)
            .with_help("Keep indices below 5");

        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code, "L0002");
        assert_eq!(diag.category, Category::IndexOutOfRange);
        assert_eq!(diag.context_value("len"), Some("5"));
        assert_eq!(diag.context_value("missing"), None);
        assert!(diag.help.unwrap().contains("below 5"));
    }

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::error(Category::LengthMismatch, "weights do not line up")
            .with_context("expected", 3)
            .with_context("found", 4);
        let s = format!("{diag}");
        assert_eq!(
            s,
            "error[L0003]: weights do not line up\n  expected = 3\n  found = 4"
        );
    }

    #[test]
    fn error_wraps_first_diagnostic() {
        let err = DiagnosticError::multiple(vec![
            Diagnostic::error(Category::ShapeMismatch, "expected vector"),
            Diagnostic::error(Category::Unsupported, "ignored"),
        ]);
        assert_eq!(err.category(), Some(Category::ShapeMismatch));
        assert_eq!(err.diagnostics().len(), 2);
        assert!(err.to_string().starts_with("error[L0001]: expected vector"));
        assert_eq!(DiagnosticError::multiple(Vec::new()).to_string(), "");
    }

    #[test]
    fn diagnostic_serializes_snake_case() {
        let diag = Diagnostic::error(Category::ArgumentType, "bad argument");
        let json = serde_json::to_value(&diag).expect("serialize");
        assert_eq!(json["category"], "argument_type");
        assert_eq!(json["severity"], "error");
    }

    #[test]
    fn category_metadata_is_stable_and_unique() {
        let mut codes = std::collections::BTreeSet::new();
        for cat in Category::all() {
            assert!(!cat.as_str().is_empty());
            assert!(!cat.description().is_empty());
            assert!(!cat.example_fix().is_empty());
            assert!(
                codes.insert(cat.code()),
                "duplicate diagnostic code detected: {}",
                cat.code()
            );
        }
    }
}
