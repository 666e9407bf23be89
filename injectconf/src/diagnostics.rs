//! Build diagnostics.
//!
//! Every warning and error the analyzer reports lands in a [`Diagnostics`]
//! sink and is mirrored to `tracing`. Items local to one site or one
//! representation are reported here and dropped; they never abort the run.

use std::fmt;

use serde::Serialize;

use crate::model::ElementId;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; does not block generation.
    Warning,
    /// Build-reported error; the offending item was skipped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Location the problem is attached to, if any.
    pub element: Option<ElementId>,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            Some(element) => write!(f, "{}: {} [{element}]", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Append-only diagnostic sink.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn warning(&mut self, element: Option<&ElementId>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(element = element.map(ElementId::as_str), "{message}");
        self.push(Severity::Warning, element, message);
    }

    /// Records an error.
    pub fn error(&mut self, element: Option<&ElementId>, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(element = element.map(ElementId::as_str), "{message}");
        self.push(Severity::Error, element, message);
    }

    fn push(&mut self, severity: Severity, element: Option<&ElementId>, message: String) {
        self.entries.push(Diagnostic {
            severity,
            element: element.cloned(),
            message,
        });
    }

    /// Moves every entry of `other` into this sink.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Returns `true` when at least one error was reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.severity == Severity::Error)
    }

    /// Recorded entries, in report order.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Entries of one severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(move |entry| entry.severity == severity)
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
