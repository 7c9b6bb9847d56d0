//! Accumulating diagnostics sink.
//!
//! All problems found by the semantic core are collected here as located
//! Error/Warning diagnostics; nothing escapes the passes as control flow.
//! The driver polls [`Diagnostics::error_count`] between passes and aborts
//! the pipeline when it is non-zero, because later passes rely on the
//! invariants earlier passes establish.

use std::fmt;

use crate::Span;

/// Severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One located diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: at {}: {}", tag, self.span, self.message)
    }
}

/// Ordered collection of diagnostics with a running error count.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diags: Vec<Diagnostic>,
    errors: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diags.push(Diagnostic {
            severity: Severity::Error,
            span,
            message: message.into(),
        });
        self.errors += 1;
    }

    /// Record a warning.
    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.diags.push(Diagnostic {
            severity: Severity::Warning,
            span,
            message: message.into(),
        });
    }

    /// Number of errors recorded so far. Warnings do not count.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Whether any error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// All diagnostics in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    /// Drain all diagnostics, resetting the error count.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.errors = 0;
        std::mem::take(&mut self.diags)
    }

    /// Error messages only. Convenience for tests.
    pub fn error_messages(&self) -> Vec<&str> {
        self.diags
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.message.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut diags = Diagnostics::new();
        diags.warning(Span::default(), "suspicious");
        assert_eq!(diags.error_count(), 0);
        assert!(!diags.has_errors());

        diags.error(Span::new(2, 3, 1), "broken");
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn take_resets_the_count() {
        let mut diags = Diagnostics::new();
        diags.error(Span::default(), "broken");
        let taken = diags.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(diags.error_count(), 0);
        assert!(diags.is_empty());
    }

    #[test]
    fn display_includes_location() {
        let mut diags = Diagnostics::new();
        diags.error(Span::new(4, 7, 2), "unknown type 'FOO'");
        let rendered = diags.iter().next().unwrap().to_string();
        assert_eq!(rendered, "error: at 4:7: unknown type 'FOO'");
    }
}
