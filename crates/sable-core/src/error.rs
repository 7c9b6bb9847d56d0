//! Error types for the semantic core.
//!
//! Two public families: [`RegistryError`] for type/method table operations
//! and [`SemanticError`] for everything the passes report. Both render to
//! diagnostic messages; neither is ever allowed to unwind a pass.
//! [`LookupError`] is the one internal non-local exit: it is returned by a
//! single check-and-declare call in element creation and converted to a
//! diagnostic immediately at the call site.

use thiserror::Error;

use crate::Span;

/// Errors from the type registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// A type with this name already exists.
    #[error("duplicate type '{name}'")]
    DuplicateType { name: String },

    /// A method with an identical signature already exists on the owner.
    #[error("duplicate method '{name}' on '{owner}'")]
    DuplicateMethod { name: String, owner: String },

    /// A name did not resolve to a registered type.
    #[error("unknown type '{name}'")]
    UnknownType { name: String },
}

/// Errors reported by the compilation passes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("unknown type '{name}'")]
    UnknownType { name: String, span: Span },

    #[error("redefinition of builtin type '{name}'")]
    BuiltinRedefinition { name: String, span: Span },

    #[error("duplicate class '{name}'")]
    DuplicateClass { name: String, span: Span },

    #[error("supertype '{supertype}' of '{class}' is not abstract")]
    NonAbstractSupertype {
        supertype: String,
        class: String,
        span: Span,
    },

    #[error("circular supertype chain involving '{name}'")]
    CircularSupertype { name: String, span: Span },

    #[error("signature of '{name}' conflicts with '{existing}' in '{class}'")]
    SignatureConflict {
        name: String,
        existing: String,
        class: String,
        span: Span,
    },

    #[error("no implementation of '{method}' required by '{abstract_type}' in '{class}'")]
    NoImplementation {
        method: String,
        abstract_type: String,
        class: String,
        span: Span,
    },

    #[error("unresolved call '{name}' on '{receiver}'")]
    UnresolvedCall {
        name: String,
        receiver: String,
        span: Span,
    },

    #[error("ambiguous call '{name}' on '{receiver}'")]
    AmbiguousCall {
        name: String,
        receiver: String,
        span: Span,
    },

    #[error("'{mode}' argument must be an assignable local")]
    UnassignableArgument { mode: &'static str, span: Span },

    #[error("local '{name}' shadows an enclosing declaration")]
    ShadowedLocal { name: String, span: Span },

    #[error("type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("'yield' outside an iterator body")]
    YieldOutsideIter { span: Span },

    #[error("'return' inside an iterator body")]
    ReturnInsideIter { span: Span },

    #[error("'break' outside a loop")]
    BreakOutsideLoop { span: Span },

    #[error("iterator call outside a loop")]
    IterCallOutsideLoop { span: Span },

    #[error("'exception' outside an exception handler")]
    ExceptionOutsideHandler { span: Span },

    #[error("'protect' requires at least one 'when' arm or an 'else'")]
    ProtectWithoutHandler { span: Span },

    #[error("executable target requires a parameterless void 'main' in class 'MAIN'")]
    MissingEntryPoint { span: Span },
}

impl SemanticError {
    /// The location this error points at.
    pub fn span(&self) -> Span {
        match self {
            SemanticError::UnknownType { span, .. }
            | SemanticError::BuiltinRedefinition { span, .. }
            | SemanticError::DuplicateClass { span, .. }
            | SemanticError::NonAbstractSupertype { span, .. }
            | SemanticError::CircularSupertype { span, .. }
            | SemanticError::SignatureConflict { span, .. }
            | SemanticError::NoImplementation { span, .. }
            | SemanticError::UnresolvedCall { span, .. }
            | SemanticError::AmbiguousCall { span, .. }
            | SemanticError::UnassignableArgument { span, .. }
            | SemanticError::ShadowedLocal { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::YieldOutsideIter { span }
            | SemanticError::ReturnInsideIter { span }
            | SemanticError::BreakOutsideLoop { span }
            | SemanticError::IterCallOutsideLoop { span }
            | SemanticError::ExceptionOutsideHandler { span }
            | SemanticError::ProtectWithoutHandler { span }
            | SemanticError::MissingEntryPoint { span } => *span,
        }
    }
}

/// Local non-local exit for the declare-with-checks path in element
/// creation. Never propagates past the one call that produces it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// The new signature conflicts with an already-declared sibling.
    #[error("conflicts with '{existing}'")]
    Conflict { existing: String },

    /// A parameter or return specifier did not resolve; the member is
    /// skipped and the specifier error was already reported.
    #[error("unresolved specifier")]
    Unresolved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_errors_render_with_location() {
        let err = SemanticError::NoImplementation {
            method: "foo".into(),
            abstract_type: "$A".into(),
            class: "C".into(),
            span: Span::new(3, 1, 3),
        };
        assert_eq!(
            err.to_string(),
            "no implementation of 'foo' required by '$A' in 'C'"
        );
        assert_eq!(err.span(), Span::new(3, 1, 3));
    }

    #[test]
    fn registry_error_renders() {
        let err = RegistryError::DuplicateType { name: "INT".into() };
        assert_eq!(err.to_string(), "duplicate type 'INT'");
    }
}
