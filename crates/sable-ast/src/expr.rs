//! Expression AST nodes.

use sable_core::{Mode, Span};

use crate::NodeId;

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value.
    Literal(LiteralExpr<'ast>),
    /// The receiver of the current routine.
    SelfExpr(Span),
    /// Unqualified name: parameter, local, or an implicit self-call.
    Name(NameExpr<'ast>),
    /// Qualified or unqualified call.
    Call(&'ast CallExpr<'ast>),
    /// The bound exception inside a handler arm.
    Exception(Span),
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::SelfExpr(span) => *span,
            Self::Name(e) => e.span,
            Self::Call(e) => e.span,
            Self::Exception(span) => *span,
        }
    }
}

/// A literal expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub span: Span,
}

/// Literal kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    Int(i64),
    Flt(f64),
    Bool(bool),
    Char(char),
    Str(&'ast str),
}

/// An unqualified name use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameExpr<'ast> {
    pub name: &'ast str,
    pub id: NodeId,
    pub span: Span,
}

/// A call. Binary operators arrive from the parser already rewritten into
/// calls, so this is the only application form the core sees. Iterator
/// calls are calls whose name ends in `!`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    /// Receiver; `None` means an unqualified call on the current class.
    pub receiver: Option<&'ast Expr<'ast>>,
    pub name: &'ast str,
    pub args: &'ast [CallArg<'ast>],
    pub id: NodeId,
    pub span: Span,
}

/// One call argument with its declared passing mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallArg<'ast> {
    pub mode: Mode,
    pub expr: &'ast Expr<'ast>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    #[test]
    fn expr_spans() {
        let arena = Bump::new();
        let lit = Expr::Literal(LiteralExpr {
            kind: LiteralKind::Int(42),
            span: Span::new(1, 5, 2),
        });
        assert_eq!(lit.span(), Span::new(1, 5, 2));

        let call = arena.alloc(CallExpr {
            receiver: None,
            name: "m",
            args: &[],
            id: NodeId(0),
            span: Span::new(2, 1, 3),
        });
        assert_eq!(Expr::Call(call).span(), Span::new(2, 1, 3));
    }
}
