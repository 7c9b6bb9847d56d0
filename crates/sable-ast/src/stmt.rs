//! Statement AST nodes.

use sable_core::Span;

use crate::NodeId;
use crate::decl::TypeSpec;
use crate::expr::Expr;

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// Expression evaluated for effect (a void call).
    Expr(ExprStmt<'ast>),
    /// Local variable declaration.
    LocalDecl(&'ast LocalDeclStmt<'ast>),
    /// Assignment to a local or an implicit setter call.
    Assign(&'ast AssignStmt<'ast>),
    /// Two-way conditional.
    If(&'ast IfStmt<'ast>),
    /// Unbounded loop, exited by `break` or iterator exhaustion.
    Loop(&'ast LoopStmt<'ast>),
    /// Value dispatch via delegated equality tests.
    Case(&'ast CaseStmt<'ast>),
    /// Runtime type dispatch with per-arm narrowing.
    Typecase(&'ast TypecaseStmt<'ast>),
    /// Structured exception region.
    Protect(&'ast ProtectStmt<'ast>),
    /// Raise an exception value.
    Raise(&'ast RaiseStmt<'ast>),
    Return(ReturnStmt<'ast>),
    Yield(YieldStmt<'ast>),
    Break(BreakStmt),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Expr(s) => s.span,
            Self::LocalDecl(s) => s.span,
            Self::Assign(s) => s.span,
            Self::If(s) => s.span,
            Self::Loop(s) => s.span,
            Self::Case(s) => s.span,
            Self::Typecase(s) => s.span,
            Self::Protect(s) => s.span,
            Self::Raise(s) => s.span,
            Self::Return(s) => s.span,
            Self::Yield(s) => s.span,
            Self::Break(s) => s.span,
        }
    }
}

/// A sequence of statements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

/// An expression statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}

/// A local declaration. Must not shadow a parameter or enclosing local.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalDeclStmt<'ast> {
    pub name: &'ast str,
    pub ty: TypeSpec<'ast>,
    pub init: Option<&'ast Expr<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

/// `name := value`. When `name` is neither a parameter nor a local, the
/// assignment resolves like an implicit self-call against a one-argument
/// setter-shaped signature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignStmt<'ast> {
    pub target: &'ast str,
    pub target_id: NodeId,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub cond: &'ast Expr<'ast>,
    pub then_block: Block<'ast>,
    pub else_block: Option<Block<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopStmt<'ast> {
    pub body: Block<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseStmt<'ast> {
    pub subject: &'ast Expr<'ast>,
    pub arms: &'ast [CaseArm<'ast>],
    pub else_block: Option<Block<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseArm<'ast> {
    pub values: &'ast [&'ast Expr<'ast>],
    pub body: Block<'ast>,
    pub span: Span,
}

/// `typecase x when T then ... end`. The subject must name a parameter or
/// local; each arm rebinds it with a narrowed (or widened) type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypecaseStmt<'ast> {
    pub subject: &'ast str,
    pub subject_id: NodeId,
    pub arms: &'ast [TypecaseArm<'ast>],
    pub else_block: Option<Block<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypecaseArm<'ast> {
    pub ty: TypeSpec<'ast>,
    pub body: Block<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// `protect ... when T then ... else ... end`. Must carry at least one
/// `when` arm or an `else`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtectStmt<'ast> {
    pub body: Block<'ast>,
    pub whens: &'ast [WhenArm<'ast>],
    pub else_block: Option<Block<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhenArm<'ast> {
    pub ty: TypeSpec<'ast>,
    pub body: Block<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaiseStmt<'ast> {
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakStmt {
    pub span: Span,
}
