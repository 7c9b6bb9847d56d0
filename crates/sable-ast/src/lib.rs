//! Located AST consumed by the semantic core.
//!
//! The parser is an external collaborator; this crate defines the node
//! shapes it must produce. Nodes are arena-allocated (`bumpalo`) and
//! modeled as closed tagged-variant sum types per category, so the passes
//! use exhaustive matches instead of per-kind virtual dispatch.
//!
//! Passes never decorate nodes. Every node a pass needs to attach results
//! to carries a [`NodeId`] assigned at construction, and results live in
//! side tables keyed by it.

pub mod builder;
pub mod decl;
pub mod expr;
pub mod stmt;

pub use builder::AstBuilder;
pub use decl::{
    ClassDecl, ClassKindSpec, IterDecl, Member, ParamDecl, RoutineDecl, SourceUnit, TypeSpec,
};
pub use expr::{CallArg, CallExpr, Expr, LiteralExpr, LiteralKind, NameExpr};
pub use stmt::{
    AssignStmt, Block, BreakStmt, CaseArm, CaseStmt, ExprStmt, IfStmt, LocalDeclStmt, LoopStmt,
    ProtectStmt, RaiseStmt, ReturnStmt, Stmt, TypecaseArm, TypecaseStmt, WhenArm, YieldStmt,
};

/// Stable identity of an AST node, assigned by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);
