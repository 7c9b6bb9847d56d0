//! Programmatic AST construction.
//!
//! The parser normally produces the tree; tests and tools build one
//! through [`AstBuilder`] instead. The builder owns node-id assignment so
//! side tables keyed by [`NodeId`] stay collision-free.

use std::cell::Cell;

use bumpalo::Bump;
use sable_core::{Mode, Span};

use crate::NodeId;
use crate::decl::{
    ClassDecl, ClassKindSpec, IterDecl, Member, ParamDecl, RoutineDecl, SourceUnit, TypeSpec,
};
use crate::expr::{CallArg, CallExpr, Expr, LiteralExpr, LiteralKind, NameExpr};
use crate::stmt::{
    AssignStmt, Block, BreakStmt, CaseArm, CaseStmt, ExprStmt, IfStmt, LocalDeclStmt, LoopStmt,
    ProtectStmt, RaiseStmt, ReturnStmt, Stmt, TypecaseArm, TypecaseStmt, WhenArm, YieldStmt,
};

/// Builds arena-allocated AST nodes with fresh node ids.
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    next_id: Cell<u32>,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            next_id: Cell::new(0),
        }
    }

    fn node_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn str(&self, s: &str) -> &'ast str {
        self.arena.alloc_str(s)
    }

    // ==========================================================================
    // Types and declarations
    // ==========================================================================

    pub fn type_spec(&self, name: &str) -> TypeSpec<'ast> {
        TypeSpec {
            name: self.str(name),
            span: Span::default(),
        }
    }

    pub fn param(&self, name: &str, mode: Mode, ty: &str) -> ParamDecl<'ast> {
        ParamDecl {
            name: self.str(name),
            mode,
            ty: self.type_spec(ty),
            span: Span::default(),
        }
    }

    pub fn params(&self, params: Vec<ParamDecl<'ast>>) -> &'ast [ParamDecl<'ast>] {
        self.arena.alloc_slice_clone(&params)
    }

    pub fn routine(
        &self,
        name: &str,
        params: Vec<ParamDecl<'ast>>,
        return_type: Option<&str>,
        body: Option<Block<'ast>>,
    ) -> Member<'ast> {
        Member::Routine(self.arena.alloc(RoutineDecl {
            name: self.str(name),
            params: self.params(params),
            return_type: return_type.map(|t| self.type_spec(t)),
            body,
            id: self.node_id(),
            span: Span::default(),
        }))
    }

    pub fn iter(
        &self,
        name: &str,
        params: Vec<ParamDecl<'ast>>,
        return_type: Option<&str>,
        body: Option<Block<'ast>>,
    ) -> Member<'ast> {
        Member::Iter(self.arena.alloc(IterDecl {
            name: self.str(name),
            params: self.params(params),
            return_type: return_type.map(|t| self.type_spec(t)),
            body,
            id: self.node_id(),
            span: Span::default(),
        }))
    }

    pub fn class(
        &self,
        name: &str,
        kind: ClassKindSpec,
        supertypes: Vec<&str>,
        subtypes: Vec<&str>,
        members: Vec<Member<'ast>>,
    ) -> ClassDecl<'ast> {
        let supers: Vec<TypeSpec<'ast>> = supertypes.iter().map(|s| self.type_spec(s)).collect();
        let subs: Vec<TypeSpec<'ast>> = subtypes.iter().map(|s| self.type_spec(s)).collect();
        ClassDecl {
            name: self.str(name),
            kind,
            supertypes: self.arena.alloc_slice_clone(&supers),
            subtypes: self.arena.alloc_slice_clone(&subs),
            members: self.arena.alloc_slice_clone(&members),
            span: Span::default(),
        }
    }

    pub fn unit(&self, classes: Vec<ClassDecl<'ast>>) -> SourceUnit<'ast> {
        SourceUnit {
            classes: self.arena.alloc_slice_clone(&classes),
            span: Span::default(),
        }
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    pub fn int(&self, value: i64) -> &'ast Expr<'ast> {
        self.arena.alloc(Expr::Literal(LiteralExpr {
            kind: LiteralKind::Int(value),
            span: Span::default(),
        }))
    }

    pub fn bool_lit(&self, value: bool) -> &'ast Expr<'ast> {
        self.arena.alloc(Expr::Literal(LiteralExpr {
            kind: LiteralKind::Bool(value),
            span: Span::default(),
        }))
    }

    pub fn str_lit(&self, value: &str) -> &'ast Expr<'ast> {
        let value = self.str(value);
        self.arena.alloc(Expr::Literal(LiteralExpr {
            kind: LiteralKind::Str(value),
            span: Span::default(),
        }))
    }

    pub fn self_expr(&self) -> &'ast Expr<'ast> {
        self.arena.alloc(Expr::SelfExpr(Span::default()))
    }

    pub fn exception(&self) -> &'ast Expr<'ast> {
        self.arena.alloc(Expr::Exception(Span::default()))
    }

    pub fn name(&self, name: &str) -> &'ast Expr<'ast> {
        self.arena.alloc(Expr::Name(NameExpr {
            name: self.str(name),
            id: self.node_id(),
            span: Span::default(),
        }))
    }

    pub fn arg(&self, expr: &'ast Expr<'ast>) -> CallArg<'ast> {
        CallArg {
            mode: Mode::In,
            expr,
        }
    }

    pub fn arg_mode(&self, mode: Mode, expr: &'ast Expr<'ast>) -> CallArg<'ast> {
        CallArg { mode, expr }
    }

    pub fn call(
        &self,
        receiver: Option<&'ast Expr<'ast>>,
        name: &str,
        args: Vec<CallArg<'ast>>,
    ) -> &'ast Expr<'ast> {
        let call = self.arena.alloc(CallExpr {
            receiver,
            name: self.str(name),
            args: self.arena.alloc_slice_clone(&args),
            id: self.node_id(),
            span: Span::default(),
        });
        self.arena.alloc(Expr::Call(call))
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    pub fn block(&self, stmts: Vec<Stmt<'ast>>) -> Block<'ast> {
        Block {
            stmts: self.arena.alloc_slice_clone(&stmts),
            span: Span::default(),
        }
    }

    pub fn expr_stmt(&self, expr: &'ast Expr<'ast>) -> Stmt<'ast> {
        Stmt::Expr(ExprStmt {
            expr,
            span: Span::default(),
        })
    }

    pub fn local(&self, name: &str, ty: &str, init: Option<&'ast Expr<'ast>>) -> Stmt<'ast> {
        Stmt::LocalDecl(self.arena.alloc(LocalDeclStmt {
            name: self.str(name),
            ty: self.type_spec(ty),
            init,
            id: self.node_id(),
            span: Span::default(),
        }))
    }

    pub fn assign(&self, target: &str, value: &'ast Expr<'ast>) -> Stmt<'ast> {
        Stmt::Assign(self.arena.alloc(AssignStmt {
            target: self.str(target),
            target_id: self.node_id(),
            value,
            span: Span::default(),
        }))
    }

    pub fn if_stmt(
        &self,
        cond: &'ast Expr<'ast>,
        then_block: Block<'ast>,
        else_block: Option<Block<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::If(self.arena.alloc(IfStmt {
            cond,
            then_block,
            else_block,
            span: Span::default(),
        }))
    }

    pub fn loop_stmt(&self, body: Block<'ast>) -> Stmt<'ast> {
        Stmt::Loop(self.arena.alloc(LoopStmt {
            body,
            span: Span::default(),
        }))
    }

    pub fn case_arm(&self, values: Vec<&'ast Expr<'ast>>, body: Block<'ast>) -> CaseArm<'ast> {
        CaseArm {
            values: self.arena.alloc_slice_clone(&values),
            body,
            span: Span::default(),
        }
    }

    pub fn case(
        &self,
        subject: &'ast Expr<'ast>,
        arms: Vec<CaseArm<'ast>>,
        else_block: Option<Block<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::Case(self.arena.alloc(CaseStmt {
            subject,
            arms: self.arena.alloc_slice_clone(&arms),
            else_block,
            id: self.node_id(),
            span: Span::default(),
        }))
    }

    pub fn typecase_arm(&self, ty: &str, body: Block<'ast>) -> TypecaseArm<'ast> {
        TypecaseArm {
            ty: self.type_spec(ty),
            body,
            id: self.node_id(),
            span: Span::default(),
        }
    }

    pub fn typecase(
        &self,
        subject: &str,
        arms: Vec<TypecaseArm<'ast>>,
        else_block: Option<Block<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::Typecase(self.arena.alloc(TypecaseStmt {
            subject: self.str(subject),
            subject_id: self.node_id(),
            arms: self.arena.alloc_slice_clone(&arms),
            else_block,
            span: Span::default(),
        }))
    }

    pub fn when_arm(&self, ty: &str, body: Block<'ast>) -> WhenArm<'ast> {
        WhenArm {
            ty: self.type_spec(ty),
            body,
            id: self.node_id(),
            span: Span::default(),
        }
    }

    pub fn protect(
        &self,
        body: Block<'ast>,
        whens: Vec<WhenArm<'ast>>,
        else_block: Option<Block<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::Protect(self.arena.alloc(ProtectStmt {
            body,
            whens: self.arena.alloc_slice_clone(&whens),
            else_block,
            id: self.node_id(),
            span: Span::default(),
        }))
    }

    pub fn raise(&self, value: &'ast Expr<'ast>) -> Stmt<'ast> {
        Stmt::Raise(self.arena.alloc(RaiseStmt {
            value,
            span: Span::default(),
        }))
    }

    pub fn ret(&self, value: Option<&'ast Expr<'ast>>) -> Stmt<'ast> {
        Stmt::Return(ReturnStmt {
            value,
            span: Span::default(),
        })
    }

    pub fn yield_stmt(&self, value: Option<&'ast Expr<'ast>>) -> Stmt<'ast> {
        Stmt::Yield(YieldStmt {
            value,
            id: self.node_id(),
            span: Span::default(),
        })
    }

    pub fn break_stmt(&self) -> Stmt<'ast> {
        Stmt::Break(BreakStmt {
            span: Span::default(),
        })
    }
}
