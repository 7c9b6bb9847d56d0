//! Pass 3: checking and resolution.
//!
//! Walks every routine and iterator body: binds names through the scope
//! stack, rewrites unqualified uses into implicit self-calls, resolves
//! every call site through mode-driven overload resolution, numbers
//! iterator resume points, and enforces the contextual rules (`yield`
//! only inside iterators, iterator calls only inside loops, `exception`
//! only inside handler arms, and so on). All results land in the
//! context's side tables; the AST is never touched.

use sable_ast::{
    Block, CallArg, CallExpr, ClassDecl, Expr, LiteralKind, Member, NodeId, SourceUnit, Stmt,
};
use sable_core::{MethodId, MethodSignature, Mode, ResumePoint, SemanticError, Span, TypeId};

use crate::context::{CallBinding, CompilationContext, IterCallInfo, NameResolution};
use crate::overload::{ArgInfo, ResolveError, resolve_call};
use crate::scope::ScopeStack;

pub struct Check<'ctx> {
    ctx: &'ctx mut CompilationContext,
}

impl<'ctx> Check<'ctx> {
    pub fn new(ctx: &'ctx mut CompilationContext) -> Self {
        Self { ctx }
    }

    pub fn run(mut self, unit: &SourceUnit<'_>) {
        for class in unit.classes {
            let Some(owner) = self.ctx.types.resolve_name(class.name) else {
                continue;
            };
            if self.ctx.class(owner).is_none() {
                continue;
            }
            self.check_class(owner, class);
        }
    }

    fn check_class(&mut self, class_id: TypeId, class: &ClassDecl<'_>) {
        for member in class.members {
            let (id, body) = match member {
                Member::Routine(r) => (r.id, r.body),
                Member::Iter(i) => (i.id, i.body),
            };
            let Some(body) = body else {
                continue;
            };
            let Some(&method) = self.ctx.member_methods.get(&id) else {
                continue;
            };
            BodyChecker::new(self.ctx, class_id, class.name, method).check(&body);
        }
    }
}

/// Checks one routine or iterator body.
struct BodyChecker<'ctx, 'n> {
    ctx: &'ctx mut CompilationContext,
    owner: TypeId,
    owner_name: &'n str,
    method: MethodId,
    sig: MethodSignature,
    scopes: ScopeStack,
    /// Index into `ctx.iters` when checking an iterator body.
    iter_index: Option<usize>,
    loop_depth: u32,
    /// Exception binding of each enclosing handler arm, innermost last.
    handlers: Vec<(u32, TypeId)>,
    yield_count: u32,
}

impl<'ctx, 'n> BodyChecker<'ctx, 'n> {
    fn new(
        ctx: &'ctx mut CompilationContext,
        owner: TypeId,
        owner_name: &'n str,
        method: MethodId,
    ) -> Self {
        let sig = ctx
            .types
            .method(method)
            .cloned()
            .expect("member method is registered");
        let iter_index = ctx.iter_by_method.get(&method).copied();
        Self {
            ctx,
            owner,
            owner_name,
            method,
            sig,
            scopes: ScopeStack::new(),
            iter_index,
            loop_depth: 0,
            handlers: Vec::new(),
            yield_count: 0,
        }
    }

    fn in_iter(&self) -> bool {
        self.iter_index.is_some()
    }

    fn check(mut self, body: &Block<'_>) {
        self.scopes.push();
        let params = self.sig.params.clone();
        for param in &params {
            if self.scopes.declare(&param.name, param.ty, true).is_err() {
                self.ctx.add_error(SemanticError::ShadowedLocal {
                    name: param.name.clone(),
                    span: body.span,
                });
            }
        }
        self.check_block(body);
        self.scopes.pop();
        self.ctx.frames.insert(self.method, self.scopes.slot_count());
    }

    fn check_block(&mut self, block: &Block<'_>) {
        self.scopes.push();
        for stmt in block.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop();
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn check_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Expr(s) => {
                if let Expr::Call(call) = s.expr {
                    self.check_call(call, Some(true));
                } else {
                    self.check_expr(s.expr);
                }
            }
            Stmt::LocalDecl(s) => {
                let ty = self.resolve_type(s.ty.name, s.ty.span);
                if let Some(init) = s.init {
                    let found = self.check_expr(init);
                    if let (Some(ty), Some(found)) = (ty, found)
                        && !self.ctx.types.subtype(found, ty)
                    {
                        self.type_mismatch(ty, found, init.span());
                    }
                }
                let Some(ty) = ty else {
                    return;
                };
                match self.scopes.declare(s.name, ty, false) {
                    Ok(slot) => {
                        self.ctx.local_slots.insert(s.id, slot);
                        // Iterator locals live past suspensions, so each
                        // becomes a field on the state holder.
                        if let Some(iter_index) = self.iter_index {
                            self.ctx.iters[iter_index]
                                .local_fields
                                .push((format!("local${slot}"), ty));
                        }
                    }
                    Err(()) => self.ctx.add_error(SemanticError::ShadowedLocal {
                        name: s.name.to_string(),
                        span: s.span,
                    }),
                }
            }
            Stmt::Assign(s) => {
                let value_ty = self.check_expr(s.value);
                match self.scopes.lookup(s.target) {
                    Some(var) => {
                        let (slot, ty) = (var.slot, var.ty);
                        if let Some(found) = value_ty
                            && !self.ctx.types.subtype(found, ty)
                        {
                            self.type_mismatch(ty, found, s.value.span());
                        }
                        self.ctx
                            .name_bindings
                            .insert(s.target_id, NameResolution::Local { slot, ty });
                    }
                    None => self.resolve_setter(s.target, s.target_id, value_ty, s.span),
                }
            }
            Stmt::If(s) => {
                let cond = self.check_expr(s.cond);
                if let Some(cond) = cond
                    && cond != self.ctx.well_known.bool_
                {
                    self.type_mismatch(self.ctx.well_known.bool_, cond, s.cond.span());
                }
                self.check_block(&s.then_block);
                if let Some(else_block) = &s.else_block {
                    self.check_block(else_block);
                }
            }
            Stmt::Loop(s) => {
                self.loop_depth += 1;
                self.check_block(&s.body);
                self.loop_depth -= 1;
            }
            Stmt::Case(s) => self.check_case(s),
            Stmt::Typecase(s) => self.check_typecase(s),
            Stmt::Protect(s) => self.check_protect(s),
            Stmt::Raise(s) => {
                self.check_expr(s.value);
            }
            Stmt::Return(s) => self.check_return(s.value, s.span),
            Stmt::Yield(s) => self.check_yield(s.value, s.id, s.span),
            Stmt::Break(s) => {
                // At lexical depth zero inside an iterator, `break` breaks
                // the caller's loop through the Break step tag.
                if self.loop_depth == 0 && !self.in_iter() {
                    self.ctx
                        .add_error(SemanticError::BreakOutsideLoop { span: s.span });
                }
            }
        }
    }

    fn check_case(&mut self, s: &sable_ast::CaseStmt<'_>) {
        let subject_ty = self.check_expr(s.subject);
        if let Some(subject_ty) = subject_ty {
            // Arm values compare through the subject's own equality; the
            // backend falls back to builtin equality when none resolves.
            let args = [ArgInfo {
                mode: Mode::In,
                ty: subject_ty,
            }];
            let binding = match resolve_call(&self.ctx.types, subject_ty, "is_eq", &args, Some(false))
            {
                Ok((method, via_container)) => Some(CallBinding {
                    method,
                    via_container,
                    virtual_dispatch: self.ctx.types.is_abstract(subject_ty),
                    receiver_type: subject_ty,
                    implicit_self: false,
                }),
                Err(_) => None,
            };
            self.ctx.case_eq.insert(s.id, binding);

            // The backend evaluates the subject once into a dedicated
            // slot and tests every arm against it.
            let slot = self.scopes.alloc_slot();
            self.ctx.case_subject_slots.insert(s.id, slot);
            if let Some(iter_index) = self.iter_index {
                self.ctx.iters[iter_index]
                    .local_fields
                    .push((format!("local${slot}"), subject_ty));
            }
        }
        for arm in s.arms {
            for value in arm.values {
                let value_ty = self.check_expr(value);
                if let (Some(subject_ty), Some(value_ty)) = (subject_ty, value_ty)
                    && !self.ctx.types.subtype(value_ty, subject_ty)
                {
                    self.type_mismatch(subject_ty, value_ty, value.span());
                }
            }
            self.check_block(&arm.body);
        }
        if let Some(else_block) = &s.else_block {
            self.check_block(else_block);
        }
    }

    fn check_typecase(&mut self, s: &sable_ast::TypecaseStmt<'_>) {
        let Some(var) = self.scopes.lookup(s.subject) else {
            self.ctx.add_error(SemanticError::UnresolvedCall {
                name: s.subject.to_string(),
                receiver: self.owner_name.to_string(),
                span: s.span,
            });
            return;
        };
        let (subject_slot, subject_ty) = (var.slot, var.ty);
        self.ctx.name_bindings.insert(
            s.subject_id,
            NameResolution::Local {
                slot: subject_slot,
                ty: subject_ty,
            },
        );
        for arm in s.arms {
            let Some(arm_ty) = self.resolve_type(arm.ty.name, arm.ty.span) else {
                self.check_block(&arm.body);
                continue;
            };
            // Rebind the subject for the arm: narrowed to the arm type,
            // or kept at its static type when that is already narrower.
            let bound_ty = if self.ctx.types.subtype(subject_ty, arm_ty) {
                subject_ty
            } else {
                arm_ty
            };
            self.scopes.push();
            let slot = self.scopes.declare_shadowing(s.subject, bound_ty, false);
            self.ctx.typecase_slots.insert(arm.id, (slot, arm_ty));
            self.check_block(&arm.body);
            self.scopes.pop();
        }
        if let Some(else_block) = &s.else_block {
            self.check_block(else_block);
        }
    }

    fn check_protect(&mut self, s: &sable_ast::ProtectStmt<'_>) {
        if s.whens.is_empty() && s.else_block.is_none() {
            self.ctx
                .add_error(SemanticError::ProtectWithoutHandler { span: s.span });
        }
        self.check_block(&s.body);
        for arm in s.whens {
            let arm_ty = self
                .resolve_type(arm.ty.name, arm.ty.span)
                .unwrap_or(self.ctx.well_known.top);
            let slot = self.scopes.alloc_slot();
            self.ctx.handler_slots.insert(arm.id, slot);
            self.handlers.push((slot, arm_ty));
            self.check_block(&arm.body);
            self.handlers.pop();
        }
        if let Some(else_block) = &s.else_block {
            let slot = self.scopes.alloc_slot();
            self.ctx.handler_slots.insert(s.id, slot);
            self.handlers.push((slot, self.ctx.well_known.top));
            self.check_block(else_block);
            self.handlers.pop();
        }
    }

    fn check_return(&mut self, value: Option<&Expr<'_>>, span: Span) {
        if self.in_iter() {
            self.ctx
                .add_error(SemanticError::ReturnInsideIter { span });
            return;
        }
        match (value, self.sig.return_type) {
            (Some(value), Some(expected)) => {
                if let Some(found) = self.check_expr(value)
                    && !self.ctx.types.subtype(found, expected)
                {
                    self.type_mismatch(expected, found, value.span());
                }
            }
            (Some(value), None) => {
                let found = self.check_expr(value);
                if let Some(found) = found {
                    self.ctx.add_error(SemanticError::TypeMismatch {
                        expected: "no value".to_string(),
                        found: self.ctx.types.type_name(found).to_string(),
                        span,
                    });
                }
            }
            (None, Some(expected)) => {
                self.ctx.add_error(SemanticError::TypeMismatch {
                    expected: self.ctx.types.type_name(expected).to_string(),
                    found: "no value".to_string(),
                    span,
                });
            }
            (None, None) => {}
        }
    }

    fn check_yield(&mut self, value: Option<&Expr<'_>>, id: NodeId, span: Span) {
        let Some(iter_index) = self.iter_index else {
            self.ctx.add_error(SemanticError::YieldOutsideIter { span });
            return;
        };
        let element = self.ctx.iters[iter_index].element_type;
        match (value, element) {
            (Some(value), Some(expected)) => {
                if let Some(found) = self.check_expr(value)
                    && !self.ctx.types.subtype(found, expected)
                {
                    self.type_mismatch(expected, found, value.span());
                }
            }
            (Some(value), None) => {
                self.check_expr(value);
                self.ctx.add_error(SemanticError::TypeMismatch {
                    expected: "no value".to_string(),
                    found: "a yielded value".to_string(),
                    span,
                });
            }
            (None, Some(expected)) => {
                self.ctx.add_error(SemanticError::TypeMismatch {
                    expected: self.ctx.types.type_name(expected).to_string(),
                    found: "no value".to_string(),
                    span,
                });
            }
            (None, None) => {}
        }
        // Resume points number yields in encounter order; zero is entry.
        self.yield_count += 1;
        let index = self.yield_count;
        self.ctx.iters[iter_index]
            .resume_points
            .push(ResumePoint { index, span });
        self.ctx.yield_indices.insert(id, index);
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn check_expr(&mut self, expr: &Expr<'_>) -> Option<TypeId> {
        match expr {
            Expr::Literal(lit) => Some(match lit.kind {
                LiteralKind::Int(_) => self.ctx.well_known.int,
                LiteralKind::Flt(_) => self.ctx.well_known.flt,
                LiteralKind::Bool(_) => self.ctx.well_known.bool_,
                LiteralKind::Char(_) => self.ctx.well_known.char_,
                LiteralKind::Str(_) => self.ctx.well_known.str_,
            }),
            Expr::SelfExpr(_) => Some(self.owner),
            Expr::Exception(span) => match self.handlers.last() {
                Some(&(_, ty)) => Some(ty),
                None => {
                    self.ctx
                        .add_error(SemanticError::ExceptionOutsideHandler { span: *span });
                    None
                }
            },
            Expr::Name(name) => {
                if let Some(var) = self.scopes.lookup(name.name) {
                    let resolution = NameResolution::Local {
                        slot: var.slot,
                        ty: var.ty,
                    };
                    let ty = var.ty;
                    self.ctx.name_bindings.insert(name.id, resolution);
                    return Some(ty);
                }
                // Unqualified and unbound: an implicit zero-argument
                // self-call.
                match resolve_call(&self.ctx.types, self.owner, name.name, &[], Some(false)) {
                    Ok((method, via_container)) => {
                        let binding = CallBinding {
                            method,
                            via_container,
                            virtual_dispatch: false,
                            receiver_type: self.owner,
                            implicit_self: true,
                        };
                        self.ctx
                            .name_bindings
                            .insert(name.id, NameResolution::ImplicitCall(binding));
                        self.ctx.types.method(method).and_then(|s| s.return_type)
                    }
                    Err(_) => {
                        self.ctx.add_error(SemanticError::UnresolvedCall {
                            name: name.name.to_string(),
                            receiver: self.owner_name.to_string(),
                            span: name.span,
                        });
                        None
                    }
                }
            }
            Expr::Call(call) => self.check_call(call, Some(false)),
        }
    }

    fn check_call(&mut self, call: &CallExpr<'_>, expect_void: Option<bool>) -> Option<TypeId> {
        if call.name.ends_with('!') {
            return self.check_iter_call(call);
        }

        let receiver_ty = match call.receiver {
            Some(receiver) => self.check_expr(receiver)?,
            None => self.owner,
        };
        let args = self.check_args(call.args)?;

        match resolve_call(&self.ctx.types, receiver_ty, call.name, &args, expect_void) {
            Ok((method, via_container)) => {
                let binding = CallBinding {
                    method,
                    via_container,
                    virtual_dispatch: self.ctx.types.is_abstract(receiver_ty) && !via_container,
                    receiver_type: receiver_ty,
                    implicit_self: call.receiver.is_none(),
                };
                self.ctx.call_bindings.insert(call.id, binding);
                self.ctx.types.method(method).and_then(|s| s.return_type)
            }
            Err(err) => {
                let receiver = self.ctx.types.type_name(receiver_ty).to_string();
                let error = match err {
                    ResolveError::NoMatch => SemanticError::UnresolvedCall {
                        name: call.name.to_string(),
                        receiver,
                        span: call.span,
                    },
                    ResolveError::Ambiguous => SemanticError::AmbiguousCall {
                        name: call.name.to_string(),
                        receiver,
                        span: call.span,
                    },
                };
                self.ctx.add_error(error);
                None
            }
        }
    }

    fn check_iter_call(&mut self, call: &CallExpr<'_>) -> Option<TypeId> {
        if self.loop_depth == 0 {
            self.ctx
                .add_error(SemanticError::IterCallOutsideLoop { span: call.span });
            return None;
        }
        let receiver_ty = match call.receiver {
            Some(receiver) => self.check_expr(receiver)?,
            None => self.owner,
        };
        let args = self.check_args(call.args)?;

        match resolve_call(&self.ctx.types, receiver_ty, call.name, &args, None) {
            Ok((method, via_container)) => {
                let sig = self.ctx.types.method(method).cloned()?;
                let offset = usize::from(via_container);
                let once_args: Vec<usize> = sig.params[offset..]
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.mode == Mode::Once)
                    .map(|(i, _)| i)
                    .collect();
                let element = self
                    .ctx
                    .iter_definition(method)
                    .and_then(|d| d.element_type)
                    .or(sig.return_type);
                let state_slot = self.scopes.alloc_slot();
                self.ctx.iter_calls.insert(
                    call.id,
                    IterCallInfo {
                        iter: method,
                        via_container,
                        state_slot,
                        once_args,
                        element,
                    },
                );
                let binding = CallBinding {
                    method,
                    via_container,
                    virtual_dispatch: false,
                    receiver_type: receiver_ty,
                    implicit_self: call.receiver.is_none(),
                };
                self.ctx.call_bindings.insert(call.id, binding);
                element
            }
            Err(err) => {
                let receiver = self.ctx.types.type_name(receiver_ty).to_string();
                let error = match err {
                    ResolveError::NoMatch => SemanticError::UnresolvedCall {
                        name: call.name.to_string(),
                        receiver,
                        span: call.span,
                    },
                    ResolveError::Ambiguous => SemanticError::AmbiguousCall {
                        name: call.name.to_string(),
                        receiver,
                        span: call.span,
                    },
                };
                self.ctx.add_error(error);
                None
            }
        }
    }

    fn check_args(&mut self, args: &[CallArg<'_>]) -> Option<Vec<ArgInfo>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            let ty = self.check_expr(arg.expr)?;
            // Out and InOut arguments are written through; anything that
            // is not a place rules the call out entirely.
            if matches!(arg.mode, Mode::Out | Mode::InOut) && !self.is_assignable(arg.expr) {
                self.ctx.add_error(SemanticError::UnassignableArgument {
                    mode: match arg.mode {
                        Mode::Out => "out",
                        _ => "inout",
                    },
                    span: arg.expr.span(),
                });
                return None;
            }
            out.push(ArgInfo { mode: arg.mode, ty });
        }
        Some(out)
    }

    /// Whether `expr` names a parameter or local a reference can be
    /// taken to. Bindings were recorded by the preceding `check_expr`.
    fn is_assignable(&self, expr: &Expr<'_>) -> bool {
        matches!(
            expr,
            Expr::Name(name)
                if matches!(
                    self.ctx.name_bindings.get(&name.id),
                    Some(NameResolution::Local { .. })
                )
        )
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    fn resolve_setter(
        &mut self,
        target: &str,
        target_id: NodeId,
        value_ty: Option<TypeId>,
        span: Span,
    ) {
        let Some(value_ty) = value_ty else {
            return;
        };
        let args = [ArgInfo {
            mode: Mode::In,
            ty: value_ty,
        }];
        match resolve_call(&self.ctx.types, self.owner, target, &args, Some(true)) {
            Ok((method, via_container)) => {
                let binding = CallBinding {
                    method,
                    via_container,
                    virtual_dispatch: false,
                    receiver_type: self.owner,
                    implicit_self: true,
                };
                self.ctx
                    .name_bindings
                    .insert(target_id, NameResolution::ImplicitCall(binding));
            }
            Err(_) => {
                self.ctx.add_error(SemanticError::UnresolvedCall {
                    name: target.to_string(),
                    receiver: self.owner_name.to_string(),
                    span,
                });
            }
        }
    }

    fn resolve_type(&mut self, name: &str, span: Span) -> Option<TypeId> {
        match self.ctx.types.resolve_name(name) {
            Some(ty) => Some(ty),
            None => {
                self.ctx.add_error(SemanticError::UnknownType {
                    name: name.to_string(),
                    span,
                });
                None
            }
        }
    }

    fn type_mismatch(&mut self, expected: TypeId, found: TypeId, span: Span) {
        self.ctx.add_error(SemanticError::TypeMismatch {
            expected: self.ctx.types.type_name(expected).to_string(),
            found: self.ctx.types.type_name(found).to_string(),
            span,
        });
    }
}
