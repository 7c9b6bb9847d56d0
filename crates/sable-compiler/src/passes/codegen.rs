//! Pass 4: code generation.
//!
//! Emits flat label-addressed code for every routine body, the bridge
//! methods of every adapter, and the construction/resumption machinery of
//! every iterator. Runs only on a clean context; everything it reads was
//! resolved and recorded by the earlier passes, so emission itself never
//! fails on user input except for the entry-point requirement.

use sable_ast::{
    Block, CallExpr, ClassDecl, Expr, LiteralKind, Member, NodeId, SourceUnit, Stmt,
};
use sable_core::{MethodId, MethodSignature, Mode, SemanticError, Span, TypeId};

use crate::code::{CodeBuilder, CodeChunk, FieldRef, IterStep, Label, Op, Operand};
use crate::context::{CompilationContext, NameResolution};

/// One emitted routine.
#[derive(Debug, Clone)]
pub struct CompiledRoutine {
    pub owner: TypeId,
    pub method: MethodId,
    pub name: String,
    pub frame_size: u32,
    pub code: CodeChunk,
}

/// The wired entry point of an executable program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryPoint {
    pub class: TypeId,
    pub method: MethodId,
}

/// Everything code generation produces.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    pub routines: Vec<CompiledRoutine>,
    pub entry_point: Option<EntryPoint>,
}

impl CompiledProgram {
    pub fn routine(&self, method: MethodId) -> Option<&CompiledRoutine> {
        self.routines.iter().find(|r| r.method == method)
    }
}

pub struct Codegen<'ctx> {
    ctx: &'ctx mut CompilationContext,
    routines: Vec<CompiledRoutine>,
}

impl<'ctx> Codegen<'ctx> {
    pub fn new(ctx: &'ctx mut CompilationContext) -> Self {
        Self {
            ctx,
            routines: Vec::new(),
        }
    }

    pub fn run(mut self, unit: &SourceUnit<'_>) -> CompiledProgram {
        for class in unit.classes {
            let Some(owner) = self.ctx.types.resolve_name(class.name) else {
                continue;
            };
            if self.ctx.class(owner).is_none() {
                continue;
            }
            self.emit_class(owner, class);
        }
        self.emit_adapters();
        self.emit_iter_machinery();
        self.emit_default_slots();
        let entry_point = self.wire_entry_point();
        CompiledProgram {
            routines: self.routines,
            entry_point,
        }
    }

    fn emit_class(&mut self, owner: TypeId, class: &ClassDecl<'_>) {
        for member in class.members {
            let (id, body) = match member {
                Member::Routine(r) => (r.id, r.body),
                Member::Iter(i) => (i.id, i.body),
            };
            let (Some(body), Some(&method)) = (body, self.ctx.member_methods.get(&id)) else {
                continue;
            };
            let routine = BodyEmitter::new(self.ctx, owner, method).emit(&body);
            self.routines.push(routine);
        }
    }

    /// Default constructors and static initializers for classes whose
    /// declaration did not provide bodies for them.
    fn emit_default_slots(&mut self) {
        for owner in self.ctx.class_order.clone() {
            let Some(info) = self.ctx.class(owner) else {
                continue;
            };
            let (ctor, sinit) = (info.constructor, info.static_init);
            if let Some(ctor) = ctor
                && self.routines.iter().all(|r| r.method != ctor)
            {
                let mut b = CodeBuilder::new();
                b.emit_with(Op::New, vec![Operand::Type(owner)]);
                b.emit(Op::Return);
                self.routines.push(CompiledRoutine {
                    owner,
                    method: ctor,
                    name: "create".to_string(),
                    frame_size: 0,
                    code: b.finish(),
                });
            }
            if let Some(sinit) = sinit {
                let mut b = CodeBuilder::new();
                b.emit(Op::Return);
                self.routines.push(CompiledRoutine {
                    owner,
                    method: sinit,
                    name: "$sinit".to_string(),
                    frame_size: 0,
                    code: b.finish(),
                });
            }
        }
    }

    // ==========================================================================
    // Adapters
    // ==========================================================================

    fn emit_adapters(&mut self) {
        for index in 0..self.ctx.adapters.len() {
            let adapter = self.ctx.adapters[index].clone();
            let Some(ctor) = adapter.constructor else {
                continue;
            };

            // create(adaptee): allocate, stash the adaptee, hand back.
            let mut b = CodeBuilder::new();
            let tmp = 1u32;
            b.emit_with(Op::New, vec![Operand::Type(adapter.adapter_type)]);
            b.emit_with(Op::StoreLocal, vec![Operand::Local(tmp)]);
            b.emit_with(Op::LoadLocal, vec![Operand::Local(tmp)]);
            b.emit_with(Op::LoadLocal, vec![Operand::Local(0)]);
            b.emit_with(
                Op::StoreField,
                vec![Operand::Field(FieldRef {
                    owner: adapter.adapter_type,
                    name: adapter.field_name.clone(),
                })],
            );
            b.emit_with(Op::LoadLocal, vec![Operand::Local(tmp)]);
            b.emit(Op::Return);
            self.routines.push(CompiledRoutine {
                owner: adapter.adapter_type,
                method: ctor,
                name: "create".to_string(),
                frame_size: 2,
                code: b.finish(),
            });

            // Every bridge forwards the unwrapped adaptee and the bridge's
            // own arguments to the bound target. Several obligations may
            // share one bridge; it gets one body.
            for bridge in &adapter.bridges {
                if self.routines.iter().any(|r| r.method == bridge.bridge) {
                    continue;
                }
                let Some(sig) = self.ctx.types.method(bridge.bridge).cloned() else {
                    continue;
                };
                let mut b = CodeBuilder::new();
                b.emit(Op::LoadSelf);
                b.emit_with(
                    Op::LoadField,
                    vec![Operand::Field(FieldRef {
                        owner: adapter.adapter_type,
                        name: adapter.field_name.clone(),
                    })],
                );
                for slot in 0..sig.arity() as u32 {
                    b.emit_with(Op::LoadLocal, vec![Operand::Local(slot)]);
                }
                b.emit_with(Op::Call, vec![Operand::Method(bridge.target)]);
                b.emit(Op::Return);
                self.routines.push(CompiledRoutine {
                    owner: adapter.adapter_type,
                    method: bridge.bridge,
                    name: sig.name.clone(),
                    frame_size: sig.arity() as u32,
                    code: b.finish(),
                });
            }
        }
    }

    // ==========================================================================
    // Iterator construction
    // ==========================================================================

    fn emit_iter_machinery(&mut self) {
        for index in 0..self.ctx.iters.len() {
            let def = self.ctx.iters[index].clone();
            let Some(create) = def.create else {
                continue;
            };
            let holder = def.holder_type;
            let arity = 1 + def.once_fields.len() as u32;
            let tmp = arity;

            let field = |name: &str| {
                Operand::Field(FieldRef {
                    owner: holder,
                    name: name.to_string(),
                })
            };

            let mut b = CodeBuilder::new();
            b.emit_with(Op::New, vec![Operand::Type(holder)]);
            b.emit_with(Op::StoreLocal, vec![Operand::Local(tmp)]);
            b.emit_with(Op::LoadLocal, vec![Operand::Local(tmp)]);
            b.emit_with(Op::LoadLocal, vec![Operand::Local(0)]);
            b.emit_with(Op::StoreField, vec![field(&def.self_field)]);
            for (k, (name, _)) in def.once_fields.iter().enumerate() {
                b.emit_with(Op::LoadLocal, vec![Operand::Local(tmp)]);
                b.emit_with(Op::LoadLocal, vec![Operand::Local(k as u32 + 1)]);
                b.emit_with(Op::StoreField, vec![field(name)]);
            }
            b.emit_with(Op::LoadLocal, vec![Operand::Local(tmp)]);
            b.emit_with(Op::LoadConst, vec![Operand::Int(0)]);
            b.emit_with(Op::StoreField, vec![field(&def.position_field)]);
            b.emit_with(Op::LoadLocal, vec![Operand::Local(tmp)]);
            b.emit(Op::Return);
            self.routines.push(CompiledRoutine {
                owner: holder,
                method: create,
                name: "create".to_string(),
                frame_size: arity + 1,
                code: b.finish(),
            });

            // Widening aliases tail-delegate to the primary create.
            for &(_, bridge) in &def.bridge_creates {
                let mut b = CodeBuilder::new();
                for slot in 0..arity {
                    b.emit_with(Op::LoadLocal, vec![Operand::Local(slot)]);
                }
                b.emit_with(Op::Call, vec![Operand::Method(create)]);
                b.emit(Op::Return);
                let name = self
                    .ctx
                    .types
                    .method(bridge)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                self.routines.push(CompiledRoutine {
                    owner: holder,
                    method: bridge,
                    name,
                    frame_size: arity,
                    code: b.finish(),
                });
            }

            if let (Some(read_current), Some(current_field)) =
                (def.read_current, def.current_field.as_deref())
            {
                let mut b = CodeBuilder::new();
                b.emit(Op::LoadSelf);
                b.emit_with(Op::LoadField, vec![field(current_field)]);
                b.emit(Op::Return);
                self.routines.push(CompiledRoutine {
                    owner: holder,
                    method: read_current,
                    name: "current".to_string(),
                    frame_size: 0,
                    code: b.finish(),
                });
            }
        }
    }

    // ==========================================================================
    // Entry point
    // ==========================================================================

    fn wire_entry_point(&mut self) -> Option<EntryPoint> {
        if !self.ctx.options.executable {
            return None;
        }
        let main_class = self.ctx.types.resolve_name("MAIN");
        let entry = main_class.and_then(|class| {
            let main = self
                .ctx
                .types
                .methods_named(class, "main")
                .iter()
                .copied()
                .find(|&m| {
                    self.ctx
                        .types
                        .method(m)
                        .is_some_and(|s| s.arity() == 0 && s.is_void())
                })?;
            Some(EntryPoint {
                class,
                method: main,
            })
        });
        let Some(entry) = entry else {
            let span = main_class
                .and_then(|c| self.ctx.class(c))
                .map_or(Span::default(), |c| c.span);
            self.ctx
                .add_error(SemanticError::MissingEntryPoint { span });
            return None;
        };

        let ctor = self.ctx.class(entry.class).and_then(|c| c.constructor);
        let entry_method = self
            .ctx
            .types
            .declare_method(MethodSignature::new(entry.class, "$entry", Vec::new(), None))
            .ok();
        if let (Some(ctor), Some(entry_method)) = (ctor, entry_method) {
            let mut b = CodeBuilder::new();
            b.emit_with(Op::CallCtor, vec![Operand::Method(ctor)]);
            b.emit_with(Op::Call, vec![Operand::Method(entry.method)]);
            b.emit(Op::Return);
            self.routines.push(CompiledRoutine {
                owner: entry.class,
                method: entry_method,
                name: "$entry".to_string(),
                frame_size: 0,
                code: b.finish(),
            });
        }
        Some(entry)
    }
}

// ==============================================================================
// Body emission
// ==============================================================================

/// Iterator-specific emission state.
struct IterEmit {
    holder: TypeId,
    self_field: String,
    position_field: String,
    current_field: Option<String>,
    element: Option<TypeId>,
    /// Declared arity; slots at or above it live as holder fields.
    arity: u32,
    /// Resume labels, entry first; yields bind them in index order.
    labels: Vec<Label>,
}

/// Emits one routine or iterator body.
struct BodyEmitter<'a> {
    ctx: &'a CompilationContext,
    b: CodeBuilder,
    owner: TypeId,
    method: MethodId,
    sig: MethodSignature,
    return_label: Label,
    result_slot: Option<u32>,
    next_slot: u32,
    /// Exception slot per enclosing handler arm, innermost last.
    handler_stack: Vec<u32>,
    iter: Option<IterEmit>,
}

impl<'a> BodyEmitter<'a> {
    fn new(ctx: &'a CompilationContext, owner: TypeId, method: MethodId) -> Self {
        let sig = ctx
            .types
            .method(method)
            .cloned()
            .expect("emitted method is registered");
        let mut b = CodeBuilder::new();
        let return_label = b.new_label();
        let frame = ctx.frames.get(&method).copied().unwrap_or(sig.arity() as u32);
        let iter = ctx.iter_definition(method).map(|def| IterEmit {
            holder: def.holder_type,
            self_field: def.self_field.clone(),
            position_field: def.position_field.clone(),
            current_field: def.current_field.clone(),
            element: def.element_type,
            arity: sig.arity() as u32,
            labels: Vec::new(),
        });
        Self {
            ctx,
            b,
            owner,
            method,
            sig,
            return_label,
            result_slot: None,
            next_slot: frame,
            handler_stack: Vec::new(),
            iter,
        }
    }

    fn alloc_slot(&mut self) -> u32 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    fn emit(mut self, body: &Block<'_>) -> CompiledRoutine {
        if self.iter.is_some() {
            self.emit_iter_prologue();
        } else {
            if self.sig.return_type.is_some() {
                self.result_slot = Some(self.alloc_slot());
            }
            // Out parameters start voided regardless of the caller's slot.
            for (slot, param) in self.sig.params.iter().enumerate() {
                if param.mode == Mode::Out {
                    self.b
                        .emit_with(Op::VoidLocal, vec![Operand::Local(slot as u32)]);
                }
            }
        }

        self.emit_block(body);

        if self.iter.is_some() {
            // Falling off the end exhausts the iterator.
            self.b
                .emit_with(Op::PushStep, vec![Operand::Step(IterStep::Exhausted)]);
            self.b.emit(Op::Return);
        } else {
            self.b.bind(self.return_label);
            if let Some(result) = self.result_slot {
                self.b
                    .emit_with(Op::LoadLocal, vec![Operand::Local(result)]);
            }
            self.b.emit(Op::Return);
        }

        let method = self.method;
        let owner = self.owner;
        let name = self.sig.name.clone();
        let frame_size = self.next_slot;
        CompiledRoutine {
            owner,
            method,
            name,
            frame_size,
            code: self.b.finish(),
        }
    }

    /// Argument reshuffle, once-field reloads, and the resume dispatch.
    fn emit_iter_prologue(&mut self) {
        let Some(def) = self.ctx.iter_definition(self.method).cloned() else {
            return;
        };
        let holder = def.holder_type;

        // move_next receives only the non-once arguments, packed to the
        // left; spread them back onto the declared slots, right to left so
        // nothing is clobbered.
        let non_once: Vec<(usize, usize)> = self
            .sig
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.mode != Mode::Once)
            .enumerate()
            .map(|(incoming, (declared, _))| (incoming, declared))
            .collect();
        for &(incoming, declared) in non_once.iter().rev() {
            if incoming != declared {
                self.b
                    .emit_with(Op::LoadLocal, vec![Operand::Local(incoming as u32)]);
                self.b
                    .emit_with(Op::StoreLocal, vec![Operand::Local(declared as u32)]);
            }
        }
        for (k, &declared) in def.once_params.iter().enumerate() {
            self.b.emit(Op::LoadSelf);
            self.b.emit_with(
                Op::LoadField,
                vec![Operand::Field(FieldRef {
                    owner: holder,
                    name: def.once_fields[k].0.clone(),
                })],
            );
            self.b
                .emit_with(Op::StoreLocal, vec![Operand::Local(declared as u32)]);
        }
        for (slot, param) in self.sig.params.iter().enumerate() {
            if param.mode == Mode::Out {
                self.b
                    .emit_with(Op::VoidLocal, vec![Operand::Local(slot as u32)]);
            }
        }

        let labels: Vec<Label> = (0..def.resume_count())
            .map(|_| self.b.new_label())
            .collect();
        self.b.emit(Op::LoadSelf);
        self.b.emit_with(
            Op::LoadField,
            vec![Operand::Field(FieldRef {
                owner: holder,
                name: def.position_field.clone(),
            })],
        );
        self.b
            .emit_with(Op::Switch, vec![Operand::Labels(labels.clone())]);
        self.b.bind(labels[0]);
        if let Some(iter) = &mut self.iter {
            iter.labels = labels;
        }
    }

    // ==========================================================================
    // Local access, iterator-aware
    // ==========================================================================

    fn slot_is_field(&self, slot: u32) -> bool {
        self.iter.as_ref().is_some_and(|i| slot >= i.arity)
    }

    fn local_field(&self, slot: u32) -> Operand {
        let holder = self.iter.as_ref().map(|i| i.holder).unwrap_or(self.owner);
        Operand::Field(FieldRef {
            owner: holder,
            name: format!("local${slot}"),
        })
    }

    fn emit_local_load(&mut self, slot: u32) {
        if self.slot_is_field(slot) {
            self.b.emit(Op::LoadSelf);
            let field = self.local_field(slot);
            self.b.emit_with(Op::LoadField, vec![field]);
        } else {
            self.b.emit_with(Op::LoadLocal, vec![Operand::Local(slot)]);
        }
    }

    /// Stores are bracketed so the object reference sits below the value.
    fn begin_local_store(&mut self, slot: u32) {
        if self.slot_is_field(slot) {
            self.b.emit(Op::LoadSelf);
        }
    }

    fn end_local_store(&mut self, slot: u32) {
        if self.slot_is_field(slot) {
            let field = self.local_field(slot);
            self.b.emit_with(Op::StoreField, vec![field]);
        } else {
            self.b.emit_with(Op::StoreLocal, vec![Operand::Local(slot)]);
        }
    }

    fn emit_self_load(&mut self) {
        self.b.emit(Op::LoadSelf);
        if let Some(iter) = &self.iter {
            let field = Operand::Field(FieldRef {
                owner: iter.holder,
                name: iter.self_field.clone(),
            });
            self.b.emit_with(Op::LoadField, vec![field]);
        }
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn emit_block(&mut self, block: &Block<'_>) {
        for stmt in block.stmts {
            self.emit_stmt(stmt);
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Expr(s) => {
                if let Expr::Call(call) = s.expr {
                    self.emit_call(call);
                    // Elementful iterator calls used purely for their
                    // stepping still leave the element behind.
                    if self
                        .ctx
                        .iter_calls
                        .get(&call.id)
                        .is_some_and(|i| i.element.is_some())
                    {
                        self.b.emit(Op::Pop);
                    }
                } else {
                    self.emit_expr(s.expr);
                    if self.static_type(s.expr).is_some() {
                        self.b.emit(Op::Pop);
                    }
                }
            }
            Stmt::LocalDecl(s) => {
                let Some(&slot) = self.ctx.local_slots.get(&s.id) else {
                    return;
                };
                match s.init {
                    Some(init) => {
                        self.begin_local_store(slot);
                        self.emit_expr(init);
                        if let (Some(from), Some(to)) = (
                            self.static_type(init),
                            self.ctx.types.resolve_name(s.ty.name),
                        ) {
                            self.emit_convert(from, to);
                        }
                        self.end_local_store(slot);
                    }
                    None => {
                        if self.slot_is_field(slot) {
                            self.begin_local_store(slot);
                            self.b.emit(Op::PushVoid);
                            self.end_local_store(slot);
                        } else {
                            self.b
                                .emit_with(Op::VoidLocal, vec![Operand::Local(slot)]);
                        }
                    }
                }
            }
            Stmt::Assign(s) => match self.ctx.name_bindings.get(&s.target_id).copied() {
                Some(NameResolution::Local { slot, ty }) => {
                    self.begin_local_store(slot);
                    self.emit_expr(s.value);
                    if let Some(from) = self.static_type(s.value) {
                        self.emit_convert(from, ty);
                    }
                    self.end_local_store(slot);
                }
                Some(NameResolution::ImplicitCall(binding)) => {
                    self.emit_self_load();
                    self.emit_expr(s.value);
                    if let (Some(from), Some(param)) = (
                        self.static_type(s.value),
                        self.ctx
                            .types
                            .method(binding.method)
                            .and_then(|m| m.params.first().map(|p| p.ty)),
                    ) {
                        self.emit_convert(from, param);
                    }
                    self.b
                        .emit_with(Op::Call, vec![Operand::Method(binding.method)]);
                }
                None => {}
            },
            Stmt::If(s) => {
                let else_label = self.b.new_label();
                let end = self.b.new_label();
                self.emit_expr(s.cond);
                self.b
                    .emit_with(Op::BranchFalse, vec![Operand::Label(else_label)]);
                self.emit_block(&s.then_block);
                self.b.emit_with(Op::Branch, vec![Operand::Label(end)]);
                self.b.bind(else_label);
                if let Some(else_block) = &s.else_block {
                    self.emit_block(else_block);
                }
                self.b.bind(end);
            }
            Stmt::Loop(s) => self.emit_loop(&s.body),
            Stmt::Case(s) => self.emit_case(s),
            Stmt::Typecase(s) => self.emit_typecase(s),
            Stmt::Protect(s) => self.emit_protect(s),
            Stmt::Raise(s) => {
                self.emit_expr(s.value);
                self.b.emit(Op::Raise);
            }
            Stmt::Return(s) => {
                if let Some(value) = s.value {
                    let result = self.result_slot;
                    self.emit_expr(value);
                    if let (Some(from), Some(to)) = (self.static_type(value), self.sig.return_type)
                    {
                        self.emit_convert(from, to);
                    }
                    if let Some(result) = result {
                        self.b
                            .emit_with(Op::StoreLocal, vec![Operand::Local(result)]);
                    }
                }
                self.b
                    .emit_with(Op::Leave, vec![Operand::Label(self.return_label)]);
            }
            Stmt::Yield(s) => self.emit_yield(s.value, s.id),
            Stmt::Break(_) => {
                match self.b.current_loop() {
                    Some((_, end)) => {
                        self.b.emit_with(Op::Branch, vec![Operand::Label(end)]);
                    }
                    None => {
                        // Top-level break in an iterator breaks the
                        // caller's loop.
                        self.b
                            .emit_with(Op::PushStep, vec![Operand::Step(IterStep::Break)]);
                        self.b.emit(Op::Return);
                    }
                }
            }
        }
    }

    fn emit_loop(&mut self, body: &Block<'_>) {
        // Iterator state is constructed once, before the loop head.
        let mut inits = Vec::new();
        collect_iter_calls(self.ctx, body, &mut inits);
        for call in &inits {
            self.emit_iter_init(call);
        }
        let top = self.b.new_label();
        let end = self.b.new_label();
        self.b.bind(top);
        self.b.enter_loop(top, end);
        self.emit_block(body);
        self.b.emit_with(Op::Branch, vec![Operand::Label(top)]);
        self.b.exit_loop();
        self.b.bind(end);
    }

    fn emit_iter_init(&mut self, call: &CallExpr<'_>) {
        let Some(info) = self.ctx.iter_calls.get(&call.id).cloned() else {
            return;
        };
        let Some(binding) = self.ctx.call_bindings.get(&call.id).copied() else {
            return;
        };
        if binding.implicit_self {
            self.emit_self_load();
        } else if let Some(receiver) = call.receiver {
            self.emit_expr(receiver);
        }
        for (index, arg) in call.args.iter().enumerate() {
            if info.once_args.contains(&index) {
                self.emit_expr(arg.expr);
            } else {
                self.b.emit(Op::PushVoid);
            }
        }
        self.b.emit_with(
            Op::IterInit,
            vec![Operand::Method(info.iter), Operand::Local(info.state_slot)],
        );
    }

    fn emit_case(&mut self, s: &sable_ast::CaseStmt<'_>) {
        let Some(&subject_slot) = self.ctx.case_subject_slots.get(&s.id) else {
            return;
        };
        self.begin_local_store(subject_slot);
        self.emit_expr(s.subject);
        self.end_local_store(subject_slot);

        let end = self.b.new_label();
        let else_label = self.b.new_label();
        let arm_labels: Vec<Label> = s.arms.iter().map(|_| self.b.new_label()).collect();
        let equality = self.ctx.case_eq.get(&s.id).copied().flatten();

        for (arm, &arm_label) in s.arms.iter().zip(&arm_labels) {
            for value in arm.values {
                self.emit_local_load(subject_slot);
                self.emit_expr(value);
                match equality {
                    Some(binding) => {
                        let op = if binding.virtual_dispatch {
                            Op::CallVirtual
                        } else {
                            Op::Call
                        };
                        self.b.emit_with(op, vec![Operand::Method(binding.method)]);
                    }
                    None => self.b.emit(Op::Eq),
                }
                self.b
                    .emit_with(Op::BranchTrue, vec![Operand::Label(arm_label)]);
            }
        }
        self.b
            .emit_with(Op::Branch, vec![Operand::Label(else_label)]);
        for (arm, &arm_label) in s.arms.iter().zip(&arm_labels) {
            self.b.bind(arm_label);
            self.emit_block(&arm.body);
            self.b.emit_with(Op::Branch, vec![Operand::Label(end)]);
        }
        self.b.bind(else_label);
        if let Some(else_block) = &s.else_block {
            self.emit_block(else_block);
        }
        self.b.bind(end);
    }

    fn emit_typecase(&mut self, s: &sable_ast::TypecaseStmt<'_>) {
        let Some(NameResolution::Local {
            slot: subject_slot,
            ty: subject_ty,
        }) = self.ctx.name_bindings.get(&s.subject_id).copied()
        else {
            return;
        };
        let end = self.b.new_label();
        for arm in s.arms {
            let Some(&(arm_slot, arm_ty)) = self.ctx.typecase_slots.get(&arm.id) else {
                continue;
            };
            let next = self.b.new_label();
            self.emit_local_load(subject_slot);
            self.b
                .emit_with(Op::IsInstance, vec![Operand::Type(arm_ty)]);
            self.b.emit_with(Op::BranchFalse, vec![Operand::Label(next)]);
            self.begin_local_store(arm_slot);
            self.emit_local_load(subject_slot);
            self.emit_convert(subject_ty, arm_ty);
            self.end_local_store(arm_slot);
            self.emit_block(&arm.body);
            self.b.emit_with(Op::Branch, vec![Operand::Label(end)]);
            self.b.bind(next);
        }
        if let Some(else_block) = &s.else_block {
            self.emit_block(else_block);
        }
        self.b.bind(end);
    }

    fn emit_protect(&mut self, s: &sable_ast::ProtectStmt<'_>) {
        let end = self.b.new_label();
        let arm_count = s.whens.len() + usize::from(s.else_block.is_some());
        let handler_labels: Vec<Label> = (0..arm_count).map(|_| self.b.new_label()).collect();
        self.b.emit_with(
            Op::TryEnter,
            vec![Operand::Labels(handler_labels.clone())],
        );
        self.emit_block(&s.body);
        self.b.emit(Op::TryExit);
        self.b.emit_with(Op::Branch, vec![Operand::Label(end)]);

        for (arm, &label) in s.whens.iter().zip(&handler_labels) {
            let Some(&slot) = self.ctx.handler_slots.get(&arm.id) else {
                continue;
            };
            let arm_ty = self
                .ctx
                .types
                .resolve_name(arm.ty.name)
                .unwrap_or(self.ctx.well_known.top);
            self.b.bind(label);
            self.b.emit_with(
                Op::Catch,
                vec![Operand::Type(arm_ty), Operand::Local(slot)],
            );
            self.handler_stack.push(slot);
            self.emit_block(&arm.body);
            self.handler_stack.pop();
            self.b.emit_with(Op::Branch, vec![Operand::Label(end)]);
        }
        if let Some(else_block) = &s.else_block {
            let label = handler_labels[s.whens.len()];
            let Some(&slot) = self.ctx.handler_slots.get(&s.id) else {
                return;
            };
            self.b.bind(label);
            self.b.emit_with(
                Op::Catch,
                vec![
                    Operand::Type(self.ctx.well_known.top),
                    Operand::Local(slot),
                ],
            );
            self.handler_stack.push(slot);
            self.emit_block(else_block);
            self.handler_stack.pop();
            self.b.emit_with(Op::Branch, vec![Operand::Label(end)]);
        }
        self.b.bind(end);
    }

    fn emit_yield(&mut self, value: Option<&Expr<'_>>, id: NodeId) {
        let Some(&index) = self.ctx.yield_indices.get(&id) else {
            return;
        };
        let Some(iter) = &self.iter else {
            return;
        };
        let holder = iter.holder;
        let current_field = iter.current_field.clone();
        let position_field = iter.position_field.clone();
        let element = iter.element;
        let label = iter.labels.get(index as usize).copied();

        if let (Some(value), Some(current)) = (value, current_field) {
            self.b.emit(Op::LoadSelf);
            self.emit_expr(value);
            if let (Some(from), Some(to)) = (self.static_type(value), element) {
                self.emit_convert(from, to);
            }
            self.b.emit_with(
                Op::StoreField,
                vec![Operand::Field(FieldRef {
                    owner: holder,
                    name: current,
                })],
            );
        }
        self.b.emit(Op::LoadSelf);
        self.b
            .emit_with(Op::LoadConst, vec![Operand::Int(i64::from(index))]);
        self.b.emit_with(
            Op::StoreField,
            vec![Operand::Field(FieldRef {
                owner: holder,
                name: position_field,
            })],
        );
        self.b
            .emit_with(Op::PushStep, vec![Operand::Step(IterStep::Value)]);
        self.b.emit(Op::Return);
        if let Some(label) = label {
            self.b.bind(label);
        }
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn emit_expr(&mut self, expr: &Expr<'_>) {
        match expr {
            Expr::Literal(lit) => {
                let operand = match lit.kind {
                    LiteralKind::Int(v) => Operand::Int(v),
                    LiteralKind::Flt(v) => Operand::Flt(v.into()),
                    LiteralKind::Bool(v) => Operand::Bool(v),
                    LiteralKind::Char(v) => Operand::Char(v),
                    LiteralKind::Str(v) => Operand::Str(v.to_string()),
                };
                self.b.emit_with(Op::LoadConst, vec![operand]);
            }
            Expr::SelfExpr(_) => self.emit_self_load(),
            Expr::Exception(_) => {
                if let Some(&slot) = self.handler_stack.last() {
                    self.b.emit_with(Op::LoadLocal, vec![Operand::Local(slot)]);
                }
            }
            Expr::Name(name) => match self.ctx.name_bindings.get(&name.id).copied() {
                Some(NameResolution::Local { slot, .. }) => self.emit_local_load(slot),
                Some(NameResolution::ImplicitCall(binding)) => {
                    self.emit_self_load();
                    self.b
                        .emit_with(Op::Call, vec![Operand::Method(binding.method)]);
                }
                None => {}
            },
            Expr::Call(call) => {
                self.emit_call(call);
            }
        }
    }

    fn emit_call(&mut self, call: &CallExpr<'_>) {
        if self.ctx.iter_calls.contains_key(&call.id) {
            self.emit_iter_next(call);
            return;
        }
        let Some(binding) = self.ctx.call_bindings.get(&call.id).copied() else {
            return;
        };
        let Some(sig) = self.ctx.types.method(binding.method).cloned() else {
            return;
        };

        let is_ctor = self
            .ctx
            .class(binding.receiver_type)
            .and_then(|c| c.constructor)
            == Some(binding.method);
        if !is_ctor {
            if binding.implicit_self {
                self.emit_self_load();
            } else if let Some(receiver) = call.receiver {
                // For container methods the receiver doubles as the
                // leading argument, taken as-is.
                self.emit_expr(receiver);
            }
        }

        let offset = usize::from(binding.via_container);
        for (index, arg) in call.args.iter().enumerate() {
            let param = &sig.params[offset + index];
            match arg.mode {
                Mode::In | Mode::Once => {
                    self.emit_expr(arg.expr);
                    if let Some(from) = self.static_type(arg.expr) {
                        self.emit_convert(from, param.ty);
                    }
                }
                Mode::Out | Mode::InOut => {
                    if let Expr::Name(name) = arg.expr
                        && let Some(NameResolution::Local { slot, .. }) =
                            self.ctx.name_bindings.get(&name.id).copied()
                    {
                        self.b.emit_with(Op::RefLocal, vec![Operand::Local(slot)]);
                    }
                }
            }
        }

        let (op, operand) = if is_ctor {
            (Op::CallCtor, Operand::Method(binding.method))
        } else if binding.virtual_dispatch {
            (Op::CallVirtual, Operand::Method(binding.method))
        } else {
            (Op::Call, Operand::Method(binding.method))
        };
        self.b.emit_with(op, vec![operand]);
    }

    /// One resumption at the call site: pass the per-trip arguments,
    /// dispatch on the step tag, leave the element (if any) on the stack.
    fn emit_iter_next(&mut self, call: &CallExpr<'_>) {
        let Some(info) = self.ctx.iter_calls.get(&call.id).cloned() else {
            return;
        };
        for (index, arg) in call.args.iter().enumerate() {
            if !info.once_args.contains(&index) {
                self.emit_expr(arg.expr);
            }
        }
        self.b
            .emit_with(Op::IterNext, vec![Operand::Local(info.state_slot)]);
        let proceed = self.b.new_label();
        let Some((_, end)) = self.b.current_loop() else {
            return;
        };
        self.b.emit_with(
            Op::Switch,
            vec![Operand::Labels(vec![proceed, end, end])],
        );
        self.b.bind(proceed);
        if info.element.is_some() {
            self.b
                .emit_with(Op::IterCurrent, vec![Operand::Local(info.state_slot)]);
        }
    }

    // ==========================================================================
    // Conversions and static typing
    // ==========================================================================

    /// Representation change at a typed boundary. Value-to-abstract prefers
    /// the synthesized adapter over plain boxing; abstract-to-value
    /// unboxes.
    fn emit_convert(&mut self, from: TypeId, to: TypeId) {
        if from == to {
            return;
        }
        let types = &self.ctx.types;
        if types.is_value(from) && types.is_abstract(to) {
            let ctor = types
                .adapter_for(from, to)
                .map(|id| self.ctx.adapters[id.index()].constructor);
            match ctor.flatten() {
                Some(ctor) => self
                    .b
                    .emit_with(Op::CallCtor, vec![Operand::Method(ctor)]),
                None => self.b.emit_with(Op::Box_, vec![Operand::Type(from)]),
            }
        } else if types.is_abstract(from) && types.is_value(to) {
            self.b.emit_with(Op::Unbox, vec![Operand::Type(to)]);
        }
    }

    /// Static type of an already-checked expression, recovered from the
    /// side tables.
    fn static_type(&self, expr: &Expr<'_>) -> Option<TypeId> {
        match expr {
            Expr::Literal(lit) => Some(match lit.kind {
                LiteralKind::Int(_) => self.ctx.well_known.int,
                LiteralKind::Flt(_) => self.ctx.well_known.flt,
                LiteralKind::Bool(_) => self.ctx.well_known.bool_,
                LiteralKind::Char(_) => self.ctx.well_known.char_,
                LiteralKind::Str(_) => self.ctx.well_known.str_,
            }),
            Expr::SelfExpr(_) => Some(self.owner),
            Expr::Exception(_) => Some(self.ctx.well_known.top),
            Expr::Name(name) => match self.ctx.name_bindings.get(&name.id)? {
                NameResolution::Local { ty, .. } => Some(*ty),
                NameResolution::ImplicitCall(binding) => {
                    self.ctx.types.method(binding.method)?.return_type
                }
            },
            Expr::Call(call) => {
                if let Some(info) = self.ctx.iter_calls.get(&call.id) {
                    return info.element;
                }
                let binding = self.ctx.call_bindings.get(&call.id)?;
                self.ctx.types.method(binding.method)?.return_type
            }
        }
    }
}

/// Iterator call sites directly inside `block`, excluding those belonging
/// to a nested loop (their own loop constructs them).
fn collect_iter_calls<'ast>(
    ctx: &CompilationContext,
    block: &Block<'ast>,
    out: &mut Vec<&'ast CallExpr<'ast>>,
) {
    for stmt in block.stmts {
        collect_in_stmt(ctx, stmt, out);
    }
}

fn collect_in_stmt<'ast>(
    ctx: &CompilationContext,
    stmt: &Stmt<'ast>,
    out: &mut Vec<&'ast CallExpr<'ast>>,
) {
    match stmt {
        Stmt::Expr(s) => collect_in_expr(ctx, s.expr, out),
        Stmt::LocalDecl(s) => {
            if let Some(init) = s.init {
                collect_in_expr(ctx, init, out);
            }
        }
        Stmt::Assign(s) => collect_in_expr(ctx, s.value, out),
        Stmt::If(s) => {
            collect_in_expr(ctx, s.cond, out);
            collect_iter_calls(ctx, &s.then_block, out);
            if let Some(else_block) = &s.else_block {
                collect_iter_calls(ctx, else_block, out);
            }
        }
        // Nested loops hoist their own iterator state.
        Stmt::Loop(_) => {}
        Stmt::Case(s) => {
            collect_in_expr(ctx, s.subject, out);
            for arm in s.arms {
                for value in arm.values {
                    collect_in_expr(ctx, value, out);
                }
                collect_iter_calls(ctx, &arm.body, out);
            }
            if let Some(else_block) = &s.else_block {
                collect_iter_calls(ctx, else_block, out);
            }
        }
        Stmt::Typecase(s) => {
            for arm in s.arms {
                collect_iter_calls(ctx, &arm.body, out);
            }
            if let Some(else_block) = &s.else_block {
                collect_iter_calls(ctx, else_block, out);
            }
        }
        Stmt::Protect(s) => {
            collect_iter_calls(ctx, &s.body, out);
            for arm in s.whens {
                collect_iter_calls(ctx, &arm.body, out);
            }
            if let Some(else_block) = &s.else_block {
                collect_iter_calls(ctx, else_block, out);
            }
        }
        Stmt::Raise(s) => collect_in_expr(ctx, s.value, out),
        Stmt::Return(s) => {
            if let Some(value) = s.value {
                collect_in_expr(ctx, value, out);
            }
        }
        Stmt::Yield(s) => {
            if let Some(value) = s.value {
                collect_in_expr(ctx, value, out);
            }
        }
        Stmt::Break(_) => {}
    }
}

fn collect_in_expr<'ast>(
    ctx: &CompilationContext,
    expr: &Expr<'ast>,
    out: &mut Vec<&'ast CallExpr<'ast>>,
) {
    if let Expr::Call(call) = *expr {
        if let Some(receiver) = call.receiver {
            collect_in_expr(ctx, receiver, out);
        }
        for arg in call.args {
            collect_in_expr(ctx, arg.expr, out);
        }
        if ctx.iter_calls.contains_key(&call.id) {
            out.push(call);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompileOptions;
    use crate::passes::check::Check;
    use crate::passes::element_creation::ElementCreation;
    use crate::passes::type_creation::TypeCreation;
    use bumpalo::Bump;
    use sable_ast::{AstBuilder, ClassKindSpec};
    use sable_core::Mode;
    use sable_registry::BuiltinEnvironment;

    fn compile(
        unit: &SourceUnit<'_>,
        options: CompileOptions,
    ) -> (CompilationContext, CompiledProgram) {
        let mut ctx = CompilationContext::new(&BuiltinEnvironment::minimal(), options).unwrap();
        TypeCreation::new(&mut ctx).run(unit);
        ElementCreation::new(&mut ctx).run(unit);
        Check::new(&mut ctx).run(unit);
        assert!(!ctx.diags.has_errors(), "{:?}", ctx.diags.error_messages());
        let program = Codegen::new(&mut ctx).run(unit);
        (ctx, program)
    }

    fn named<'a>(program: &'a CompiledProgram, name: &str) -> &'a CompiledRoutine {
        program
            .routines
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("no routine named {name:?}"))
    }

    fn ops(routine: &CompiledRoutine) -> Vec<Op> {
        routine.code.instrs.iter().map(|i| i.op).collect()
    }

    #[test]
    fn returns_route_through_the_shared_epilogue() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.routine(
                "m",
                vec![],
                Some("INT"),
                Some(b.block(vec![b.ret(Some(b.int(7)))])),
            )],
        )]);
        let (_, program) = compile(&unit, CompileOptions::default());
        let m = named(&program, "m");
        let ops = ops(m);
        assert!(ops.contains(&Op::LoadConst));
        assert!(ops.contains(&Op::StoreLocal));
        assert!(ops.contains(&Op::Leave));
        // Epilogue reloads the result before the final return.
        assert_eq!(ops.last(), Some(&Op::Return));
        assert_eq!(ops[ops.len() - 2], Op::LoadLocal);
        // One frame slot for the result on top of zero parameters.
        assert_eq!(m.frame_size, 1);
    }

    #[test]
    fn loops_hoist_iterator_construction_before_the_head() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.routine(
                "m",
                vec![],
                None,
                Some(b.block(vec![b.loop_stmt(b.block(vec![b.expr_stmt(b.call(
                    Some(b.int(0)),
                    "upto!",
                    vec![b.arg(b.int(3))],
                ))]))])),
            )],
        )]);
        let (_, program) = compile(&unit, CompileOptions::default());
        let ops = ops(named(&program, "m"));
        let init = ops.iter().position(|&op| op == Op::IterInit).unwrap();
        let next = ops.iter().position(|&op| op == Op::IterNext).unwrap();
        assert!(init < next);
        assert!(ops.contains(&Op::IterCurrent));
        // Element unused in statement position.
        assert!(ops.contains(&Op::Pop));
        // The once bound is captured at construction, not per trip.
        assert!(!ops.contains(&Op::PushVoid));
    }

    #[test]
    fn iterator_bodies_dispatch_on_the_resume_position() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.iter(
                "pair!",
                vec![],
                Some("INT"),
                Some(b.block(vec![
                    b.yield_stmt(Some(b.int(1))),
                    b.yield_stmt(Some(b.int(2))),
                ])),
            )],
        )]);
        let (ctx, program) = compile(&unit, CompileOptions::default());
        let body = named(&program, "pair!");
        let switch = body
            .code
            .instrs
            .iter()
            .find(|i| i.op == Op::Switch)
            .expect("resume dispatch");
        let Some(Operand::Labels(labels)) = switch.operands.first() else {
            panic!("switch carries a label table");
        };
        // Entry plus one label per yield.
        assert_eq!(labels.len(), 3);
        let steps: Vec<&Operand> = body
            .code
            .instrs
            .iter()
            .filter(|i| i.op == Op::PushStep)
            .flat_map(|i| i.operands.first())
            .collect();
        assert_eq!(
            steps,
            vec![
                &Operand::Step(IterStep::Value),
                &Operand::Step(IterStep::Value),
                &Operand::Step(IterStep::Exhausted),
            ]
        );

        // The holder's construction method wires self and the entry
        // resume position.
        let create = program
            .routine(ctx.iters[0].create.unwrap())
            .expect("holder create");
        let create_ops = ops(create);
        assert_eq!(create_ops.first(), Some(&Op::New));
        assert!(create_ops.contains(&Op::StoreField));
        assert_eq!(create_ops.last(), Some(&Op::Return));
    }

    #[test]
    fn value_arguments_box_into_abstract_parameters() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![
                b.routine("m", vec![b.param("x", Mode::In, "$OB")], None, None),
                b.routine(
                    "n",
                    vec![],
                    None,
                    Some(b.block(vec![b.expr_stmt(b.call(
                        Some(b.self_expr()),
                        "m",
                        vec![b.arg(b.int(1))],
                    ))])),
                ),
            ],
        )]);
        let (_, program) = compile(&unit, CompileOptions::default());
        assert!(ops(named(&program, "n")).contains(&Op::Box_));
    }

    #[test]
    fn adapter_construction_beats_plain_boxing() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![
            b.class(
                "$A",
                ClassKindSpec::Abstract,
                vec![],
                vec!["INT"],
                vec![b.routine(
                    "plus",
                    vec![b.param("x", Mode::In, "INT")],
                    Some("INT"),
                    None,
                )],
            ),
            b.class(
                "C",
                ClassKindSpec::Reference,
                vec![],
                vec![],
                vec![b.routine(
                    "m",
                    vec![],
                    None,
                    Some(b.block(vec![b.local("a", "$A", Some(b.int(1)))])),
                )],
            ),
        ]);
        let (ctx, program) = compile(&unit, CompileOptions::default());
        let m = ops(named(&program, "m"));
        assert!(m.contains(&Op::CallCtor));
        assert!(!m.contains(&Op::Box_));
        // The adapter's own machinery is emitted alongside.
        let adapter = &ctx.adapters[0];
        let ctor = program.routine(adapter.constructor.unwrap()).unwrap();
        assert_eq!(ops(ctor).first(), Some(&Op::New));
        let bridge = program.routine(adapter.bridges[0].bridge).unwrap();
        let bridge_ops = ops(bridge);
        assert_eq!(bridge_ops.first(), Some(&Op::LoadSelf));
        assert!(bridge_ops.contains(&Op::Call));
    }

    #[test]
    fn protect_emits_a_try_region_with_typed_handlers() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.routine(
                "m",
                vec![],
                None,
                Some(b.block(vec![b.protect(
                    b.block(vec![b.raise(b.str_lit("boom"))]),
                    vec![b.when_arm("STR", b.block(vec![]))],
                    None,
                )])),
            )],
        )]);
        let (_, program) = compile(&unit, CompileOptions::default());
        let m = ops(named(&program, "m"));
        assert!(m.contains(&Op::TryEnter));
        assert!(m.contains(&Op::Raise));
        assert!(m.contains(&Op::TryExit));
        assert!(m.contains(&Op::Catch));
    }

    #[test]
    fn case_dispatches_through_delegated_equality() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.routine(
                "m",
                vec![b.param("x", Mode::In, "INT")],
                None,
                Some(b.block(vec![b.case(
                    b.name("x"),
                    vec![b.case_arm(vec![b.int(1)], b.block(vec![]))],
                    None,
                )])),
            )],
        )]);
        let (_, program) = compile(&unit, CompileOptions::default());
        let m = ops(named(&program, "m"));
        // INT carries a container is_eq, so no builtin fallback.
        assert!(m.contains(&Op::Call));
        assert!(!m.contains(&Op::Eq));
        assert!(m.contains(&Op::BranchTrue));
    }

    #[test]
    fn classes_without_bodies_get_synthesized_slots() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![],
        )]);
        let (ctx, program) = compile(&unit, CompileOptions::default());
        let class = ctx.class(ctx.types.resolve_name("C").unwrap()).unwrap();
        let ctor = program.routine(class.constructor.unwrap()).unwrap();
        assert_eq!(ops(ctor), vec![Op::New, Op::Return]);
        let sinit = program.routine(class.static_init.unwrap()).unwrap();
        assert_eq!(ops(sinit), vec![Op::Return]);
    }

    #[test]
    fn executables_wire_the_main_entry_point() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "MAIN",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.routine("main", vec![], None, Some(b.block(vec![])))],
        )]);
        let (_, program) = compile(&unit, CompileOptions { executable: true });
        let entry = program.entry_point.expect("entry point");
        let stub = named(&program, "$entry");
        assert_eq!(stub.owner, entry.class);
        assert_eq!(ops(stub), vec![Op::CallCtor, Op::Call, Op::Return]);
    }

    #[test]
    fn executables_without_main_are_rejected() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![],
        )]);
        let mut ctx =
            CompilationContext::new(&BuiltinEnvironment::minimal(), CompileOptions {
                executable: true,
            })
            .unwrap();
        TypeCreation::new(&mut ctx).run(&unit);
        ElementCreation::new(&mut ctx).run(&unit);
        Check::new(&mut ctx).run(&unit);
        let program = Codegen::new(&mut ctx).run(&unit);
        assert!(program.entry_point.is_none());
        assert!(
            ctx.diags
                .error_messages()
                .iter()
                .any(|m| m.contains("'main'"))
        );
    }
}
