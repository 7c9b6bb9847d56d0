//! Pass 2: element creation.
//!
//! Declares every member signature, checks sibling conflicts, discharges
//! the abstract obligations concrete classes inherit, binds adapter
//! bridges, and synthesizes the state-holder machinery for iterator
//! members. After this pass the registry holds every callable signature
//! the checker can resolve against.

use rustc_hash::FxHashMap;
use sable_ast::{ClassDecl, IterDecl, Member, RoutineDecl, SourceUnit};
use sable_core::{
    ClassInfo, ClassKind, IterDefinition, LookupError, MethodId, MethodSignature, Mode, Param,
    SemanticError, TypeFlags, TypeId, params_conform,
};

use crate::context::CompilationContext;

pub struct ElementCreation<'ctx, 'ast> {
    ctx: &'ctx mut CompilationContext,
    decls: FxHashMap<TypeId, &'ast ClassDecl<'ast>>,
}

impl<'ctx, 'ast> ElementCreation<'ctx, 'ast> {
    pub fn new(ctx: &'ctx mut CompilationContext) -> Self {
        Self {
            ctx,
            decls: FxHashMap::default(),
        }
    }

    pub fn run(mut self, unit: &'ast SourceUnit<'ast>) {
        for class in unit.classes {
            let id = TypeId::from_name(class.name);
            if self.ctx.classes.contains_key(&id) {
                self.decls.entry(id).or_insert(class);
            }
        }

        for id in self.ctx.class_order.clone() {
            if let Some(decl) = self.decls.get(&id).copied() {
                self.process_class(id, decl);
            }
        }

        for index in 0..self.ctx.adapters.len() {
            self.process_adapter(index);
        }
    }

    // ==========================================================================
    // User classes
    // ==========================================================================

    fn process_class(&mut self, id: TypeId, decl: &'ast ClassDecl<'ast>) {
        let concrete = self
            .ctx
            .class(id)
            .is_some_and(|c| c.kind == ClassKind::Reference);

        let mut iter_members: Vec<(&'ast IterDecl<'ast>, MethodId)> = Vec::new();
        for member in decl.members {
            match member {
                Member::Routine(routine) => {
                    self.declare_routine(id, decl, routine);
                }
                Member::Iter(iter) => {
                    if let Some(method) = self.declare_iter(id, decl, iter) {
                        iter_members.push((iter, method));
                    }
                }
            }
        }

        if !concrete {
            return;
        }

        // Every method reachable through the ancestor chain is an
        // obligation a concrete class must discharge exactly.
        let obligations = self.collect_obligations(id);
        let mut iter_bridge_rets: FxHashMap<MethodId, Vec<TypeId>> = FxHashMap::default();
        for obligation in obligations {
            match self.find_discharge(id, &obligation) {
                Some(method) => {
                    let impl_sig = self.ctx.types.method(method).cloned();
                    if let Some(impl_sig) = impl_sig
                        && impl_sig.is_iter()
                        && impl_sig.return_type != obligation.return_type
                        && let Some(ret) = obligation.return_type
                    {
                        let rets = iter_bridge_rets.entry(method).or_default();
                        if !rets.contains(&ret) {
                            rets.push(ret);
                        }
                    }
                }
                None => {
                    self.ctx.add_error(SemanticError::NoImplementation {
                        method: obligation.name.clone(),
                        abstract_type: self.ctx.types.type_name(obligation.owner).to_string(),
                        class: decl.name.to_string(),
                        span: decl.span,
                    });
                }
            }
        }

        for (iter, method) in iter_members {
            let bridge_rets = iter_bridge_rets.remove(&method).unwrap_or_default();
            self.synthesize_iter(id, decl.name, iter, method, bridge_rets);
        }
    }

    fn declare_routine(
        &mut self,
        owner: TypeId,
        class: &ClassDecl<'_>,
        routine: &RoutineDecl<'_>,
    ) {
        let Ok(sig) = self.resolve_signature(owner, routine.name, routine.params, routine.return_type)
        else {
            return;
        };

        // A user `create` with the default constructor's exact shape takes
        // over the slot declared in type creation.
        if let Some(ctor) = self.ctx.class(owner).and_then(|c| c.constructor)
            && sig.id() == ctor
        {
            self.ctx.member_methods.insert(routine.id, ctor);
            return;
        }

        match self.try_declare(owner, sig) {
            Ok(method) => {
                self.ctx.member_methods.insert(routine.id, method);
                if let Some(info) = self.ctx.classes.get_mut(&owner) {
                    info.methods.push(method);
                }
            }
            Err(LookupError::Conflict { existing }) => {
                self.ctx.add_error(SemanticError::SignatureConflict {
                    name: routine.name.to_string(),
                    existing,
                    class: class.name.to_string(),
                    span: routine.span,
                });
            }
            Err(LookupError::Unresolved) => {}
        }
    }

    fn declare_iter(
        &mut self,
        owner: TypeId,
        class: &ClassDecl<'_>,
        iter: &IterDecl<'_>,
    ) -> Option<MethodId> {
        let Ok(sig) = self.resolve_signature(owner, iter.name, iter.params, iter.return_type)
        else {
            return None;
        };
        match self.try_declare(owner, sig) {
            Ok(method) => {
                self.ctx.member_methods.insert(iter.id, method);
                if let Some(info) = self.ctx.classes.get_mut(&owner) {
                    info.methods.push(method);
                }
                Some(method)
            }
            Err(LookupError::Conflict { existing }) => {
                self.ctx.add_error(SemanticError::SignatureConflict {
                    name: iter.name.to_string(),
                    existing,
                    class: class.name.to_string(),
                    span: iter.span,
                });
                None
            }
            Err(LookupError::Unresolved) => None,
        }
    }

    /// Resolve parameter and return specifiers into a signature. Unknown
    /// types are reported here; the member is then skipped.
    fn resolve_signature(
        &mut self,
        owner: TypeId,
        name: &str,
        params: &[sable_ast::ParamDecl<'_>],
        return_type: Option<sable_ast::TypeSpec<'_>>,
    ) -> Result<MethodSignature, LookupError> {
        let mut resolved = Vec::with_capacity(params.len());
        let mut failed = false;
        for param in params {
            match self.ctx.types.resolve_name(param.ty.name) {
                Some(ty) => resolved.push(Param::new(param.name, param.mode, ty)),
                None => {
                    self.ctx.add_error(SemanticError::UnknownType {
                        name: param.ty.name.to_string(),
                        span: param.ty.span,
                    });
                    failed = true;
                }
            }
        }
        let ret = match return_type {
            Some(spec) => match self.ctx.types.resolve_name(spec.name) {
                Some(ty) => Some(ty),
                None => {
                    self.ctx.add_error(SemanticError::UnknownType {
                        name: spec.name.to_string(),
                        span: spec.span,
                    });
                    failed = true;
                    None
                }
            },
            None => None,
        };
        if failed {
            return Err(LookupError::Unresolved);
        }
        Ok(MethodSignature::new(owner, name, resolved, ret))
    }

    /// Conflict-check against the siblings already on `owner`, then
    /// declare.
    fn try_declare(
        &mut self,
        owner: TypeId,
        sig: MethodSignature,
    ) -> Result<MethodId, LookupError> {
        let existing: Vec<MethodId> = self
            .ctx
            .types
            .get(owner)
            .map(|d| d.methods.clone())
            .unwrap_or_default();
        for other in existing {
            let Some(other_sig) = self.ctx.types.method(other) else {
                continue;
            };
            if self.ctx.types.signatures_conflict(&sig, other_sig) {
                return Err(LookupError::Conflict {
                    existing: other_sig.name.clone(),
                });
            }
        }
        self.ctx
            .types
            .declare_method(sig)
            .map_err(|_| LookupError::Unresolved)
    }

    // ==========================================================================
    // Obligations
    // ==========================================================================

    fn collect_obligations(&mut self, id: TypeId) -> Vec<MethodSignature> {
        let ancestors = self.ctx.types.ancestors(id).to_vec();
        let mut out = Vec::new();
        for ancestor in ancestors {
            if !self.ctx.types.is_abstract(ancestor) {
                continue;
            }
            let methods = self
                .ctx
                .types
                .get(ancestor)
                .map(|d| d.methods.clone())
                .unwrap_or_default();
            for method in methods {
                if let Some(sig) = self.ctx.types.method(method) {
                    out.push(sig.clone());
                }
            }
        }
        out
    }

    /// A declared method on `id` that discharges `obligation`: exact
    /// conformance, except that iterators may narrow the return type.
    fn find_discharge(&self, id: TypeId, obligation: &MethodSignature) -> Option<MethodId> {
        for &method in self.ctx.types.methods_named(id, &obligation.name) {
            let Some(sig) = self.ctx.types.method(method) else {
                continue;
            };
            if sig.conforms_to(obligation) {
                return Some(method);
            }
            if sig.is_iter()
                && obligation.is_iter()
                && let (Some(have), Some(want)) = (sig.return_type, obligation.return_type)
                && self.ctx.types.subtype(have, want)
                && params_conform(&sig.params, Some(want), &sig.name, obligation)
            {
                return Some(method);
            }
        }
        None
    }

    // ==========================================================================
    // Iterator state holders
    // ==========================================================================

    fn synthesize_iter(
        &mut self,
        owner: TypeId,
        owner_name: &str,
        iter: &IterDecl<'_>,
        method: MethodId,
        bridge_rets: Vec<TypeId>,
    ) {
        let Some(sig) = self.ctx.types.method(method).cloned() else {
            return;
        };
        let base = sig.name.trim_end_matches('!');
        let holder_name = format!("{owner_name}${base}$state");
        // The holder sits under every ancestor return type the iterator
        // discharges, so state machines flow wherever the contract does.
        let Ok(holder) =
            self.ctx
                .types
                .declare_type(&holder_name, TypeFlags::SYNTHETIC, bridge_rets.clone())
        else {
            return;
        };

        let mut def = IterDefinition::new(owner, method, holder, iter.span);
        def.element_type = sig.return_type;
        def.current_field = sig.return_type.map(|_| "current".to_string());
        for (index, param) in sig.params.iter().enumerate() {
            if param.mode == Mode::Once {
                def.once_fields.push((param.name.clone(), param.ty));
                def.once_params.push(index);
            }
        }

        // The primary construction method captures the enclosing instance
        // and the once arguments.
        let mut create_params = vec![Param::new("self", Mode::In, owner)];
        for &(ref name, ty) in &def.once_fields {
            create_params.push(Param::new(name.clone(), Mode::In, ty));
        }
        def.create = self
            .ctx
            .types
            .declare_method(MethodSignature::new(
                holder,
                "create",
                create_params.clone(),
                Some(holder),
            ))
            .ok();

        // Resumption takes the non-once arguments every trip.
        let resume_params: Vec<Param> = sig
            .params
            .iter()
            .filter(|p| p.mode != Mode::Once)
            .cloned()
            .collect();
        def.move_next = self
            .ctx
            .types
            .declare_method(MethodSignature::new(
                holder,
                "move_next",
                resume_params,
                Some(self.ctx.well_known.int),
            ))
            .ok();

        if let Some(element) = def.element_type {
            def.read_current = self
                .ctx
                .types
                .declare_method(MethodSignature::new(
                    holder,
                    "current",
                    Vec::new(),
                    Some(element),
                ))
                .ok();
        }

        // A widening construction alias per distinct ancestor return type
        // the iterator discharges covariantly.
        for &ret in &bridge_rets {
            let name = format!(
                "create$as${}",
                self.ctx.types.type_name(ret).trim_start_matches('$')
            );
            if let Ok(bridge) = self.ctx.types.declare_method(MethodSignature::new(
                holder,
                &name,
                create_params.clone(),
                Some(holder),
            )) {
                def.bridge_creates.push((ret, bridge));
            }
        }

        let mut info = ClassInfo::new(holder_name, holder, ClassKind::Reference, iter.span);
        info.supertypes = bridge_rets;
        info.constructor = def.create;
        self.ctx.classes.insert(holder, info);
        self.ctx.class_order.push(holder);

        let index = self.ctx.iters.len();
        self.ctx.iters.push(def);
        self.ctx.iter_by_method.insert(method, index);
    }

    // ==========================================================================
    // Adapters
    // ==========================================================================

    fn process_adapter(&mut self, index: usize) {
        let (abstract_type, adaptee, adapter_type) = {
            let a = &self.ctx.adapters[index];
            (a.abstract_type, a.adaptee, a.adapter_type)
        };
        let span = self
            .ctx
            .class(adapter_type)
            .map(|c| c.span)
            .unwrap_or_default();

        let ctor = self
            .ctx
            .types
            .declare_method(MethodSignature::new(
                adapter_type,
                "create",
                vec![Param::new("adaptee", Mode::In, adaptee)],
                Some(adapter_type),
            ))
            .ok();
        self.ctx.adapters[index].constructor = ctor;
        if let Some(info) = self.ctx.classes.get_mut(&adapter_type) {
            info.constructor = ctor;
        }

        // Everything reachable from the abstract class must forward.
        let mut obligations = self
            .ctx
            .types
            .get(abstract_type)
            .map(|d| d.methods.clone())
            .unwrap_or_default();
        for ancestor in self.ctx.types.ancestors(abstract_type).to_vec() {
            if let Some(desc) = self.ctx.types.get(ancestor) {
                obligations.extend(desc.methods.iter().copied());
            }
        }

        // Identical obligations inherited through several ancestors all
        // bind to the one bridge that shape declares.
        let mut declared_bridges: FxHashMap<MethodId, MethodId> = FxHashMap::default();
        for obligation_id in obligations {
            let Some(obligation) = self.ctx.types.method(obligation_id).cloned() else {
                continue;
            };
            match self.find_bridge_target(adaptee, &obligation) {
                Some((target, via_container)) => {
                    let bridge_sig = MethodSignature::new(
                        adapter_type,
                        &obligation.name,
                        obligation.params.clone(),
                        obligation.return_type,
                    );
                    let key = bridge_sig.id();
                    let bridge = match declared_bridges.get(&key).copied() {
                        Some(bridge) => Some(bridge),
                        None => {
                            let declared = self.ctx.types.declare_method(bridge_sig).ok();
                            if let Some(bridge) = declared {
                                declared_bridges.insert(key, bridge);
                                if let Some(info) = self.ctx.classes.get_mut(&adapter_type) {
                                    info.methods.push(bridge);
                                }
                            }
                            declared
                        }
                    };
                    if let Some(bridge) = bridge {
                        self.ctx.adapters[index]
                            .bridges
                            .push(sable_core::BridgeBinding {
                                obligation: obligation_id,
                                bridge,
                                target,
                                via_container,
                            });
                    }
                }
                None => {
                    self.ctx.add_error(SemanticError::NoImplementation {
                        method: obligation.name.clone(),
                        abstract_type: self.ctx.types.type_name(abstract_type).to_string(),
                        class: self.ctx.types.type_name(adaptee).to_string(),
                        span,
                    });
                }
            }
        }
    }

    /// An adaptee method the bridge can forward to: a direct conforming
    /// method, or a container method whose tail (after the explicit self
    /// parameter) conforms.
    fn find_bridge_target(
        &self,
        adaptee: TypeId,
        obligation: &MethodSignature,
    ) -> Option<(MethodId, bool)> {
        for &method in self.ctx.types.methods_named(adaptee, &obligation.name) {
            if self
                .ctx
                .types
                .method(method)
                .is_some_and(|sig| sig.conforms_to(obligation))
            {
                return Some((method, false));
            }
        }
        let container = self.ctx.types.container(adaptee)?;
        for &method in self.ctx.types.methods_named(container, &obligation.name) {
            let Some(sig) = self.ctx.types.method(method) else {
                continue;
            };
            let self_ok = sig
                .params
                .first()
                .is_some_and(|p| self.ctx.types.subtype(adaptee, p.ty));
            if self_ok
                && params_conform(&sig.params[1..], sig.return_type, &sig.name, obligation)
            {
                return Some((method, true));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompileOptions;
    use crate::passes::type_creation::TypeCreation;
    use bumpalo::Bump;
    use sable_ast::{AstBuilder, ClassKindSpec};
    use sable_registry::BuiltinEnvironment;

    fn check(unit: &SourceUnit<'_>) -> CompilationContext {
        let mut ctx =
            CompilationContext::new(&BuiltinEnvironment::minimal(), CompileOptions::default())
                .unwrap();
        TypeCreation::new(&mut ctx).run(unit);
        ElementCreation::new(&mut ctx).run(unit);
        ctx
    }

    #[test]
    fn undischarged_obligation_is_fatal() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![
            b.class(
                "$A",
                ClassKindSpec::Abstract,
                vec![],
                vec![],
                vec![b.routine("foo", vec![], Some("INT"), None)],
            ),
            b.class("C", ClassKindSpec::Reference, vec!["$A"], vec![], vec![]),
        ]);
        let ctx = check(&unit);
        let messages = ctx.diags.error_messages().join("\n");
        assert!(messages.contains("foo"), "{messages}");
        assert!(messages.contains("$A"), "{messages}");
        assert!(messages.contains("'C'"), "{messages}");
    }

    #[test]
    fn conforming_member_discharges_the_obligation() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![
            b.class(
                "$A",
                ClassKindSpec::Abstract,
                vec![],
                vec![],
                vec![b.routine("foo", vec![], Some("INT"), None)],
            ),
            b.class(
                "C",
                ClassKindSpec::Reference,
                vec!["$A"],
                vec![],
                vec![b.routine(
                    "foo",
                    vec![],
                    Some("INT"),
                    Some(b.block(vec![b.ret(Some(b.int(1)))])),
                )],
            ),
        ]);
        let ctx = check(&unit);
        assert!(!ctx.diags.has_errors(), "{:?}", ctx.diags.error_messages());
    }

    #[test]
    fn identical_sibling_signatures_conflict() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = || Some(b.block(vec![b.ret(Some(b.int(1)))]));
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![
                b.routine("m", vec![b.param("x", Mode::In, "INT")], Some("INT"), body()),
                b.routine("m", vec![b.param("y", Mode::In, "INT")], Some("INT"), body()),
            ],
        )]);
        let ctx = check(&unit);
        assert!(
            ctx.diags
                .error_messages()
                .iter()
                .any(|m| m.contains("conflicts"))
        );
    }

    #[test]
    fn related_abstract_parameters_conflict() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = || Some(b.block(vec![]));
        let unit = b.unit(vec![
            b.class("$A", ClassKindSpec::Abstract, vec![], vec![], vec![]),
            b.class("$B", ClassKindSpec::Abstract, vec!["$A"], vec![], vec![]),
            b.class(
                "C",
                ClassKindSpec::Reference,
                vec![],
                vec![],
                vec![
                    b.routine("m", vec![b.param("x", Mode::In, "$A")], None, body()),
                    b.routine("m", vec![b.param("x", Mode::In, "$B")], None, body()),
                ],
            ),
        ]);
        let ctx = check(&unit);
        assert!(
            ctx.diags
                .error_messages()
                .iter()
                .any(|m| m.contains("conflicts"))
        );
    }

    #[test]
    fn unrelated_overloads_coexist() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = || Some(b.block(vec![]));
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![
                b.routine("m", vec![b.param("x", Mode::In, "INT")], None, body()),
                b.routine("m", vec![b.param("x", Mode::In, "STR")], None, body()),
            ],
        )]);
        let ctx = check(&unit);
        assert!(!ctx.diags.has_errors(), "{:?}", ctx.diags.error_messages());
    }

    #[test]
    fn iterator_member_gets_a_state_holder() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.iter(
                "elts!",
                vec![b.param("n", Mode::Once, "INT")],
                Some("INT"),
                Some(b.block(vec![b.yield_stmt(Some(b.int(1)))])),
            )],
        )]);
        let ctx = check(&unit);
        assert!(!ctx.diags.has_errors(), "{:?}", ctx.diags.error_messages());
        assert_eq!(ctx.iters.len(), 1);
        let def = &ctx.iters[0];
        assert_eq!(ctx.types.type_name(def.holder_type), "C$elts$state");
        assert!(def.create.is_some());
        assert!(def.move_next.is_some());
        assert!(def.read_current.is_some());
        assert_eq!(def.once_params, vec![0]);
        assert_eq!(def.once_fields[0].0, "n");
        assert_eq!(def.element_type, Some(ctx.well_known.int));
    }

    #[test]
    fn adapter_bridges_through_the_builtin_container() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "$ADDABLE",
            ClassKindSpec::Abstract,
            vec![],
            vec!["INT"],
            vec![b.routine(
                "plus",
                vec![b.param("other", Mode::In, "INT")],
                Some("INT"),
                None,
            )],
        )]);
        let ctx = check(&unit);
        assert!(!ctx.diags.has_errors(), "{:?}", ctx.diags.error_messages());
        let adapter = &ctx.adapters[0];
        assert!(adapter.constructor.is_some());
        assert_eq!(adapter.bridges.len(), 1);
        assert!(adapter.bridges[0].via_container);
    }

    #[test]
    fn unbridgeable_adapter_obligation_is_fatal() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "$SHOW",
            ClassKindSpec::Abstract,
            vec![],
            vec!["STR"],
            vec![b.routine("show", vec![], Some("STR"), None)],
        )]);
        let ctx = check(&unit);
        let messages = ctx.diags.error_messages().join("\n");
        assert!(messages.contains("no implementation of 'show'"), "{messages}");
    }

    #[test]
    fn covariant_iterator_state_flows_under_the_ancestor_element_type() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![
            b.class(
                "$SEQ",
                ClassKindSpec::Abstract,
                vec![],
                vec![],
                vec![b.iter("elts!", vec![], Some("$NUM"), None)],
            ),
            b.class(
                "C",
                ClassKindSpec::Reference,
                vec!["$SEQ"],
                vec![],
                vec![b.iter(
                    "elts!",
                    vec![],
                    Some("INT"),
                    Some(b.block(vec![b.yield_stmt(Some(b.int(1)))])),
                )],
            ),
        ]);
        let ctx = check(&unit);
        assert!(!ctx.diags.has_errors(), "{:?}", ctx.diags.error_messages());
        let num = ctx.types.resolve_name("$NUM").unwrap();
        let def = &ctx.iters[0];
        assert!(ctx.types.subtype(def.holder_type, num));
        assert_eq!(def.bridge_creates.len(), 1);
        assert_eq!(def.bridge_creates[0].0, num);
    }

    #[test]
    fn shared_ancestor_obligations_reuse_one_bridge() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let sig =
            || b.routine("plus", vec![b.param("other", Mode::In, "INT")], Some("INT"), None);
        let unit = b.unit(vec![
            b.class("$A", ClassKindSpec::Abstract, vec![], vec![], vec![sig()]),
            b.class("$B", ClassKindSpec::Abstract, vec![], vec![], vec![sig()]),
            b.class(
                "$C",
                ClassKindSpec::Abstract,
                vec!["$A", "$B"],
                vec!["INT"],
                vec![],
            ),
        ]);
        let ctx = check(&unit);
        assert!(!ctx.diags.has_errors(), "{:?}", ctx.diags.error_messages());
        let adapter = &ctx.adapters[0];
        assert_eq!(adapter.bridges.len(), 2);
        assert_eq!(adapter.bridges[0].bridge, adapter.bridges[1].bridge);
        assert_ne!(adapter.bridges[0].obligation, adapter.bridges[1].obligation);
    }

    #[test]
    fn user_create_takes_over_the_default_constructor() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.routine(
                "create",
                vec![],
                Some("C"),
                Some(b.block(vec![b.ret(Some(b.self_expr()))])),
            )],
        )]);
        let ctx = check(&unit);
        assert!(!ctx.diags.has_errors(), "{:?}", ctx.diags.error_messages());
    }
}
