//! Pass 1: type creation.
//!
//! Registers a descriptor for every declared class, resolves supertype
//! clauses, and synthesizes an adapter type for every `(abstract class,
//! declared subtype)` pair introduced by a subtype clause. Resolution is
//! demand-driven and recursive so a class may reference classes declared
//! after it; the registry's resolving set turns cycles into diagnostics
//! instead of unbounded recursion.

use rustc_hash::FxHashMap;
use sable_ast::{ClassDecl, ClassKindSpec, SourceUnit, TypeSpec};
use sable_core::{
    AdapterId, ClassInfo, ClassKind, MethodId, MethodSignature, SemanticError,
    SupertypingAdapter, TypeFlags, TypeId,
};

use crate::context::CompilationContext;

pub struct TypeCreation<'ctx, 'ast> {
    ctx: &'ctx mut CompilationContext,
    decls: FxHashMap<&'ast str, &'ast ClassDecl<'ast>>,
}

impl<'ctx, 'ast> TypeCreation<'ctx, 'ast> {
    pub fn new(ctx: &'ctx mut CompilationContext) -> Self {
        Self {
            ctx,
            decls: FxHashMap::default(),
        }
    }

    pub fn run(mut self, unit: &'ast SourceUnit<'ast>) {
        for class in unit.classes {
            if self.ctx.types.resolve_name(class.name).is_some() {
                self.ctx.add_error(SemanticError::BuiltinRedefinition {
                    name: class.name.to_string(),
                    span: class.span,
                });
                continue;
            }
            if self.decls.insert(class.name, class).is_some() {
                self.ctx.add_error(SemanticError::DuplicateClass {
                    name: class.name.to_string(),
                    span: class.span,
                });
            }
        }

        let ordered: Vec<&'ast ClassDecl<'ast>> = unit
            .classes
            .iter()
            .filter(|c| {
                self.decls
                    .get(c.name)
                    .is_some_and(|d| std::ptr::eq(*d, *c))
            })
            .collect();
        for class in ordered {
            self.resolve_class(class);
        }
    }

    /// Create the descriptor for one class, creating its supertypes (and,
    /// for abstract classes, its declared subtypes) first. Idempotent.
    fn resolve_class(&mut self, decl: &'ast ClassDecl<'ast>) -> Option<TypeId> {
        let id = TypeId::from_name(decl.name);
        if self.ctx.classes.contains_key(&id) {
            return Some(id);
        }
        if !self.ctx.types.begin_resolving(id) {
            self.ctx.add_error(SemanticError::CircularSupertype {
                name: decl.name.to_string(),
                span: decl.span,
            });
            return None;
        }

        let mut parents = Vec::new();
        for spec in decl.supertypes {
            let Some(parent) = self.resolve_spec(spec) else {
                continue;
            };
            if !self.ctx.types.is_abstract(parent) {
                self.ctx.add_error(SemanticError::NonAbstractSupertype {
                    supertype: spec.name.to_string(),
                    class: decl.name.to_string(),
                    span: spec.span,
                });
                continue;
            }
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }

        let (kind, flags) = match decl.kind {
            ClassKindSpec::Reference => (ClassKind::Reference, TypeFlags::empty()),
            ClassKindSpec::Abstract => (ClassKind::Abstract, TypeFlags::ABSTRACT),
        };
        let id = match self.ctx.types.declare_type(decl.name, flags, parents.clone()) {
            Ok(id) => id,
            Err(_) => {
                // Name collision was already reported above.
                self.ctx.types.finish_resolving(id);
                return None;
            }
        };

        let mut info = ClassInfo::new(decl.name, id, kind, decl.span);
        info.supertypes = parents;

        if kind == ClassKind::Reference {
            info.constructor = self.declare_constructor(id);
            info.static_init = self.declare_static_init(id);
        }

        self.ctx.classes.insert(id, info);
        self.ctx.class_order.push(id);

        // Subtype clauses retrofit existing types under this abstract
        // class through synthesized adapters.
        if kind == ClassKind::Abstract {
            for spec in decl.subtypes {
                let spec = *spec;
                let Some(adaptee) = self.resolve_spec(&spec) else {
                    continue;
                };
                self.synthesize_adapter(id, decl.name, adaptee, spec);
            }
        }

        self.ctx.types.finish_resolving(id);
        Some(id)
    }

    /// Resolve a type specifier, creating the named class on demand.
    fn resolve_spec(&mut self, spec: &TypeSpec<'ast>) -> Option<TypeId> {
        if let Some(decl) = self.decls.get(spec.name).copied() {
            return self.resolve_class(decl);
        }
        match self.ctx.types.resolve_name(spec.name) {
            Some(id) => Some(id),
            None => {
                self.ctx.add_error(SemanticError::UnknownType {
                    name: spec.name.to_string(),
                    span: spec.span,
                });
                None
            }
        }
    }

    /// Default parameterless constructor. A user-declared `create` with
    /// the same signature takes over this slot in element creation.
    fn declare_constructor(&mut self, owner: TypeId) -> Option<MethodId> {
        let sig = MethodSignature::new(owner, "create", Vec::new(), Some(owner));
        self.ctx.types.declare_method(sig).ok()
    }

    fn declare_static_init(&mut self, owner: TypeId) -> Option<MethodId> {
        let sig = MethodSignature::new(owner, "$sinit", Vec::new(), None);
        self.ctx.types.declare_method(sig).ok()
    }

    fn synthesize_adapter(
        &mut self,
        abstract_type: TypeId,
        abstract_name: &str,
        adaptee: TypeId,
        spec: TypeSpec<'_>,
    ) {
        if self.ctx.types.adapter_for(adaptee, abstract_type).is_some() {
            return;
        }
        let adapter_name = format!(
            "{}$as${}",
            self.ctx.types.type_name(adaptee),
            abstract_name.trim_start_matches('$')
        );
        let Ok(adapter_type) = self.ctx.types.declare_type(
            &adapter_name,
            TypeFlags::SYNTHETIC,
            vec![abstract_type],
        ) else {
            return;
        };

        let adapter_id = AdapterId::new(self.ctx.adapters.len());
        self.ctx
            .adapters
            .push(SupertypingAdapter::new(abstract_type, adaptee, adapter_type));
        self.ctx.types.register_adapter(adaptee, abstract_type, adapter_id);

        let mut info = ClassInfo::new(adapter_name, adapter_type, ClassKind::Reference, spec.span);
        info.supertypes = vec![abstract_type];
        self.ctx.classes.insert(adapter_type, info);
        self.ctx.class_order.push(adapter_type);

        if let Some(owner) = self.ctx.classes.get_mut(&abstract_type) {
            owner.adapters.push(adapter_id);
            owner.subtypes.push(adaptee);
        }
    }
}
