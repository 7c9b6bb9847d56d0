//! The type and method registry.
//!
//! [`TypeManager`] owns every registered type descriptor and method
//! signature, and answers the structural questions the passes ask:
//! name resolution, the subtype relation, memoized ancestor linearization,
//! member lookup with builtin-container fallback, and the adapter edges
//! that extend subtyping beyond declared parents.

use rustc_hash::{FxHashMap, FxHashSet};
use sable_core::{
    AdapterId, MethodId, MethodSignature, RegistryError, TypeFlags, TypeId, fold_name,
};

/// One registered type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: String,
    pub flags: TypeFlags,
    /// Declared direct abstract supertypes.
    pub parents: Vec<TypeId>,
    /// Methods declared on this type, in declaration order.
    pub methods: Vec<MethodId>,
}

/// Registry of types, methods and subtype structure.
#[derive(Debug)]
pub struct TypeManager {
    types: FxHashMap<TypeId, TypeDescriptor>,
    names: FxHashMap<String, TypeId>,
    methods: FxHashMap<MethodId, MethodSignature>,
    methods_by_name: FxHashMap<(TypeId, String), Vec<MethodId>>,
    /// Memoized ancestor lists: direct parents first, then their ancestors,
    /// deduplicated in first-visit order.
    ancestors: FxHashMap<TypeId, Vec<TypeId>>,
    /// Types whose supertype chain is currently being resolved.
    resolving: FxHashSet<TypeId>,
    /// Adapter edges keyed by `(adaptee, abstract class)`.
    adapters: FxHashMap<(TypeId, TypeId), AdapterId>,
    /// Builtin method-container assignments.
    containers: FxHashMap<TypeId, TypeId>,
    top: TypeId,
}

impl TypeManager {
    /// Build a registry from a builtin environment description. All types
    /// are registered before parents, methods and containers are wired, so
    /// the description may reference types in any order.
    pub fn from_environment(env: &crate::BuiltinEnvironment) -> Result<Self, RegistryError> {
        let mut manager = Self {
            types: FxHashMap::default(),
            names: FxHashMap::default(),
            methods: FxHashMap::default(),
            methods_by_name: FxHashMap::default(),
            ancestors: FxHashMap::default(),
            resolving: FxHashSet::default(),
            adapters: FxHashMap::default(),
            containers: FxHashMap::default(),
            top: TypeId::from_name(&env.top),
        };

        for ty in &env.types {
            manager.declare_type(&ty.name, ty.flags, Vec::new())?;
        }
        if !manager.types.contains_key(&manager.top) {
            return Err(RegistryError::UnknownType {
                name: env.top.clone(),
            });
        }

        for ty in &env.types {
            let id = TypeId::from_name(&ty.name);
            for parent in &ty.parents {
                let parent_id = manager.resolve_required(parent)?;
                manager.add_parent(id, parent_id);
            }
            if let Some(container) = &ty.container {
                let container_id = manager.resolve_required(container)?;
                manager.containers.insert(id, container_id);
            }
        }

        for ty in &env.types {
            let owner = TypeId::from_name(&ty.name);
            for method in &ty.methods {
                let params = method
                    .params
                    .iter()
                    .enumerate()
                    .map(|(i, (mode, t))| {
                        Ok(sable_core::Param::new(
                            format!("p{i}"),
                            *mode,
                            manager.resolve_required(t)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, RegistryError>>()?;
                let return_type = method
                    .return_type
                    .as_deref()
                    .map(|t| manager.resolve_required(t))
                    .transpose()?;
                let sig = MethodSignature::new(owner, &method.name, params, return_type);
                manager.declare_method(sig)?;
            }
        }

        Ok(manager)
    }

    fn resolve_required(&self, name: &str) -> Result<TypeId, RegistryError> {
        self.resolve_name(name).ok_or_else(|| RegistryError::UnknownType {
            name: name.to_string(),
        })
    }

    /// The distinguished top type.
    pub fn top(&self) -> TypeId {
        self.top
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    pub fn declare_type(
        &mut self,
        name: &str,
        flags: TypeFlags,
        parents: Vec<TypeId>,
    ) -> Result<TypeId, RegistryError> {
        if self.names.contains_key(name) {
            return Err(RegistryError::DuplicateType {
                name: name.to_string(),
            });
        }
        let id = TypeId::from_name(name);
        self.names.insert(name.to_string(), id);
        self.types.insert(
            id,
            TypeDescriptor {
                id,
                name: name.to_string(),
                flags,
                parents,
                methods: Vec::new(),
            },
        );
        Ok(id)
    }

    pub fn add_parent(&mut self, ty: TypeId, parent: TypeId) {
        if let Some(desc) = self.types.get_mut(&ty)
            && !desc.parents.contains(&parent)
        {
            desc.parents.push(parent);
            self.ancestors.clear();
        }
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(&id)
    }

    pub fn resolve_name(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    pub fn type_name(&self, id: TypeId) -> &str {
        self.types.get(&id).map_or("<unknown>", |t| t.name.as_str())
    }

    pub fn is_abstract(&self, id: TypeId) -> bool {
        self.types
            .get(&id)
            .is_some_and(|t| t.flags.contains(TypeFlags::ABSTRACT))
    }

    pub fn is_value(&self, id: TypeId) -> bool {
        self.types
            .get(&id)
            .is_some_and(|t| t.flags.contains(TypeFlags::VALUE))
    }

    // ==========================================================================
    // Supertype resolution state
    // ==========================================================================

    /// Mark `ty` as having its supertype chain under resolution. Returns
    /// `false` when already marked, which signals a cycle.
    pub fn begin_resolving(&mut self, ty: TypeId) -> bool {
        self.resolving.insert(ty)
    }

    pub fn finish_resolving(&mut self, ty: TypeId) {
        self.resolving.remove(&ty);
    }

    pub fn is_resolving(&self, ty: TypeId) -> bool {
        self.resolving.contains(&ty)
    }

    // ==========================================================================
    // Ancestors and subtyping
    // ==========================================================================

    /// Full ancestor list of `ty`: direct parents first, then their
    /// ancestors, deduplicated in first-visit order. Memoized.
    pub fn ancestors(&mut self, ty: TypeId) -> &[TypeId] {
        if !self.ancestors.contains_key(&ty) {
            let computed = self.compute_ancestors(ty);
            self.ancestors.insert(ty, computed);
        }
        &self.ancestors[&ty]
    }

    fn compute_ancestors(&self, ty: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(ty);
        self.collect_ancestors(ty, &mut seen, &mut out);
        out
    }

    fn collect_ancestors(&self, ty: TypeId, seen: &mut FxHashSet<TypeId>, out: &mut Vec<TypeId>) {
        let Some(desc) = self.types.get(&ty) else {
            return;
        };
        for &parent in &desc.parents {
            if seen.insert(parent) {
                out.push(parent);
            }
        }
        for &parent in &desc.parents {
            self.collect_ancestors(parent, seen, out);
        }
    }

    /// `a` is a subtype of `b`: identical, `b` is top, `b` is an ancestor
    /// of `a`, or an adapter edge from `a` to `b` exists.
    pub fn subtype(&self, a: TypeId, b: TypeId) -> bool {
        if a == b || b == self.top {
            return true;
        }
        let among_ancestors = match self.ancestors.get(&a) {
            Some(memo) => memo.contains(&b),
            None => self.compute_ancestors(a).contains(&b),
        };
        among_ancestors || self.adapters.contains_key(&(a, b))
    }

    /// Both abstract and subtype-related in either direction; this is the
    /// parameter relation under which overloads conflict.
    pub fn related_abstract(&self, a: TypeId, b: TypeId) -> bool {
        self.is_abstract(a) && self.is_abstract(b) && (self.subtype(a, b) || self.subtype(b, a))
    }

    pub fn signatures_conflict(&self, a: &MethodSignature, b: &MethodSignature) -> bool {
        a.conflicts_with(b, |x, y| self.related_abstract(x, y))
    }

    // ==========================================================================
    // Adapters
    // ==========================================================================

    pub fn register_adapter(&mut self, adaptee: TypeId, abstract_type: TypeId, id: AdapterId) {
        self.adapters.insert((adaptee, abstract_type), id);
    }

    pub fn adapter_for(&self, adaptee: TypeId, abstract_type: TypeId) -> Option<AdapterId> {
        self.adapters.get(&(adaptee, abstract_type)).copied()
    }

    // ==========================================================================
    // Methods
    // ==========================================================================

    pub fn declare_method(&mut self, sig: MethodSignature) -> Result<MethodId, RegistryError> {
        let id = sig.id();
        if self.methods.contains_key(&id) {
            return Err(RegistryError::DuplicateMethod {
                name: sig.name.clone(),
                owner: self.type_name(sig.owner).to_string(),
            });
        }
        let Some(desc) = self.types.get_mut(&sig.owner) else {
            return Err(RegistryError::UnknownType {
                name: format!("{:?}", sig.owner),
            });
        };
        desc.methods.push(id);
        self.methods_by_name
            .entry((sig.owner, sig.name.clone()))
            .or_default()
            .push(id);
        self.methods.insert(id, sig);
        Ok(id)
    }

    pub fn method(&self, id: MethodId) -> Option<&MethodSignature> {
        self.methods.get(&id)
    }

    /// Methods declared directly on `ty` under a case-folded name.
    pub fn methods_named(&self, ty: TypeId, folded_name: &str) -> &[MethodId] {
        self.methods_by_name
            .get(&(ty, folded_name.to_string()))
            .map_or(&[], Vec::as_slice)
    }

    pub fn set_container(&mut self, ty: TypeId, container: TypeId) {
        self.containers.insert(ty, container);
    }

    pub fn container(&self, ty: TypeId) -> Option<TypeId> {
        self.containers.get(&ty).copied()
    }

    /// Candidates for a member call on `ty`, case-folding the name. Looks
    /// at the type itself, then its ancestors; only when no direct
    /// candidate exists does lookup fall back to the builtin method
    /// container, whose methods carry an explicit leading self-parameter
    /// (the `bool` marks those).
    pub fn callable_methods(&self, ty: TypeId, name: &str) -> Vec<(MethodId, bool)> {
        let folded = fold_name(name);
        let mut out: Vec<(MethodId, bool)> = Vec::new();
        for id in self.methods_named(ty, &folded) {
            out.push((*id, false));
        }
        for ancestor in self.compute_ancestors(ty) {
            for id in self.methods_named(ancestor, &folded) {
                if !out.iter().any(|(m, _)| m == id) {
                    out.push((*id, false));
                }
            }
        }
        if out.is_empty()
            && let Some(container) = self.container(ty)
        {
            for id in self.methods_named(container, &folded) {
                let takes_self = self
                    .method(*id)
                    .is_some_and(|sig| sig.params.first().is_some_and(|p| self.subtype(ty, p.ty)));
                if takes_self {
                    out.push((*id, true));
                }
            }
        }
        out
    }
}
