//! Shared state threaded through the passes.
//!
//! [`CompilationContext`] owns the registry, the accumulated diagnostics
//! and every side table the passes fill. Analysis results are never
//! written onto AST nodes; they live here, keyed by [`NodeId`], so the
//! tree stays immutable across passes.

use rustc_hash::FxHashMap;
use sable_ast::NodeId;
use sable_core::{
    ClassInfo, Diagnostics, IterDefinition, MethodId, SemanticError, Span, SupertypingAdapter,
    TypeId,
};
use sable_registry::{BuiltinEnvironment, TypeManager};

/// Compilation-wide options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Require and wire the `MAIN::main` entry point.
    pub executable: bool,
}

/// A resolved call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallBinding {
    pub method: MethodId,
    /// The method lives on the receiver's builtin method container and
    /// takes the receiver as an explicit leading argument.
    pub via_container: bool,
    /// Dispatch dynamically: the static receiver type is abstract.
    pub virtual_dispatch: bool,
    pub receiver_type: TypeId,
    /// No explicit receiver was written; `self` is pushed implicitly.
    pub implicit_self: bool,
}

/// What an unqualified name resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NameResolution {
    /// A parameter or local.
    Local { slot: u32, ty: TypeId },
    /// A zero-argument implicit self-call.
    ImplicitCall(CallBinding),
}

/// Lowering data for one iterator call site.
#[derive(Debug, Clone)]
pub struct IterCallInfo {
    pub iter: MethodId,
    pub via_container: bool,
    /// Slot holding the iterator state across loop trips.
    pub state_slot: u32,
    /// Argument indices captured once at state construction.
    pub once_args: Vec<usize>,
    /// Element type, absent for void iterators.
    pub element: Option<TypeId>,
}

/// Well-known builtin types the passes refer to directly.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    pub top: TypeId,
    pub int: TypeId,
    pub bool_: TypeId,
    pub char_: TypeId,
    pub flt: TypeId,
    pub str_: TypeId,
}

/// All state shared by the four passes.
pub struct CompilationContext {
    pub types: TypeManager,
    pub diags: Diagnostics,
    pub options: CompileOptions,
    pub well_known: WellKnown,

    /// Per-class state, filled by type creation and element creation.
    pub classes: FxHashMap<TypeId, ClassInfo>,
    /// Classes in creation order; drives deterministic later passes.
    pub class_order: Vec<TypeId>,
    /// Supertyping adapters, indexed by `AdapterId`.
    pub adapters: Vec<SupertypingAdapter>,
    /// Iterator definitions, indexed through `iter_by_method`.
    pub iters: Vec<IterDefinition>,
    pub iter_by_method: FxHashMap<MethodId, usize>,

    /// Declared method per member declaration node, filled by element
    /// creation.
    pub member_methods: FxHashMap<NodeId, MethodId>,

    // Side tables keyed by AST node id, filled by the checker.
    pub call_bindings: FxHashMap<NodeId, CallBinding>,
    pub name_bindings: FxHashMap<NodeId, NameResolution>,
    pub local_slots: FxHashMap<NodeId, u32>,
    pub iter_calls: FxHashMap<NodeId, IterCallInfo>,
    /// Typecase arm: the synthesized rebinding slot and its arm type.
    pub typecase_slots: FxHashMap<NodeId, (u32, TypeId)>,
    /// Case statement: slot holding the evaluated subject across arms.
    pub case_subject_slots: FxHashMap<NodeId, u32>,
    /// Case statement: the resolved `is_eq` binding, `None` for the
    /// builtin equality fallback.
    pub case_eq: FxHashMap<NodeId, Option<CallBinding>>,
    /// Handler arm: slot the caught exception is bound into.
    pub handler_slots: FxHashMap<NodeId, u32>,
    /// Yield statement: its resume-point index.
    pub yield_indices: FxHashMap<NodeId, u32>,
    /// Frame size per checked method.
    pub frames: FxHashMap<MethodId, u32>,

    fresh: u32,
}

impl CompilationContext {
    pub fn new(env: &BuiltinEnvironment, options: CompileOptions) -> Result<Self, sable_core::RegistryError> {
        let types = TypeManager::from_environment(env)?;
        let resolve = |name: &str| {
            types
                .resolve_name(name)
                .ok_or_else(|| sable_core::RegistryError::UnknownType {
                    name: name.to_string(),
                })
        };
        let well_known = WellKnown {
            top: types.top(),
            int: resolve("INT")?,
            bool_: resolve("BOOL")?,
            char_: resolve("CHAR")?,
            flt: resolve("FLT")?,
            str_: resolve("STR")?,
        };
        Ok(Self {
            types,
            diags: Diagnostics::new(),
            options,
            well_known,
            classes: FxHashMap::default(),
            class_order: Vec::new(),
            adapters: Vec::new(),
            iters: Vec::new(),
            iter_by_method: FxHashMap::default(),
            member_methods: FxHashMap::default(),
            call_bindings: FxHashMap::default(),
            name_bindings: FxHashMap::default(),
            local_slots: FxHashMap::default(),
            iter_calls: FxHashMap::default(),
            typecase_slots: FxHashMap::default(),
            case_subject_slots: FxHashMap::default(),
            case_eq: FxHashMap::default(),
            handler_slots: FxHashMap::default(),
            yield_indices: FxHashMap::default(),
            frames: FxHashMap::default(),
            fresh: 0,
        })
    }

    /// Report a semantic error at its own span.
    pub fn add_error(&mut self, error: SemanticError) {
        let span = error.span();
        self.diags.error(span, error.to_string());
    }

    pub fn add_warning(&mut self, span: Span, message: impl Into<String>) {
        self.diags.warning(span, message);
    }

    /// A compilation-unique synthesized name.
    pub fn fresh_name(&mut self, prefix: &str) -> String {
        let n = self.fresh;
        self.fresh += 1;
        format!("{prefix}${n}")
    }

    pub fn class(&self, id: TypeId) -> Option<&ClassInfo> {
        self.classes.get(&id)
    }

    pub fn iter_definition(&self, method: MethodId) -> Option<&IterDefinition> {
        self.iter_by_method.get(&method).map(|&i| &self.iters[i])
    }
}
