//! Class definition state, populated incrementally by the passes.

use crate::{AdapterId, MethodId, Span, TypeId};

/// Declared kind of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Concrete class with instance layout on the target object model.
    Reference,
    /// Abstract contract; no instance layout, subtyping structure only.
    Abstract,
}

/// Per-class compilation state.
///
/// Pass 1 fills identity, kind, resolved supertypes and slots; Pass 2 adds
/// members and adapter bindings. Read-only after that.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub id: TypeId,
    pub kind: ClassKind,
    /// Resolved declared abstract supertypes.
    pub supertypes: Vec<TypeId>,
    /// Resolved declared subtypes. Only meaningful on abstract classes;
    /// this is the multiple-supertyping retrofit mechanism.
    pub subtypes: Vec<TypeId>,
    /// Member methods in declaration order.
    pub methods: Vec<MethodId>,
    /// Adapters synthesized for this abstract class's declared subtypes.
    pub adapters: Vec<AdapterId>,
    /// Default constructor slot (reference classes only).
    pub constructor: Option<MethodId>,
    /// Static-initializer slot (reference classes only).
    pub static_init: Option<MethodId>,
    pub span: Span,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>, id: TypeId, kind: ClassKind, span: Span) -> Self {
        Self {
            name: name.into(),
            id,
            kind,
            supertypes: Vec::new(),
            subtypes: Vec::new(),
            methods: Vec::new(),
            adapters: Vec::new(),
            constructor: None,
            static_init: None,
            span,
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == ClassKind::Abstract
    }
}
