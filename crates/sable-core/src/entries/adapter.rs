//! Supertyping adapters.
//!
//! An adapter is a synthesized concrete type that lets an existing type
//! satisfy an abstract class it was not declared under. It implements the
//! abstract class, holds one field with the adaptee instance, and forwards
//! every reachable abstract method to a conforming adaptee method.

use crate::{MethodId, TypeId};

/// Index of an adapter in the compilation context's adapter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdapterId(u32);

impl AdapterId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One bridge binding: an inherited obligation, the bridge method that
/// discharges it on the adapter, and the adaptee method the bridge
/// forwards to.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeBinding {
    pub obligation: MethodId,
    pub bridge: MethodId,
    pub target: MethodId,
    /// The target lives on the adaptee's builtin method container.
    pub via_container: bool,
}

/// Adapter created once per (abstract class, declared subtype) pair.
///
/// Invariant: by the end of element creation every abstract method
/// reachable from `abstract_type` is bound to exactly one bridge, or the
/// gap was reported as a fatal diagnostic.
#[derive(Debug, Clone)]
pub struct SupertypingAdapter {
    pub abstract_type: TypeId,
    pub adaptee: TypeId,
    /// The synthesized adapter type itself.
    pub adapter_type: TypeId,
    /// Name of the field holding the adaptee instance.
    pub field_name: String,
    /// Single-argument constructor, declared in element creation.
    pub constructor: Option<MethodId>,
    pub bridges: Vec<BridgeBinding>,
}

impl SupertypingAdapter {
    pub fn new(abstract_type: TypeId, adaptee: TypeId, adapter_type: TypeId) -> Self {
        Self {
            abstract_type,
            adaptee,
            adapter_type,
            field_name: "adaptee".to_string(),
            constructor: None,
            bridges: Vec::new(),
        }
    }
}
