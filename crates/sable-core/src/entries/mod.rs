//! Descriptor entries populated by the passes.

mod adapter;
mod class;
mod iter;

pub use adapter::{AdapterId, BridgeBinding, SupertypingAdapter};
pub use class::{ClassInfo, ClassKind};
pub use iter::{IterDefinition, ResumePoint};

use bitflags::bitflags;

bitflags! {
    /// Properties of a registered type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TypeFlags: u8 {
        /// No instance layout; only subtyping structure.
        const ABSTRACT = 1 << 0;
        /// Value semantics on the target platform.
        const VALUE = 1 << 1;
        /// A by-reference wrapper type.
        const BYREF = 1 << 2;
        /// Supplied by the builtin environment, not user code.
        const BUILTIN = 1 << 3;
        /// Synthesized by the compiler (adapters, iterator state holders).
        const SYNTHETIC = 1 << 4;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_compose() {
        let f = TypeFlags::VALUE | TypeFlags::BUILTIN;
        assert!(f.contains(TypeFlags::VALUE));
        assert!(!f.contains(TypeFlags::ABSTRACT));
    }
}
