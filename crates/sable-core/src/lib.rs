//! Core data model for the sable semantic analyzer.
//!
//! Shared vocabulary used by the registry and the compiler passes:
//!
//! - [`Span`]: source locations for diagnostics
//! - [`Diagnostics`]: the accumulating Error/Warning sink
//! - [`TypeId`] / [`MethodId`]: stable hashed identities
//! - [`Mode`]: in/out/inout/once argument-passing modes
//! - [`MethodSignature`]: the uniform member signature model with the
//!   conflict and conformance predicates
//! - descriptor entries: [`ClassInfo`], [`SupertypingAdapter`],
//!   [`IterDefinition`]

pub mod diagnostics;
pub mod entries;
pub mod error;
pub mod ident;
pub mod mode;
pub mod signature;
pub mod span;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use entries::{
    AdapterId, BridgeBinding, ClassInfo, ClassKind, IterDefinition, ResumePoint,
    SupertypingAdapter, TypeFlags,
};
pub use error::{LookupError, RegistryError, SemanticError};
pub use ident::{MethodId, TypeId};
pub use mode::Mode;
pub use signature::{MethodSignature, Param, fold_name, params_conform};
pub use span::Span;
