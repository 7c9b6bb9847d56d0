//! The four sequential passes.
//!
//! Each pass runs over the whole source unit before the next begins:
//! type creation, element creation, checking, code generation. A pass
//! assumes everything earlier passes promised; the driver stops the
//! pipeline at the first pass that leaves errors behind.

pub mod check;
pub mod codegen;
pub mod element_creation;
pub mod type_creation;

pub use check::Check;
pub use codegen::{Codegen, CompiledProgram, CompiledRoutine, EntryPoint};
pub use element_creation::ElementCreation;
pub use type_creation::TypeCreation;
