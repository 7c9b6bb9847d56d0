//! Sable: a semantic compiler core for a class-based language with
//! multiple supertyping, parameter modes and suspendable iterators.
//!
//! The work lives in the member crates; this facade stitches them
//! together. [`sable_ast`] defines the tree an external parser must
//! produce, [`sable_registry`] owns types, signatures and subtyping,
//! and [`sable_compiler`] runs the four passes and emits code.
//!
//! ```
//! use bumpalo::Bump;
//! use sable::prelude::*;
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let unit = b.unit(vec![b.class(
//!     "POINT",
//!     ClassKindSpec::Reference,
//!     vec![],
//!     vec![],
//!     vec![b.routine("zero", vec![], Some("INT"), Some(b.block(vec![
//!         b.ret(Some(b.int(0))),
//!     ])))],
//! )]);
//! let result = Compiler::default()
//!     .compile(&unit, &BuiltinEnvironment::minimal())
//!     .unwrap();
//! assert!(result.is_success());
//! ```

pub use sable_ast as ast;
pub use sable_compiler as compiler;
pub use sable_core as core;
pub use sable_registry as registry;

pub mod prelude {
    pub use sable_ast::{AstBuilder, ClassKindSpec, SourceUnit};
    pub use sable_compiler::{
        CompilationResult, CompileOptions, CompiledProgram, Compiler, EntryPoint, Op,
    };
    pub use sable_core::{
        Diagnostic, Diagnostics, Mode, Severity, Span, TypeFlags, TypeId,
    };
    pub use sable_registry::{BuiltinEnvironment, BuiltinMethod, BuiltinType, TypeManager};
}
