//! Type and method registry for the sable semantic analyzer.
//!
//! [`BuiltinEnvironment`] is the host's declarative description of its
//! builtin types and method containers; [`TypeManager`] turns it into the
//! live registry the passes query and extend.

pub mod builtins;
pub mod registry;

pub use builtins::{BuiltinEnvironment, BuiltinMethod, BuiltinType};
pub use registry::{TypeDescriptor, TypeManager};
