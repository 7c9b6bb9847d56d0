//! Emitted intermediate code: opcodes, operands, chunks and the builder.

pub mod builder;
pub mod op;

pub use builder::{CodeBuilder, CodeChunk, Label};
pub use op::{FieldRef, Instr, IterStep, Op, Operand};
