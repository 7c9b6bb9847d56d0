//! Instruction set of the emitted intermediate code.
//!
//! A flat, label-addressed instruction stream; the target backend lowers it
//! to its own object model. Opcodes carry their operands out-of-line in
//! [`Instr`] so the enum itself stays a plain byte.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use ordered_float::OrderedFloat;
use sable_core::{MethodId, TypeId};

use crate::code::builder::Label;

/// One opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Op {
    Nop,
    /// Push a constant operand.
    LoadConst,
    LoadLocal,
    StoreLocal,
    /// Push a reference to a local, for `out`/`inout` arguments.
    RefLocal,
    LoadSelf,
    LoadField,
    StoreField,
    /// Reset a local to the void value of its type.
    VoidLocal,
    /// Push the void value.
    PushVoid,
    Pop,
    /// Allocate an instance of the operand type.
    New,
    /// Statically bound call.
    Call,
    /// Dynamically dispatched call through an abstract receiver.
    CallVirtual,
    /// Constructor call; leaves the new instance on the stack.
    CallCtor,
    /// Box a value into its reference representation.
    Box_,
    /// Unbox back to the value representation.
    Unbox,
    /// Push whether the top of stack is an instance of the operand type.
    IsInstance,
    Branch,
    BranchFalse,
    BranchTrue,
    /// Indexed jump over the operand label table.
    Switch,
    Return,
    /// Jump to the shared epilogue label of the routine.
    Leave,
    TryEnter,
    /// Handler arm: catches the operand type into the operand local.
    Catch,
    TryExit,
    Raise,
    /// Construct iterator state into the operand local.
    IterInit,
    /// Resume the iterator; leaves a step tag on the stack.
    IterNext,
    /// Push the iterator's current element.
    IterCurrent,
    /// Push a step tag from inside an iterator body.
    PushStep,
    /// Builtin identity/value equality, the `case` fallback when the
    /// subject type carries no `is_eq`.
    Eq,
}

/// What one resumption of an iterator produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IterStep {
    /// A value was yielded; the loop body runs.
    Value = 0,
    /// The iterator asked to break the enclosing loop.
    Break = 1,
    /// The body ran to completion; the loop exits.
    Exhausted = 2,
}

/// A field reference operand.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub owner: TypeId,
    pub name: String,
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Flt(OrderedFloat<f64>),
    Bool(bool),
    Char(char),
    Str(String),
    Type(TypeId),
    Method(MethodId),
    Local(u32),
    Field(FieldRef),
    Label(Label),
    Labels(Vec<Label>),
    Step(IterStep),
}

/// One emitted instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    pub op: Op,
    pub operands: Vec<Operand>,
}

impl Instr {
    pub fn new(op: Op) -> Self {
        Self {
            op,
            operands: Vec::new(),
        }
    }

    pub fn with(op: Op, operands: Vec<Operand>) -> Self {
        Self { op, operands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_round_trip_through_bytes() {
        let byte: u8 = Op::IterNext.into();
        assert_eq!(Op::try_from(byte), Ok(Op::IterNext));
        assert!(Op::try_from(250u8).is_err());
    }

    #[test]
    fn step_tags_are_stable() {
        assert_eq!(IterStep::Value as u8, 0);
        assert_eq!(IterStep::Break as u8, 1);
        assert_eq!(IterStep::Exhausted as u8, 2);
    }
}
