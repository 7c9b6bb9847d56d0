//! Label-addressed code emission.

use rustc_hash::FxHashMap;

use crate::code::op::{Instr, Op, Operand};

/// A forward-referencable position in a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

/// One routine's finished instruction stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeChunk {
    pub instrs: Vec<Instr>,
    /// Instruction offset each bound label resolves to.
    pub label_offsets: FxHashMap<Label, usize>,
}

impl CodeChunk {
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn offset_of(&self, label: Label) -> Option<usize> {
        self.label_offsets.get(&label).copied()
    }
}

struct LoopFrame {
    top: Label,
    end: Label,
}

/// Builds one chunk. Tracks the enclosing-loop stack so `break` and
/// iterator exhaustion know where to jump.
pub struct CodeBuilder {
    chunk: CodeChunk,
    next_label: u32,
    loops: Vec<LoopFrame>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self {
            chunk: CodeChunk::default(),
            next_label: 0,
            loops: Vec::new(),
        }
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Bind `label` to the next emitted instruction.
    pub fn bind(&mut self, label: Label) {
        self.chunk.label_offsets.insert(label, self.chunk.instrs.len());
    }

    pub fn emit(&mut self, op: Op) {
        self.chunk.instrs.push(Instr::new(op));
    }

    pub fn emit_with(&mut self, op: Op, operands: Vec<Operand>) {
        self.chunk.instrs.push(Instr::with(op, operands));
    }

    pub fn enter_loop(&mut self, top: Label, end: Label) {
        self.loops.push(LoopFrame { top, end });
    }

    pub fn exit_loop(&mut self) {
        self.loops.pop();
    }

    /// `(top, end)` of the innermost loop, if any.
    pub fn current_loop(&self) -> Option<(Label, Label)> {
        self.loops.last().map(|f| (f.top, f.end))
    }

    pub fn in_loop(&self) -> bool {
        !self.loops.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.chunk.instrs.len()
    }

    pub fn finish(self) -> CodeChunk {
        self.chunk
    }
}

impl Default for CodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
