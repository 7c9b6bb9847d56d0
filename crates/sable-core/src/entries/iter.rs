//! Iterator lowering state.
//!
//! A suspendable iterator body is lowered into an explicit resumable state
//! machine: a synthesized state-holder type with fields for the enclosing
//! instance, the resume position, the current value and every local that
//! survives a suspension, plus a move-next method dispatching on the
//! resume position.

use crate::{MethodId, Span, TypeId};

/// One numbered suspension site. Index 0 is reserved for entry; yields are
/// numbered in encounter order during type checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    pub index: u32,
    pub span: Span,
}

/// Synthesized state for one iterator member, finalized by code generation.
#[derive(Debug, Clone)]
pub struct IterDefinition {
    /// Class declaring the iterator.
    pub owner: TypeId,
    /// The declared iterator signature on the owner.
    pub iter_method: MethodId,
    /// The nested state-holder type.
    pub holder_type: TypeId,
    /// Field holding the enclosing instance.
    pub self_field: String,
    /// Field holding the resume position.
    pub position_field: String,
    /// Field holding the current value; absent for void iterators.
    pub current_field: Option<String>,
    /// Element type produced per resumption; absent for void iterators.
    pub element_type: Option<TypeId>,
    /// Fields capturing Once-mode arguments, in parameter order.
    pub once_fields: Vec<(String, TypeId)>,
    /// Indices of Once-mode parameters in the declared signature.
    pub once_params: Vec<usize>,
    /// Fields for locals that survive across suspensions.
    pub local_fields: Vec<(String, TypeId)>,
    /// Primary construction method: takes the enclosing instance plus the
    /// Once arguments, returns the holder.
    pub create: Option<MethodId>,
    /// Per distinct discharged ancestor return type, a bridge create that
    /// tail-delegates to the primary construction method.
    pub bridge_creates: Vec<(TypeId, MethodId)>,
    pub move_next: Option<MethodId>,
    pub read_current: Option<MethodId>,
    /// Ordered resume points; `[0]` is the entry point.
    pub resume_points: Vec<ResumePoint>,
}

impl IterDefinition {
    pub fn new(owner: TypeId, iter_method: MethodId, holder_type: TypeId, span: Span) -> Self {
        Self {
            owner,
            iter_method,
            holder_type,
            self_field: "self".to_string(),
            position_field: "resume".to_string(),
            current_field: None,
            element_type: None,
            once_fields: Vec::new(),
            once_params: Vec::new(),
            local_fields: Vec::new(),
            create: None,
            bridge_creates: Vec::new(),
            move_next: None,
            read_current: None,
            resume_points: vec![ResumePoint { index: 0, span }],
        }
    }

    /// Number of suspension sites, entry included.
    pub fn resume_count(&self) -> usize {
        self.resume_points.len()
    }
}
