//! Lexical scope stack for routine bodies.
//!
//! Parameters occupy the outermost scope; each block pushes a new one.
//! User declarations must not shadow anything visible, so `declare`
//! searches the whole stack first. Compiler-synthesized rebindings
//! (typecase arms, handler locals) bypass that rule via
//! `declare_shadowing`.

use sable_core::TypeId;

/// One visible binding.
#[derive(Debug, Clone)]
pub struct LocalVar {
    pub name: String,
    pub slot: u32,
    pub ty: TypeId,
    pub is_param: bool,
}

#[derive(Debug, Default)]
struct Scope {
    vars: Vec<LocalVar>,
}

/// The scope stack for one routine body.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    next_slot: u32,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Declare a binding in the innermost scope. Fails when any visible
    /// binding already carries the name (case-sensitive; member names fold,
    /// locals do not).
    pub fn declare(&mut self, name: &str, ty: TypeId, is_param: bool) -> Result<u32, ()> {
        if self.lookup(name).is_some() {
            return Err(());
        }
        Ok(self.declare_shadowing(name, ty, is_param))
    }

    /// Declare without the shadowing check. Used for synthesized
    /// rebindings only.
    pub fn declare_shadowing(&mut self, name: &str, ty: TypeId, is_param: bool) -> u32 {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.scopes
            .last_mut()
            .expect("scope stack is never empty while a body is open")
            .vars
            .push(LocalVar {
                name: name.to_string(),
                slot,
                ty,
                is_param,
            });
        slot
    }

    /// Allocate an anonymous slot (iterator state, handler temporaries).
    pub fn alloc_slot(&mut self) -> u32 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    /// Innermost visible binding with the given name.
    pub fn lookup(&self, name: &str) -> Option<&LocalVar> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.vars.iter().rev().find(|v| v.name == name))
    }

    /// Slots allocated so far; the routine's frame size.
    pub fn slot_count(&self) -> u32 {
        self.next_slot
    }
}
