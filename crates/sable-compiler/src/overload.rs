//! Mode-driven overload resolution.
//!
//! A call resolves in two stages. First every candidate incompatible with
//! the argument list is dropped; compatibility is per-mode:
//!
//! - `in` argument: parameter must be `in` or `once` and the argument type
//!   a subtype of the parameter type.
//! - `out` argument: parameter must be `out` and its type a subtype of the
//!   argument's declared type (the binding flows outward).
//! - `inout` argument: parameter must be `inout` with the identical type.
//!
//! Then, among the compatible candidates, positions narrow left to right:
//! `in`/`once` positions keep the candidates with the most specific
//! parameter type, `out` positions the most general, `inout` positions
//! keep everything. Exactly one survivor wins; several is an ambiguity.

use sable_core::{MethodId, Mode, TypeId};
use sable_registry::TypeManager;

/// One call argument as the checker sees it.
#[derive(Debug, Clone, Copy)]
pub struct ArgInfo {
    pub mode: Mode,
    pub ty: TypeId,
}

/// Why resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// No candidate is compatible with the argument list.
    NoMatch,
    /// More than one candidate survives narrowing.
    Ambiguous,
}

struct Candidate {
    method: MethodId,
    via_container: bool,
}

impl Candidate {
    /// Parameter types visible to the caller, container self skipped.
    fn param(&self, types: &TypeManager, index: usize) -> (Mode, TypeId) {
        let sig = types.method(self.method).expect("candidate is registered");
        let offset = usize::from(self.via_container);
        let p = &sig.params[offset + index];
        (p.mode, p.ty)
    }
}

fn arg_compatible(types: &TypeManager, arg: ArgInfo, param_mode: Mode, param_ty: TypeId) -> bool {
    match arg.mode {
        Mode::In => {
            matches!(param_mode, Mode::In | Mode::Once) && types.subtype(arg.ty, param_ty)
        }
        Mode::Out => param_mode == Mode::Out && types.subtype(param_ty, arg.ty),
        Mode::InOut => param_mode == Mode::InOut && param_ty == arg.ty,
        // `once` only appears on iterator parameters; call sites pass
        // such arguments as `in`.
        Mode::Once => param_mode == Mode::Once && types.subtype(arg.ty, param_ty),
    }
}

/// Resolve a member call on `receiver`. Returns the winning method and
/// whether it lives on the receiver's builtin method container.
///
/// `expect_void`, when set, filters candidates by void-ness before
/// compatibility runs; statement-position calls must be void, expression
/// calls must not.
pub fn resolve_call(
    types: &TypeManager,
    receiver: TypeId,
    name: &str,
    args: &[ArgInfo],
    expect_void: Option<bool>,
) -> Result<(MethodId, bool), ResolveError> {
    let mut candidates: Vec<Candidate> = Vec::new();
    for (method, via_container) in types.callable_methods(receiver, name) {
        let Some(sig) = types.method(method) else {
            continue;
        };
        let visible_arity = sig.arity() - usize::from(via_container);
        if visible_arity != args.len() {
            continue;
        }
        if let Some(want_void) = expect_void
            && sig.is_void() != want_void
        {
            continue;
        }
        let candidate = Candidate {
            method,
            via_container,
        };
        let compatible = args.iter().enumerate().all(|(i, arg)| {
            let (mode, ty) = candidate.param(types, i);
            arg_compatible(types, *arg, mode, ty)
        });
        if compatible {
            candidates.push(candidate);
        }
    }

    if candidates.is_empty() {
        return Err(ResolveError::NoMatch);
    }

    // Left-to-right positional narrowing.
    for (i, arg) in args.iter().enumerate() {
        if candidates.len() == 1 {
            break;
        }
        if arg.mode == Mode::InOut {
            continue;
        }
        let most_general = arg.mode == Mode::Out;
        let mut best = candidates[0].param(types, i).1;
        for c in &candidates[1..] {
            let ty = c.param(types, i).1;
            let better = if most_general {
                types.subtype(best, ty)
            } else {
                types.subtype(ty, best)
            };
            if better {
                best = ty;
            }
        }
        candidates.retain(|c| c.param(types, i).1 == best);
    }

    match candidates.as_slice() {
        [only] => Ok((only.method, only.via_container)),
        _ => Err(ResolveError::Ambiguous),
    }
}
