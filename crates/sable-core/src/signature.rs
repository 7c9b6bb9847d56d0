//! Method signature model.
//!
//! Signatures uniformly wrap host-provided (builtin container) and
//! user-declared members. Names are case-insensitive and stored folded.
//! Two predicates matter downstream:
//!
//! - *conformance* — exact match of name, arity, modes, parameter types
//!   and return type; discharges an inherited abstract obligation.
//! - *conflict* — same name, arity and void-ness where every parameter
//!   position is "related": identical types, or both abstract and
//!   subtype-related in either direction. Abstract-relatedness is the
//!   registry's business, so the predicate takes it as a closure.

use crate::{MethodId, Mode, TypeId};

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub mode: Mode,
    /// For `Out`/`InOut` this is the element type the reference wraps.
    pub ty: TypeId,
}

impl Param {
    pub fn new(name: impl Into<String>, mode: Mode, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            mode,
            ty,
        }
    }
}

/// A method signature: declaring type, folded name, ordered parameters,
/// and optional return type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub owner: TypeId,
    /// Case-folded (lowercase) name. Iterator names keep their trailing `!`.
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeId>,
}

impl MethodSignature {
    pub fn new(
        owner: TypeId,
        name: &str,
        params: Vec<Param>,
        return_type: Option<TypeId>,
    ) -> Self {
        Self {
            owner,
            name: fold_name(name),
            params,
            return_type,
        }
    }

    /// The stable identity of this signature.
    pub fn id(&self) -> MethodId {
        let param_types: Vec<TypeId> = self.params.iter().map(|p| p.ty).collect();
        MethodId::from_signature(self.owner, &self.name, &param_types)
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_void(&self) -> bool {
        self.return_type.is_none()
    }

    /// Iterator members are named with a trailing `!`.
    pub fn is_iter(&self) -> bool {
        self.name.ends_with('!')
    }

    /// Exact signature match against an obligation, ignoring the owner.
    pub fn conforms_to(&self, obligation: &MethodSignature) -> bool {
        params_conform(
            &self.params,
            self.return_type,
            &self.name,
            obligation,
        )
    }

    /// Conflict against a sibling declared on the same type.
    ///
    /// `related_abstract(a, b)` must answer whether `a` and `b` are both
    /// abstract and subtype-related.
    pub fn conflicts_with<F>(&self, other: &MethodSignature, mut related_abstract: F) -> bool
    where
        F: FnMut(TypeId, TypeId) -> bool,
    {
        if self.name != other.name
            || self.arity() != other.arity()
            || self.is_void() != other.is_void()
        {
            return false;
        }
        self.params
            .iter()
            .zip(&other.params)
            .all(|(a, b)| a.ty == b.ty || related_abstract(a.ty, b.ty))
    }
}

/// Case folding used for all member names.
pub fn fold_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Conformance over an explicit parameter slice. Container methods are
/// matched with their leading self-parameter already skipped, so the
/// comparison works on whatever slice the caller supplies.
pub fn params_conform(
    params: &[Param],
    return_type: Option<TypeId>,
    folded_name: &str,
    obligation: &MethodSignature,
) -> bool {
    folded_name == obligation.name
        && return_type == obligation.return_type
        && params.len() == obligation.params.len()
        && params
            .iter()
            .zip(&obligation.params)
            .all(|(a, b)| a.mode == b.mode && a.ty == b.ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> TypeId {
        TypeId::from_name(name)
    }

    fn sig(owner: &str, name: &str, params: &[(&str, Mode)], ret: Option<&str>) -> MethodSignature {
        let params = params
            .iter()
            .enumerate()
            .map(|(i, (t, m))| Param::new(format!("p{i}"), *m, ty(t)))
            .collect();
        MethodSignature::new(ty(owner), name, params, ret.map(ty))
    }

    #[test]
    fn names_are_case_folded() {
        let a = sig("C", "Foo", &[], Some("INT"));
        let b = sig("C", "foo", &[], Some("INT"));
        assert_eq!(a.name, b.name);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn conformance_requires_exact_modes() {
        let obligation = sig("$A", "m", &[("INT", Mode::In)], None);
        let exact = sig("C", "m", &[("INT", Mode::In)], None);
        let wrong_mode = sig("C", "m", &[("INT", Mode::Out)], None);
        assert!(exact.conforms_to(&obligation));
        assert!(!wrong_mode.conforms_to(&obligation));
    }

    #[test]
    fn conformance_requires_matching_return() {
        let obligation = sig("$A", "m", &[], Some("INT"));
        let void = sig("C", "m", &[], None);
        assert!(!void.conforms_to(&obligation));
    }

    #[test]
    fn unrelated_concrete_params_never_conflict() {
        let a = sig("C", "m", &[("INT", Mode::In)], Some("INT"));
        let b = sig("C", "m", &[("STR", Mode::In)], Some("INT"));
        assert!(!a.conflicts_with(&b, |_, _| false));
    }

    #[test]
    fn related_abstract_params_conflict() {
        let a = sig("C", "m", &[("$A", Mode::In)], Some("INT"));
        let b = sig("C", "m", &[("$C", Mode::In)], Some("INT"));
        // Registry says $A and $C are abstract and subtype-related.
        assert!(a.conflicts_with(&b, |_, _| true));
    }

    #[test]
    fn identical_signatures_conflict() {
        let a = sig("C", "m", &[("INT", Mode::In)], Some("INT"));
        let b = sig("C", "m", &[("INT", Mode::In)], Some("INT"));
        assert!(a.conflicts_with(&b, |_, _| false));
    }

    #[test]
    fn voidness_difference_never_conflicts() {
        let a = sig("C", "m", &[("INT", Mode::In)], Some("INT"));
        let b = sig("C", "m", &[("INT", Mode::In)], None);
        assert!(!a.conflicts_with(&b, |_, _| true));
    }

    #[test]
    fn iter_names_detected() {
        let it = sig("C", "elts!", &[], Some("INT"));
        assert!(it.is_iter());
        assert!(!sig("C", "elts", &[], Some("INT")).is_iter());
    }
}
