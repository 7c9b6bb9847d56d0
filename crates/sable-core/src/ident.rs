//! Stable identities for types and methods.
//!
//! Types are identified by an xxh64 hash of their declared name; methods by
//! a hash over the owning type, the case-folded method name, and the
//! parameter type list (so overloads get distinct ids). Ids are stable
//! across compilations of the same program, which keeps side tables and
//! emitted operands reproducible.

use std::fmt;

use xxhash_rust::xxh64::xxh64;

const TYPE_SEED: u64 = 0x5ab1_e000;
const METHOD_SEED: u64 = 0x5ab1_e001;

/// Unique identity of a type descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u64);

impl TypeId {
    /// Compute the id for a type name.
    pub fn from_name(name: &str) -> Self {
        Self(xxh64(name.as_bytes(), TYPE_SEED))
    }

    /// The raw hash value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({:#018x})", self.0)
    }
}

/// Unique identity of a method signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(u64);

impl MethodId {
    /// Compute the id for a method on `owner` with the given case-folded
    /// name and parameter types.
    pub fn from_signature(owner: TypeId, folded_name: &str, param_types: &[TypeId]) -> Self {
        let mut bytes = Vec::with_capacity(8 + folded_name.len() + param_types.len() * 8);
        bytes.extend_from_slice(&owner.raw().to_le_bytes());
        bytes.extend_from_slice(folded_name.as_bytes());
        for p in param_types {
            bytes.extend_from_slice(&p.raw().to_le_bytes());
        }
        Self(xxh64(&bytes, METHOD_SEED))
    }

    /// The raw hash value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodId({:#018x})", self.0)
    }
}
