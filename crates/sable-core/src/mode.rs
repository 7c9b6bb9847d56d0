//! Argument-passing modes.
//!
//! Every parameter and call argument carries one of four modes. `Out` and
//! `InOut` wrap a reference to the element type; `Once` arguments are
//! materialized only when an iterator is constructed and are excluded from
//! per-resumption calls.

use std::fmt;

/// The passing mode of a parameter or call argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Value flows callee-ward. The default.
    #[default]
    In,
    /// Value flows caller-ward through a reference.
    Out,
    /// Value flows both ways through a reference.
    InOut,
    /// Materialized at iterator construction only.
    Once,
}

impl Mode {
    /// Whether this mode passes a reference to the element type.
    #[inline]
    pub fn is_reference(self) -> bool {
        matches!(self, Mode::Out | Mode::InOut)
    }

    /// Whether this mode binds at iterator construction.
    #[inline]
    pub fn is_once(self) -> bool {
        matches!(self, Mode::Once)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::In => "in",
            Mode::Out => "out",
            Mode::InOut => "inout",
            Mode::Once => "once",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_modes() {
        assert!(Mode::Out.is_reference());
        assert!(Mode::InOut.is_reference());
        assert!(!Mode::In.is_reference());
        assert!(!Mode::Once.is_reference());
    }

    #[test]
    fn display() {
        assert_eq!(Mode::InOut.to_string(), "inout");
        assert_eq!(Mode::Once.to_string(), "once");
    }
}
