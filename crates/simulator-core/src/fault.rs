use std::fmt;

use thiserror::Error;

use crate::state::Privilege;

/// Memory-touching phase that consulted the permission checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessKind {
    /// Instruction fetch at the current PC.
    Fetch,
    /// Data read on behalf of a load instruction.
    Load,
    /// Data write on behalf of a store instruction.
    Store,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => f.write_str("instruction fetch"),
            Self::Load => f.write_str("load"),
            Self::Store => f.write_str("store"),
        }
    }
}

/// Fatal simulation faults.
///
/// Every fault ends the run: the cycle that raises one clears the control
/// signals, leaves no partially-mutated machine state behind, and emits no
/// trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// A fetch, load, or store address crossed the privilege boundary
    /// for the current mode.
    #[error("{kind} at x{addr:04X} denied in {mode} mode")]
    AccessViolation {
        /// Phase of the cycle that was denied.
        kind: AccessKind,
        /// Privilege domain at the time of the access.
        mode: Privilege,
        /// Address that failed the check.
        addr: u16,
    },
    /// The fetched word's top nibble matches no defined instruction class.
    #[error("unrecognised opcode in instruction x{word:04X}")]
    UnrecognisedOpcode {
        /// The offending instruction word.
        word: u16,
    },
}
