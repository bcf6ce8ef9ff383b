//! Architectural machine-state model primitives.

/// Machine state aggregate and register identifiers.
pub mod machine;
/// Processor status register, privilege domain, and condition codes.
pub mod psr;
/// Trace-latched datapath control signals.
pub mod signals;

pub use machine::{MachineState, Reg, HALT_ADDRESS, MEMORY_WORDS, RESET_PC};
pub use psr::{Condition, Privilege, Psr, RESET_PSR};
pub use signals::ControlSignals;
