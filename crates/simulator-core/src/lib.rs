//! Behavioral simulator core for the LC-4 teaching ISA.
//!
//! 16-bit, word-addressed, register-based: 8 general registers, a status
//! register carrying the privilege bit and NZP condition codes, and a
//! 64K-word flat address space. The crate owns the decode/execute engine
//! and the object-file loader; text serialization and file handling live
//! with the driving binary.

/// Machine state: registers, PSR, memory, and control signals.
pub mod state;
pub use state::{
    Condition, ControlSignals, MachineState, Privilege, Psr, Reg, HALT_ADDRESS, MEMORY_WORDS,
    RESET_PC, RESET_PSR,
};

/// Instruction bit-field layout and opcode classification.
pub mod encoding;
pub use encoding::OpcodeClass;

/// Fatal fault taxonomy.
pub mod fault;
pub use fault::{AccessKind, Fault};

/// Privilege-gated address-space policy.
pub mod access;
pub use access::{check_access, is_denied, SYSTEM_BASE};

/// Instruction decoding into structured operand sets.
pub mod decoder;
pub use decoder::{
    decode, ArithmeticOp, BranchCondition, Comparison, Instruction, JumpTarget, LogicalOp,
    ShiftModOp, SubroutineTarget,
};

/// Opcode handlers and the per-cycle driver.
pub mod execute;
pub use execute::{run, step, StepOutcome};

/// Per-cycle trace records and the sink contract.
pub mod trace;
pub use trace::{NullSink, TraceRecord, TraceSink};

/// Binary object-file loader.
pub mod object;
pub use object::{load_object, ObjectError, CODE_SEGMENT_MAGIC, DATA_SEGMENT_MAGIC};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
