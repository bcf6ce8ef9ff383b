//! Per-cycle trace records.
//!
//! One record is captured per successfully executed cycle, after the
//! handler has run and before the control signals are cleared. The text
//! rendering lives with the driving binary; the core only defines the
//! record and the sink contract.

use crate::state::{MachineState, Reg};

/// Everything one trace line reports about an executed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TraceRecord {
    /// PC value captured before the cycle ran.
    pub pc: u16,
    /// Raw instruction word fetched at that PC.
    pub word: u16,
    /// Register-file write enable.
    pub reg_write: bool,
    /// Destination register selector.
    pub rd: u8,
    /// Value written to the register file, or zero when no write occurred.
    pub reg_value: u16,
    /// NZP write enable.
    pub nzp_write: bool,
    /// One-hot NZP code (0..=7).
    pub nzp: u8,
    /// Data-memory write enable.
    pub mem_write: bool,
    /// Effective data-memory address, or zero when memory was untouched.
    pub mem_addr: u16,
    /// Data-memory value read or written, or zero when untouched.
    pub mem_value: u16,
}

impl TraceRecord {
    /// Captures the post-handler signal state for the cycle that fetched
    /// `word` at `pc`.
    pub(crate) fn capture(machine: &MachineState, pc: u16, word: u16) -> Self {
        let signals = machine.signals();
        let reg_value = if signals.reg_write {
            machine.reg(Reg::from_u3(signals.rd))
        } else {
            0
        };
        Self {
            pc,
            word,
            reg_write: signals.reg_write,
            rd: signals.rd,
            reg_value,
            nzp_write: signals.nzp_write,
            nzp: signals.nzp_value,
            mem_write: signals.mem_write,
            mem_addr: signals.mem_addr,
            mem_value: signals.mem_value,
        }
    }
}

/// Sink receiving one record per executed cycle, in execution order.
pub trait TraceSink {
    /// Records one executed cycle.
    fn record(&mut self, record: &TraceRecord);
}

/// Collects records in memory; the natural sink for tests.
impl TraceSink for Vec<TraceRecord> {
    fn record(&mut self, record: &TraceRecord) {
        self.push(*record);
    }
}

/// Discards every record; useful when only final state matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&mut self, _record: &TraceRecord) {}
}
