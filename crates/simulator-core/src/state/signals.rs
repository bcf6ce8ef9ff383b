/// Datapath control signals latched by the executing instruction.
///
/// These carry no semantic state across cycles: the cycle driver clears
/// them before every fetch, the running instruction latches the selectors
/// and write enables it exercises, and the trace emitter reads them once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ControlSignals {
    /// First source register selector (3 bits).
    pub rs: u8,
    /// Second source register selector (3 bits).
    pub rt: u8,
    /// Destination register selector (3 bits).
    pub rd: u8,
    /// Register-file write enable.
    pub reg_write: bool,
    /// NZP condition-code write enable.
    pub nzp_write: bool,
    /// Data-memory write enable.
    pub mem_write: bool,
    /// One-hot NZP code latched by the condition-code updater (0..=7).
    pub nzp_value: u8,
    /// Effective data-memory address touched by a load or store.
    pub mem_addr: u16,
    /// Value read from or written to data memory.
    pub mem_value: u16,
}

impl ControlSignals {
    /// Resets every signal to zero.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` when every signal is zero.
    #[must_use]
    pub const fn is_clear(&self) -> bool {
        self.rs == 0
            && self.rt == 0
            && self.rd == 0
            && !self.reg_write
            && !self.nzp_write
            && !self.mem_write
            && self.nzp_value == 0
            && self.mem_addr == 0
            && self.mem_value == 0
    }
}
