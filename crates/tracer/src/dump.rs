//! Nonzero-memory dump writer.
//!
//! Lists every memory cell holding a nonzero word, one per line, as
//! `address: NNNNN contents: 0xXXXX` (zero-padded decimal address,
//! uppercase hex contents).

use std::io::{self, Write};

use simulator_core::MachineState;

/// Writes the nonzero cells of `machine`'s memory to `out` in address
/// order.
///
/// # Errors
///
/// Propagates the first write error.
pub fn write_memory_dump<W: Write>(machine: &MachineState, mut out: W) -> io::Result<()> {
    for addr in 0..=u16::MAX {
        let value = machine.mem(addr);
        if value != 0 {
            writeln!(out, "address: {addr:05} contents: 0x{value:04X}")?;
        }
    }
    out.flush()
}
