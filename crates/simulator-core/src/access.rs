//! Privilege-gated address-space policy.
//!
//! The address space is split at `0x8000`: the lower half belongs to user
//! programs, the upper half to the operating system. The checker is a pure
//! predicate consulted on every instruction fetch and on the computed
//! effective address of every load and store, before any state is written.

use crate::fault::{AccessKind, Fault};
use crate::state::Privilege;

/// First address of the system half of the address space.
pub const SYSTEM_BASE: u16 = 0x8000;

/// Returns `true` when `mode` may not touch `addr`.
///
/// User mode is denied the system half except the very top word: the
/// upper bound is exclusive of `0xFFFF`, unlike the inclusive
/// supervisor bound.
#[must_use]
pub const fn is_denied(mode: Privilege, addr: u16) -> bool {
    match mode {
        Privilege::User => addr >= SYSTEM_BASE && addr < 0xFFFF,
        Privilege::Supervisor => addr < SYSTEM_BASE,
    }
}

/// Checks one access against the privilege policy.
///
/// # Errors
///
/// Returns [`Fault::AccessViolation`] naming the phase, mode, and address
/// when the access is denied.
pub const fn check_access(mode: Privilege, addr: u16, kind: AccessKind) -> Result<(), Fault> {
    if is_denied(mode, addr) {
        Err(Fault::AccessViolation { kind, mode, addr })
    } else {
        Ok(())
    }
}
