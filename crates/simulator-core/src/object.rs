//! Binary object-file loader.
//!
//! An object file is a stream of big-endian 16-bit words. Each segment
//! opens with a magic word (code or data, both loaded identically),
//! followed by a start address, a word count, and that many data words
//! written to consecutive memory addresses. Words between segments that
//! are not a magic marker are treated as padding and skipped; a trailing
//! odd byte is ignored. Multiple segments per file and multiple files per
//! memory image compose freely.

use thiserror::Error;

use crate::state::{MachineState, MEMORY_WORDS};

/// Magic word opening a code segment.
pub const CODE_SEGMENT_MAGIC: u16 = 0xCADE;

/// Magic word opening a data segment.
pub const DATA_SEGMENT_MAGIC: u16 = 0xDADA;

/// Object-file parse failures. Loading stops at the first error; words
/// from earlier, well-formed segments remain in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ObjectError {
    /// The stream ended inside a segment header or payload.
    #[error("object file truncated inside a segment (byte offset {offset})")]
    UnexpectedEof {
        /// Byte offset at which the next word was expected.
        offset: usize,
    },
    /// A segment would run past the end of the address space.
    #[error("segment at x{start:04X} with {count} words exceeds the address space")]
    SegmentOverflow {
        /// Segment start address.
        start: u16,
        /// Segment word count.
        count: u16,
    },
}

/// Loads one object file image into machine memory.
///
/// # Errors
///
/// Returns [`ObjectError::UnexpectedEof`] when a segment is truncated and
/// [`ObjectError::SegmentOverflow`] when a segment would exceed the 64K
/// word space. The overflow check runs before any word of the offending
/// segment is written.
pub fn load_object(machine: &mut MachineState, bytes: &[u8]) -> Result<(), ObjectError> {
    let mut offset = 0;
    while offset + 2 <= bytes.len() {
        let word = word_at(bytes, offset);
        offset += 2;
        if word == CODE_SEGMENT_MAGIC || word == DATA_SEGMENT_MAGIC {
            offset = load_segment(machine, bytes, offset)?;
        }
    }
    Ok(())
}

/// Parses one segment body (start address, count, payload) beginning at
/// `offset`, returning the offset just past the payload.
fn load_segment(
    machine: &mut MachineState,
    bytes: &[u8],
    offset: usize,
) -> Result<usize, ObjectError> {
    let start = read_word(bytes, offset)?;
    let count = read_word(bytes, offset + 2)?;
    let mut offset = offset + 4;

    if usize::from(start) + usize::from(count) > MEMORY_WORDS {
        return Err(ObjectError::SegmentOverflow { start, count });
    }

    for index in 0..count {
        let word = read_word(bytes, offset)?;
        offset += 2;
        machine.set_mem(start + index, word);
    }
    Ok(offset)
}

fn read_word(bytes: &[u8], offset: usize) -> Result<u16, ObjectError> {
    if offset + 2 <= bytes.len() {
        Ok(word_at(bytes, offset))
    } else {
        Err(ObjectError::UnexpectedEof { offset })
    }
}

/// Recovers host order from the on-disk big-endian word at `offset`.
fn word_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}
