// Value types for the command word; no atomics here, these are plain
// decoded copies of what was read from the mailbox.

use crate::Mbox::Buffer::layout::CMD_PENDING;

/// A decoded command word.
///
/// Wire convention (fixed for this crate, see DESIGN.md for the rationale):
/// bit 0 is the pending flag, the opcode occupies the remaining bits. The
/// host encodes `(opcode << 1) | 1`; completion is the coprocessor storing
/// 0 to the whole word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Command {
    raw: u32,
}

impl Command {
    /// Encode an opcode into the wire form the host writes.
    pub fn encode(opcode: u32) -> u32 {
        (opcode << 1) | CMD_PENDING
    }

    /// Decode a raw command word. Returns `None` unless the pending bit is
    /// set; a cleared word is "idle", not a command.
    pub fn from_raw(raw: u32) -> Option<Command> {
        if raw & CMD_PENDING != 0 {
            Some(Command { raw })
        } else {
            None
        }
    }

    /// The operation selector (pending bit masked off).
    pub fn opcode(&self) -> u32 {
        self.raw >> 1
    }

    /// The raw word as observed in the mailbox. Peripherals that pack
    /// immediate parameters into high bits can dig them out of this.
    pub fn raw(&self) -> u32 {
        self.raw
    }
}

/// Status written into the reserved status slot after each handled command.
///
/// The original firmware had no error channel at all; this is the one
/// deliberate superset extension. A slot value of 0 still reads as success,
/// so hosts that never look at the status slot lose nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum CmdStatus {
    #[default]
    Ok = 0,
    /// The handler's bus transaction failed (NACK, device absent, garbage).
    BusError = 1,
    /// The handler gave up waiting on hardware.
    Timeout = 2,
}

impl CmdStatus {
    pub fn as_word(self) -> u32 {
        self as u32
    }

    /// Decode a status word. Anything unrecognized collapses to `BusError`;
    /// the wire gives us no better taxonomy.
    pub fn from_word(word: u32) -> CmdStatus {
        match word {
            0 => CmdStatus::Ok,
            2 => CmdStatus::Timeout,
            _ => CmdStatus::BusError,
        }
    }
}
