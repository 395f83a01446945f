// src/Mbox/iop.rs

use crate::Core::region::MailboxRegion;
use crate::Mbox::Buffer::layout::{MailboxLayout, CMD_PENDING, DATA_WORDS, SLOT_STATUS};
use crate::Mbox::Buffer::LogBuffer;
use crate::Mbox::Structs::Command_Structs::{CmdStatus, Command};
use std::cell::Cell;
use std::io;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::Arc;

/// The coprocessor endpoint of a mailbox.
///
/// This is the side the dispatch loop drives: it polls for commands, reads
/// host-populated parameters, writes results, and clears the command word
/// to signal completion. From observing a pending command until clearing
/// it, this side owns the mailbox.
pub struct Iop {
    region: Arc<MailboxRegion>,
    // Set by clear_command so the dispatch loop can tell that the running
    // handler already completed the command itself. A raw-word CAS cannot
    // carry that information: a command re-issued with the same opcode is
    // bit-identical to the one just handled.
    cleared: Cell<bool>,
}

impl Iop {
    pub(crate) fn new(region: Arc<MailboxRegion>) -> Self {
        Self {
            region,
            cleared: Cell::new(false),
        }
    }

    pub(crate) fn mbox(&self) -> &MailboxLayout {
        self.region.layout()
    }

    /// One busy-spin read of the command word. Returns `None` while idle.
    /// Never mutates anything.
    pub fn poll_command(&self) -> Option<Command> {
        Command::from_raw(self.mbox().command.load(Acquire))
    }

    /// True if a new command is pending (bit 0 of the command word set).
    /// Logging loops watch this so a freshly issued stop command ends the
    /// session.
    pub fn command_pending(&self) -> bool {
        self.mbox().command.load(Acquire) & CMD_PENDING != 0
    }

    /// A host-populated parameter word. Read these before clearing the
    /// command; after the clear the host may overwrite them at any time.
    pub fn read_param(&self, slot: usize) -> io::Result<u32> {
        self.check_slot(slot)?;
        Ok(self.mbox().data[slot].load(Relaxed))
    }

    /// A parameter word reinterpreted as an IEEE-754 float.
    pub fn read_param_float(&self, slot: usize) -> io::Result<f32> {
        Ok(f32::from_bits(self.read_param(slot)?))
    }

    /// Write one result word. Visible to the host as soon as the store
    /// retires; the host only looks after the command word clears.
    pub fn write_result(&self, slot: usize, value: u32) -> io::Result<()> {
        self.check_slot(slot)?;
        self.mbox().data[slot].store(value, Relaxed);
        Ok(())
    }

    /// Write one result word as an IEEE-754 float.
    pub fn write_result_float(&self, slot: usize, value: f32) -> io::Result<()> {
        self.write_result(slot, value.to_bits())
    }

    /// Write the reserved status slot.
    pub fn write_status(&self, status: CmdStatus) {
        self.mbox().data[SLOT_STATUS].store(status.as_word(), Relaxed);
    }

    /// Store 0 to the command word: the completion signal, and the only
    /// "exit code" the protocol has. Must be the last mailbox write of a
    /// handler invocation that returns control to the idle loop.
    ///
    /// A handler may call this itself to hand the mailbox back early
    /// (logging sessions do, so the host can issue the command that ends
    /// them); the dispatch loop then skips its own clear, leaving whatever
    /// the host issued in the meantime untouched.
    pub fn clear_command(&self) {
        self.mbox().command.store(0, Release);
        self.cleared.set(true);
    }

    /// Arm the self-clear marker for one dispatch. Returns true if the
    /// previous dispatch cleared the command from inside its handler.
    pub(crate) fn take_cleared(&self) -> bool {
        self.cleared.replace(false)
    }

    /// Begin a logging session over the mailbox's log region. See
    /// [`LogBuffer::init`] for the capacity rule.
    pub fn log_session(
        &self,
        max_samples: usize,
        item_size: usize,
        channels: usize,
    ) -> io::Result<LogBuffer<'_>> {
        LogBuffer::init(self.mbox(), max_samples, item_size, channels)
    }

    fn check_slot(&self, slot: usize) -> io::Result<()> {
        if slot >= DATA_WORDS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("mailbox data slot {} out of range (0..{})", slot, DATA_WORDS),
            ));
        }
        Ok(())
    }
}
