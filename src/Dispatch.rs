//! The coprocessor's command dispatch loop: a single-threaded, non-reentrant
//! event machine with two states, idle (command word 0) and dispatching,
//! plus a logging sub-state some opcodes enter via [`run_logged`].
//!
//! Dispatch is table-driven: opcode to handler, with unknown opcodes
//! cleared and ignored. Everything a handler needs travels through an
//! explicit device-state object; there are no globals, which is also what
//! makes the loop testable without hardware.

use crate::Core::delay::DelaySource;
use crate::Mbox::Buffer::LogBuffer;
use crate::Mbox::Iop;
use crate::Mbox::Structs::Command_Structs::{CmdStatus, Command};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// A peripheral operation. Reads parameters and writes results through the
/// mailbox endpoint; `S` is whatever device state the peripheral carries
/// (bus driver, delay source, scratch).
pub type Handler<S> = fn(&mut S, &Iop, Command) -> io::Result<()>;

/// Opcode-to-handler registry. Opcode spaces are small (a handful of
/// values per peripheral), so lookup is a linear scan.
pub struct HandlerTable<S> {
    entries: Vec<(u32, Handler<S>)>,
}

impl<S> HandlerTable<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a handler. Last registration wins for a repeated opcode.
    pub fn register(mut self, opcode: u32, handler: Handler<S>) -> Self {
        self.entries.retain(|(op, _)| *op != opcode);
        self.entries.push((opcode, handler));
        self
    }

    pub fn lookup(&self, opcode: u32) -> Option<Handler<S>> {
        self.entries
            .iter()
            .find(|(op, _)| *op == opcode)
            .map(|(_, h)| *h)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S> Default for HandlerTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// One coprocessor instance: mailbox endpoint, handler table, device state.
pub struct DispatchLoop<S> {
    iop: Iop,
    table: HandlerTable<S>,
    state: S,
}

impl<S> DispatchLoop<S> {
    pub fn new(iop: Iop, table: HandlerTable<S>, state: S) -> Self {
        Self { iop, table, state }
    }

    pub fn iop(&self) -> &Iop {
        &self.iop
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// One poll/dispatch iteration.
    ///
    /// Idle polls mutate nothing and invoke nothing. On a pending command
    /// the matching handler runs synchronously, its outcome lands in the
    /// status slot, and the command word is cleared last. A handler that
    /// already cleared the word itself (logging sessions do) suppresses
    /// that final clear, so a command the host issued in the meantime is
    /// left intact for the next iteration. This cannot be a compare on the
    /// raw word: a re-issued command with the same opcode is bit-identical
    /// to the one just handled.
    ///
    /// An opcode with no registered handler is cleared and otherwise
    /// ignored: no result writes, no status write.
    ///
    /// Returns true if a command was observed.
    pub fn step(&mut self) -> bool {
        let cmd = match self.iop.poll_command() {
            Some(cmd) => cmd,
            None => return false,
        };

        match self.table.lookup(cmd.opcode()) {
            Some(handler) => {
                log::trace!("dispatching opcode {:#x}", cmd.opcode());
                self.iop.take_cleared();
                let status = match handler(&mut self.state, &self.iop, cmd) {
                    Ok(()) => CmdStatus::Ok,
                    Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                        log::debug!("opcode {:#x} timed out: {}", cmd.opcode(), e);
                        CmdStatus::Timeout
                    }
                    Err(e) => {
                        log::debug!("opcode {:#x} failed: {}", cmd.opcode(), e);
                        CmdStatus::BusError
                    }
                };
                self.iop.write_status(status);
                if !self.iop.take_cleared() {
                    self.iop.clear_command();
                }
            }
            None => {
                // no handler ran, so the word still holds this command and
                // a plain clear is safe
                log::debug!("unknown opcode {:#x}, dropping", cmd.opcode());
                self.iop.clear_command();
            }
        }
        true
    }

    /// The embedded form: poll forever. There is no shutdown path other
    /// than external reset.
    pub fn run(&mut self) -> ! {
        loop {
            if !self.step() {
                std::hint::spin_loop();
            }
        }
    }

    /// Poll until `running` goes false. For threaded simulations and demos
    /// that, unlike firmware, do have to exit.
    pub fn run_until(&mut self, running: &AtomicBool) {
        while running.load(Ordering::Relaxed) {
            if !self.step() {
                std::hint::spin_loop();
            }
        }
    }
}

/// The logging sub-state: sample, push, pace, re-poll, until the host
/// issues a new command (conventionally a dedicated stop opcode).
///
/// The caller, a "read and log" handler, must have already accepted the
/// session by reading its parameter words and clearing the command word;
/// the pending bit this loop watches belongs to the *next* command. The
/// check happens before each sample, so a stop that lands before the first
/// iteration captures nothing.
///
/// `sample` errors end the session early and propagate into the status
/// slot via the dispatch loop.
pub fn run_logged<F>(
    iop: &Iop,
    log: &mut LogBuffer<'_>,
    delay: &mut dyn DelaySource,
    interval_ms: u32,
    mut sample: F,
) -> io::Result<()>
where
    F: FnMut(&mut LogBuffer<'_>) -> io::Result<()>,
{
    loop {
        if iop.command_pending() {
            log::trace!(
                "log session ended after {} samples ({} dropped)",
                log.pushed(),
                log.dropped()
            );
            return Ok(());
        }
        sample(log)?;
        delay.delay_ms(interval_ms);
    }
}
