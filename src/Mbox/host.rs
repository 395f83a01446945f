// src/Mbox/host.rs

use crate::Core::region::MailboxRegion;
use crate::Mbox::Buffer::layout::{
    MailboxLayout, DATA_WORDS, LOG_START_WORD, SLOT_HEAD, SLOT_LAST_VALUE, SLOT_PUSHED,
    SLOT_STATUS, SLOT_TAIL, WORD_BYTES,
};
use crate::Mbox::Structs::Command_Structs::{CmdStatus, Command};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The host endpoint of a mailbox.
///
/// The host owns the mailbox while the command word is 0: it writes
/// parameter words, then a single command word with the pending bit set,
/// and from that point the coprocessor owns the region until it clears the
/// word back to 0. The host uses that transition as the sole completion
/// signal. Result words stay valid after the clear; only the next issued
/// command invalidates them.
pub struct Host {
    region: Arc<MailboxRegion>,
    // Serializes write-params-then-issue sequences from a multi-threaded
    // host so two threads cannot interleave parameters for different
    // commands. The wire protocol itself stays single-outstanding.
    issue_lock: Mutex<()>,
}

impl Host {
    pub(crate) fn new(region: Arc<MailboxRegion>) -> Self {
        Self {
            region,
            issue_lock: Mutex::new(()),
        }
    }

    fn mbox(&self) -> &MailboxLayout {
        self.region.layout()
    }

    /// Write one parameter word. Callers composing several parameters with
    /// an issue should prefer [`Host::issue_with_params`], which holds the
    /// issue lock across the whole sequence.
    pub fn write_param(&self, slot: usize, value: u32) -> io::Result<()> {
        check_slot(slot)?;
        self.mbox().data[slot].store(value, Relaxed);
        Ok(())
    }

    /// Write one parameter word as an IEEE-754 float.
    pub fn write_param_float(&self, slot: usize, value: f32) -> io::Result<()> {
        self.write_param(slot, value.to_bits())
    }

    /// Issue a command: sets the command word to `(opcode << 1) | 1`.
    ///
    /// Fails with `WouldBlock` if a command is already outstanding. The one
    /// legal case of issuing while the coprocessor is busy, the stop
    /// opcode during a logging session, goes through here too, because a
    /// logging handler clears the command word when it accepts the session.
    pub fn issue(&self, opcode: u32) -> io::Result<()> {
        let _guard = self.issue_lock.lock();
        self.issue_locked(opcode)
    }

    /// Write parameter words into slots `0..params.len()` and issue
    /// `opcode`, atomically with respect to other host threads.
    pub fn issue_with_params(&self, opcode: u32, params: &[u32]) -> io::Result<()> {
        let _guard = self.issue_lock.lock();
        for (slot, &value) in params.iter().enumerate() {
            check_slot(slot)?;
            self.mbox().data[slot].store(value, Relaxed);
        }
        self.issue_locked(opcode)
    }

    fn issue_locked(&self, opcode: u32) -> io::Result<()> {
        let encoded = Command::encode(opcode);
        self.mbox()
            .command
            .compare_exchange(0, encoded, Release, Relaxed)
            .map_err(|raw| {
                io::Error::new(
                    io::ErrorKind::WouldBlock,
                    format!("command {:#x} still outstanding", raw),
                )
            })?;
        log::trace!("issued opcode {:#x}", opcode);
        Ok(())
    }

    /// True once the coprocessor has cleared the command word.
    pub fn poll_complete(&self) -> bool {
        self.mbox().command.load(Acquire) == 0
    }

    /// Spin until the current command completes. The protocol has no
    /// cancellation; prefer [`Host::wait_complete_timeout`] anywhere a
    /// wedged coprocessor would otherwise hang the caller forever.
    pub fn wait_complete(&self) {
        while !self.poll_complete() {
            std::hint::spin_loop();
        }
    }

    /// Spin until completion or until `timeout` elapses.
    pub fn wait_complete_timeout(&self, timeout: Duration) -> io::Result<()> {
        let start = Instant::now();
        while !self.poll_complete() {
            if start.elapsed() >= timeout {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("command not completed within {:?}", timeout),
                ));
            }
            std::hint::spin_loop();
        }
        Ok(())
    }

    /// Issue and spin for completion. Convenience for simple synchronous
    /// commands.
    pub fn issue_wait(&self, opcode: u32) -> io::Result<()> {
        self.issue(opcode)?;
        self.wait_complete();
        Ok(())
    }

    /// Read one result word.
    pub fn read_result(&self, slot: usize) -> io::Result<u32> {
        check_slot(slot)?;
        Ok(self.mbox().data[slot].load(Relaxed))
    }

    /// Read one result word as an IEEE-754 float.
    pub fn read_result_float(&self, slot: usize) -> io::Result<f32> {
        Ok(f32::from_bits(self.read_result(slot)?))
    }

    /// Status of the last handled command. Meaningful after completion;
    /// commands the coprocessor did not recognize leave it untouched.
    pub fn status(&self) -> CmdStatus {
        CmdStatus::from_word(self.mbox().data[SLOT_STATUS].load(Relaxed))
    }

    /// Raw bits of the most recent logged sample (the live mirror the
    /// coprocessor republishes on every push).
    pub fn last_value(&self) -> u32 {
        self.mbox().data[SLOT_LAST_VALUE].load(Relaxed)
    }

    pub fn last_value_float(&self) -> f32 {
        f32::from_bits(self.last_value())
    }

    /// Records pushed into the log so far this session.
    pub fn log_pushed(&self) -> u32 {
        self.mbox().data[SLOT_PUSHED].load(Relaxed)
    }

    /// Records lost to overwrite, given the capacity and channel count the
    /// host configured for the session. Overwrite discards whole frames of
    /// `channels` records at a time, so any overrun rounds up to a frame
    /// multiple. Strictly an observability extension; the wire protocol
    /// itself never reports loss.
    pub fn dropped_records(&self, capacity: usize, channels: usize) -> u32 {
        let overrun = self.log_pushed().saturating_sub(capacity as u32);
        let channels = channels.max(1) as u32;
        overrun.div_ceil(channels) * channels
    }

    /// Drain the log as single-word integer records.
    ///
    /// `capacity` is the session span in 32-bit words (records times words
    /// per record), which the host knows a priori: it configured the
    /// logging command. Copies everything between the published head and
    /// tail in insertion order, wrapping at the span end; identical head
    /// and tail with a nonzero push count means a full ring.
    ///
    /// Reading the cursors concurrently with a coprocessor push can observe
    /// a snapshot spanning two pushes; the result is then off by a sample,
    /// never out of bounds. Known, tolerated race.
    pub fn drain_log_u32(&self, capacity: usize) -> io::Result<Vec<u32>> {
        let mbox = self.mbox();
        let pushed = mbox.data[SLOT_PUSHED].load(Relaxed) as usize;
        let span_end = LOG_START_WORD + capacity;
        if span_end > DATA_WORDS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("capacity {} exceeds the mailbox log region", capacity),
            ));
        }
        if pushed == 0 {
            return Ok(Vec::new());
        }

        let head = self.log_cursor(SLOT_HEAD, span_end)?;
        let tail = self.log_cursor(SLOT_TAIL, span_end)?;

        // head == tail after at least one push means the ring is full
        let count = if tail == head {
            capacity
        } else {
            (tail + capacity - head) % capacity
        };

        let mut out = Vec::with_capacity(count);
        let mut idx = head;
        for _ in 0..count {
            out.push(mbox.data[idx].load(Relaxed));
            idx += 1;
            if idx >= span_end {
                idx = LOG_START_WORD;
            }
        }
        Ok(out)
    }

    fn log_cursor(&self, slot: usize, span_end: usize) -> io::Result<usize> {
        let off = self.mbox().data[slot].load(Relaxed) as usize;
        if off % WORD_BYTES != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("torn log cursor offset {:#x}", off),
            ));
        }
        let word = off / WORD_BYTES;
        if word < LOG_START_WORD || word >= span_end {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "log cursor {} outside session span {}..{}",
                    word, LOG_START_WORD, span_end
                ),
            ));
        }
        Ok(word)
    }

    /// Drain the log as single-word float records.
    pub fn drain_log_floats(&self, capacity: usize) -> io::Result<Vec<f32>> {
        Ok(self
            .drain_log_u32(capacity)?
            .into_iter()
            .map(f32::from_bits)
            .collect())
    }

    pub(crate) fn region(&self) -> &MailboxRegion {
        &self.region
    }
}

fn check_slot(slot: usize) -> io::Result<()> {
    if slot >= DATA_WORDS {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("mailbox data slot {} out of range (0..{})", slot, DATA_WORDS),
        ));
    }
    Ok(())
}
