use std::io;
use std::sync::atomic::Ordering::Relaxed;

use super::layout::{
    MailboxLayout, LOG_END_WORD, LOG_START_WORD, SLOT_HEAD, SLOT_LAST_VALUE, SLOT_PUSHED,
    SLOT_TAIL, WORD_BYTES,
};
use super::Buffer::LogBuffer;

/// Sentinel published into the last-value slot at init, before any sample
/// has been pushed.
pub const LOG_INIT_SENTINEL: u32 = 0xFFFF_FFFF;

impl<'a> LogBuffer<'a> {
    /// Start a logging session over the mailbox's log region.
    ///
    /// `capacity` is derived as `(max_samples / channels) * channels` so
    /// that multi-channel interleaving stays aligned; getting this wrong
    /// causes channel-misaligned reads on the host side, which is why the
    /// rule lives here and nowhere else. Must be called exactly once per
    /// session.
    ///
    /// Publishes the init sentinel and the initial cursors into the
    /// reserved mailbox slots so the host can immediately see where a
    /// drain would start.
    pub fn init(
        mbox: &'a MailboxLayout,
        max_samples: usize,
        item_size: usize,
        channels: usize,
    ) -> io::Result<LogBuffer<'a>> {
        if item_size == 0 || item_size % WORD_BYTES != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("log item size must be a nonzero multiple of {WORD_BYTES} bytes, got {item_size}"),
            ));
        }
        if channels == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "log channel count must be at least 1",
            ));
        }

        // The one non-trivial arithmetic rule in this subsystem.
        let capacity = (max_samples / channels) * channels;
        let item_words = item_size / WORD_BYTES;
        let span = capacity * item_words;

        if capacity == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("max_samples {max_samples} too small for {channels} channels"),
            ));
        }
        if LOG_START_WORD + span > LOG_END_WORD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "log span of {span} words does not fit the mailbox log region ({} words)",
                    LOG_END_WORD - LOG_START_WORD
                ),
            ));
        }

        let cb = LogBuffer {
            mbox,
            start: LOG_START_WORD,
            span,
            capacity,
            item_words,
            channels,
            head: LOG_START_WORD,
            tail: LOG_START_WORD,
            count: 0,
            pushed: 0,
            dropped: 0,
        };

        // initialize mailbox slots for the host's drain loop
        mbox.data[SLOT_LAST_VALUE].store(LOG_INIT_SENTINEL, Relaxed);
        mbox.data[SLOT_PUSHED].store(0, Relaxed);
        mbox.data[SLOT_HEAD].store((cb.head * WORD_BYTES) as u32, Relaxed);
        mbox.data[SLOT_TAIL].store((cb.tail * WORD_BYTES) as u32, Relaxed);

        Ok(cb)
    }

    /// Append one record, given as raw bytes in little-endian word order.
    /// `item.len()` must equal the item size this session was initialized
    /// with. Overwrites the oldest frame when full; never fails on a full
    /// ring.
    pub fn push_back(&mut self, item: &[u8]) -> io::Result<()> {
        if item.len() != self.item_words * WORD_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "record is {} bytes, session item size is {}",
                    item.len(),
                    self.item_words * WORD_BYTES
                ),
            ));
        }

        let mut first = 0u32;
        for (i, chunk) in item.chunks_exact(WORD_BYTES).enumerate() {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if i == 0 {
                first = word;
            }
            self.mbox.data[self.tail + i].store(word, Relaxed);
        }
        self.push_incr_ptrs();

        // mirror the newest value so the host has a cheap "current reading"
        self.mbox.data[SLOT_LAST_VALUE].store(first, Relaxed);
        Ok(())
    }

    /// Append one single-word integer record.
    pub fn push_back_u32(&mut self, value: u32) -> io::Result<()> {
        if self.item_words != 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "push_back_u32 requires a one-word item size",
            ));
        }
        self.mbox.data[self.tail].store(value, Relaxed);
        self.push_incr_ptrs();
        self.mbox.data[SLOT_LAST_VALUE].store(value, Relaxed);
        Ok(())
    }

    /// Append one single-word IEEE-754 float record.
    pub fn push_back_float(&mut self, value: f32) -> io::Result<()> {
        self.push_back_u32(value.to_bits())
    }

    /// The pointer-advance/overwrite step shared by every push variant.
    ///
    /// Advances `tail` by one record, wrapping at the span end. When the
    /// ring is full the oldest whole frame (`channels` records) is
    /// discarded: `head` advances by a frame stride and the dropped counter
    /// grows by `channels`. Because `capacity` and the span are exact
    /// multiples of the frame stride, `head` wraps exactly at the span end
    /// and stays frame-aligned forever.
    ///
    /// Republishes head/tail/count into the reserved mailbox slots so the
    /// host's drain loop always sees an advancing snapshot.
    fn push_incr_ptrs(&mut self) {
        self.tail += self.item_words;
        if self.tail >= self.start + self.span {
            self.tail = self.start;
        }

        if self.count == self.capacity {
            self.head += self.item_words * self.channels;
            if self.head >= self.start + self.span {
                self.head = self.start;
            }
            self.count -= self.channels;
            self.dropped += self.channels as u64;
        }
        self.count += 1;
        self.pushed += 1;

        // update mailbox head and tail
        self.mbox.data[SLOT_PUSHED].store(self.pushed as u32, Relaxed);
        self.mbox.data[SLOT_HEAD].store((self.head * WORD_BYTES) as u32, Relaxed);
        self.mbox.data[SLOT_TAIL].store((self.tail * WORD_BYTES) as u32, Relaxed);
    }

    /// Maximum record count for this session.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Interleaved channel count.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Records currently held.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total records pushed this session.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Total records lost to overwrite this session.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Byte offset of the oldest unread record within the data region.
    pub fn head_offset(&self) -> usize {
        self.head * WORD_BYTES
    }

    /// Byte offset of the next write within the data region.
    pub fn tail_offset(&self) -> usize {
        self.tail * WORD_BYTES
    }
}
