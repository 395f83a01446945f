// This is the circular log buffer carved out of the mailbox data region.

use crate::Mbox::Buffer::layout::MailboxLayout;

/// An append-only, overwrite-on-full ring of fixed-size records layered
/// inside the mailbox's data region.
///
/// This struct is NOT stored in shared memory. It is a transient view,
/// owned exclusively by the coprocessor for the duration of one logging
/// session; the next session (or any command that reuses the region)
/// implicitly destroys its contents.
///
/// ### Ring semantics
/// - Pushing into a full buffer silently discards the oldest *frame*
///   (`channels` consecutive records), never the newest data. There is no
///   "full" failure mode and no backpressure; the host must drain fast
///   enough relative to the sample rate if it wants no loss.
/// - `capacity` is always a multiple of `channels`, so a drain never
///   observes a torn multi-channel record.
/// - After every push the live head/tail cursors and the pushed-record
///   count are republished into reserved mailbox slots. The host reads
///   those without synchronization; a read concurrent with a push can see
///   cursors from two different pushes. Accepted limitation.
pub struct LogBuffer<'a> {
    /// The mailbox whose data region backs this ring.
    pub(crate) mbox: &'a MailboxLayout,

    /// Word index of the first storage word.
    pub(crate) start: usize,

    /// Words covered by the ring: `capacity * item_words`. The ring wraps
    /// at `start + span`.
    pub(crate) span: usize,

    /// Maximum record count.
    pub(crate) capacity: usize,

    /// Words per record.
    pub(crate) item_words: usize,

    /// Interleaved channel count; overwrite granularity.
    pub(crate) channels: usize,

    /// Word index of the oldest unread record.
    pub(crate) head: usize,

    /// Word index of the next write.
    pub(crate) tail: usize,

    /// Records currently held. Fullness is tracked here, not by comparing
    /// `head == tail`, so the ring can hold exactly `capacity` records and
    /// an empty ring is unambiguous.
    pub(crate) count: usize,

    /// Total records ever pushed this session.
    pub(crate) pushed: u64,

    /// Total records discarded by overwrite this session.
    pub(crate) dropped: u64,
}
