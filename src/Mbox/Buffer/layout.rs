use crossbeam_utils::CachePadded;
use std::mem::size_of;
use std::sync::atomic::AtomicU32;

/// Number of 32-bit data words in the mailbox.
/// This must be a constant so both sides agree on the region size at build time.
pub const DATA_WORDS: usize = 1024;

/// Bytes per mailbox data word.
pub const WORD_BYTES: usize = 4;

/// Bit 0 of the command word: set by the host on every new command,
/// observed by the coprocessor's polling loop.
pub const CMD_PENDING: u32 = 0x1;

/// Reserved data slot: raw bits of the most recent logged sample
/// (0xFFFF_FFFF sentinel right after log init).
pub const SLOT_LAST_VALUE: usize = 0;

/// Reserved data slot: monotonic count of records pushed into the log.
/// The host uses this both to size a drain and to detect overwritten data.
pub const SLOT_PUSHED: usize = 1;

/// Reserved data slot: byte offset of the log head within the data region.
pub const SLOT_HEAD: usize = 2;

/// Reserved data slot: byte offset of the log tail within the data region.
pub const SLOT_TAIL: usize = 3;

/// Reserved data slot: command status written by the dispatch loop after
/// every handled command. Never touched for unknown opcodes.
pub const SLOT_STATUS: usize = DATA_WORDS - 1;

/// First data word available as log backing store.
pub const LOG_START_WORD: usize = 4;

/// One past the last data word available as log backing store
/// (the status slot is carved out of the end of the region).
pub const LOG_END_WORD: usize = SLOT_STATUS;

/// The mailbox as it exists in shared memory.
///
/// This struct is the entire communication surface between the host and the
/// coprocessor. It is `#[repr(C)]` so both sides (and foreign-language hosts
/// going through the cdylib) agree on a stable layout.
///
/// ### Access discipline
/// - Word semantics: words 0..k of `data` are parameter/result slots, a
///   reserved sub-range starting at [`LOG_START_WORD`] backs the circular
///   log buffer, and each word is dual-typed as integer or IEEE-754 float
///   depending on the command.
/// - `command == 0` means idle / result consumed. A nonzero value with
///   [`CMD_PENDING`] set means a new command is pending with its opcode in
///   the remaining bits.
/// - The host is the only writer of a new command and its parameters; the
///   coprocessor is the only writer of results and the only side permitted
///   to clear `command` back to 0. Exactly one command is outstanding at a
///   time. This turn-taking is a convention, not a lock.
#[repr(C, align(128))]
pub struct MailboxLayout {
    /// Fixed array of 32-bit words at word-indexed offsets from the base.
    pub data: [AtomicU32; DATA_WORDS],

    /// The command word. Cache-padded so host polling does not contend
    /// with coprocessor stores into the data slots.
    pub command: CachePadded<AtomicU32>,
}

/// Identifies a mapped region as an iop-mbox mailbox. Lives ahead of the
/// [`MailboxLayout`] proper so the wire layout of the mailbox itself stays
/// bit-exact.
pub const REGION_MAGIC: u32 = 0x4950_4D42; // "IPMB"

/// Current version of the region layout.
pub const REGION_VERSION: u32 = 1;

/// Validation header at the very start of a mailbox region.
///
/// A process attaching to an existing region checks `magic`, `version` and
/// `data_words` before touching the mailbox behind it.
#[repr(C, align(128))]
pub struct RegionHeader {
    pub magic: u32,
    pub version: u32,
    /// Compiled [`DATA_WORDS`] of the creating side.
    pub data_words: u32,
    pub reserved: u32,
}

/// Total bytes a mailbox region occupies: header plus mailbox.
pub fn region_size() -> usize {
    size_of::<RegionHeader>() + size_of::<MailboxLayout>()
}
