use std::fmt;
use std::sync::atomic::Ordering;

use crate::Core::region::MailboxRegion;
use crate::Mbox::Buffer::LogBuffer;
use crate::Mbox::{Host, Iop};

/// Debug output for the shared structures never dereferences beyond what
/// the owning side is allowed to read; cursors and the raw command word
/// are snapshots, not synchronized state.
impl fmt::Debug for MailboxRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailboxRegion")
            .field("base", &format_args!("{:p}", self.base_ptr()))
            .field("size", &self.size())
            .field("version", &self.header().version)
            .finish()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("region", self.region())
            .field(
                "command",
                &format_args!("{:#x}", self.region().layout().command.load(Ordering::Relaxed)),
            )
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Iop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iop")
            .field(
                "command",
                &format_args!("{:#x}", self.mbox().command.load(Ordering::Relaxed)),
            )
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for LogBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBuffer")
            .field("capacity", &self.capacity())
            .field("channels", &self.channels())
            .field("len", &self.len())
            .field("head_offset", &self.head_offset())
            .field("tail_offset", &self.tail_offset())
            .field("pushed", &self.pushed())
            .field("dropped", &self.dropped())
            .finish()
    }
}
