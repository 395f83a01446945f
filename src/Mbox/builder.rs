use super::{Host, Iop};
use crate::Core::region::MailboxRegion;
use crate::Core::SharedMemory::{attach_shared_memory, create_shared_memory, HeapRegion};
use crate::Mbox::Buffer::layout::region_size;
use std::io;
use std::sync::Arc;

/// Builds mailbox endpoints.
///
/// The coprocessor side creates the named region (it boots first, like
/// firmware), the host side attaches to it. For single-process simulation
/// and tests, [`MailboxBuilder::build_pair`] wires both endpoints over one
/// heap-backed region.
pub struct MailboxBuilder {
    name: String,
}

impl Default for MailboxBuilder {
    fn default() -> Self {
        Self {
            name: "iop_mbox".to_string(),
        }
    }
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the region under /dev/shm for cross-process use.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Create the shared region and return the coprocessor endpoint.
    pub fn build_iop(self) -> io::Result<Iop> {
        let shm = create_shared_memory(region_size(), &self.name)?;
        let region = Arc::new(MailboxRegion::create(shm)?);
        Ok(Iop::new(region))
    }

    /// Attach to an existing shared region and return the host endpoint.
    pub fn build_host(self) -> io::Result<Host> {
        let shm = attach_shared_memory(&self.name, region_size())?;
        let region = Arc::new(MailboxRegion::attach(shm)?);
        Ok(Host::new(region))
    }

    /// Both endpoints over one in-process region.
    pub fn build_pair(self) -> io::Result<(Host, Iop)> {
        let shm = Box::new(HeapRegion::new(region_size())?);
        let region = Arc::new(MailboxRegion::create(shm)?);
        Ok((Host::new(Arc::clone(&region)), Iop::new(region)))
    }
}
