use crate::Core::SharedMemory::SharedMemoryBackend;
use crate::Mbox::Buffer::layout::{
    region_size, MailboxLayout, RegionHeader, DATA_WORDS, REGION_MAGIC, REGION_VERSION,
};
use std::io;
use std::mem::{align_of, size_of};

/// Owner of one mailbox region: backing memory plus validated pointers into
/// the header and the mailbox behind it.
///
/// The region exists for the lifetime of the coprocessor instance; it is
/// never reallocated, only continuously overwritten. Endpoints
/// ([`crate::Mbox::Host`], [`crate::Mbox::Iop`]) hold this behind an `Arc`
/// and take transient `&MailboxLayout` views.
pub struct MailboxRegion {
    shm: Box<dyn SharedMemoryBackend>,
    header: *mut RegionHeader,
    layout: *mut MailboxLayout,
}

// The mailbox words are atomics and the raw pointers never outlive `shm`.
unsafe impl Send for MailboxRegion {}
unsafe impl Sync for MailboxRegion {}

impl MailboxRegion {
    /// Initialize a fresh region over `shm`: writes the validation header
    /// and zeroes the entire mailbox (command idle, all data words 0).
    pub fn create(shm: Box<dyn SharedMemoryBackend>) -> io::Result<Self> {
        let (header, layout) = Self::carve(&*shm)?;

        unsafe {
            std::ptr::write(
                header,
                RegionHeader {
                    magic: REGION_MAGIC,
                    version: REGION_VERSION,
                    data_words: DATA_WORDS as u32,
                    reserved: 0,
                },
            );
            // Zero bits are a valid initial state for every atomic in the
            // layout; no references exist yet.
            std::ptr::write_bytes(layout as *mut u8, 0, size_of::<MailboxLayout>());
        }

        Ok(Self { shm, header, layout })
    }

    /// Attach to a region some other process already created. Verifies the
    /// magic number, version and compiled data-word count before handing
    /// out any view of the mailbox.
    pub fn attach(shm: Box<dyn SharedMemoryBackend>) -> io::Result<Self> {
        let (header, layout) = Self::carve(&*shm)?;

        unsafe {
            if (*header).magic != REGION_MAGIC {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Invalid magic number - mailbox region not initialized",
                ));
            }
            if (*header).version != REGION_VERSION {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Mailbox region version mismatch: ours {}, theirs {}",
                        REGION_VERSION,
                        (*header).version
                    ),
                ));
            }
            if (*header).data_words != DATA_WORDS as u32 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Mailbox data size mismatch: ours {} words, theirs {}",
                        DATA_WORDS,
                        (*header).data_words
                    ),
                ));
            }
        }

        Ok(Self { shm, header, layout })
    }

    fn carve(shm: &dyn SharedMemoryBackend) -> io::Result<(*mut RegionHeader, *mut MailboxLayout)> {
        let needed = region_size();
        if shm.size() < needed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "backing memory too small for a mailbox region: have {}, need {}",
                    shm.size(),
                    needed
                ),
            ));
        }

        let base = shm.as_ptr();
        if (base as usize) % align_of::<RegionHeader>() != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "mailbox region backing memory not properly aligned",
            ));
        }

        let header = base as *mut RegionHeader;
        let layout = unsafe { base.add(size_of::<RegionHeader>()) } as *mut MailboxLayout;
        Ok((header, layout))
    }

    /// The mailbox itself.
    pub fn layout(&self) -> &MailboxLayout {
        unsafe { &*self.layout }
    }

    /// Base pointer of the whole region (header included).
    pub fn base_ptr(&self) -> *const u8 {
        self.shm.as_ptr()
    }

    /// Size of the backing memory in bytes.
    pub fn size(&self) -> usize {
        self.shm.size()
    }

    pub fn header(&self) -> &RegionHeader {
        unsafe { &*self.header }
    }
}
