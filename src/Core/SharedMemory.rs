// Shared memory backend abstraction for the mailbox region.
// Uses /dev/shm + mmap when host and coprocessor are separate processes,
// and a plain aligned heap allocation for in-process simulation and tests.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt::Debug;
use std::io;
use std::ptr::NonNull;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::fd::{AsRawFd, IntoRawFd};
#[cfg(target_os = "linux")]
use std::os::unix::fs::OpenOptionsExt;

/// Backing storage for a mailbox region.
///
/// The mailbox core only needs a stable base pointer and a size; whether
/// that memory is a mapped /dev/shm file or process-local heap is invisible
/// above this trait.
pub trait SharedMemoryBackend: Send + Sync + Debug {
    /// Base pointer of the region.
    fn as_ptr(&self) -> *mut u8;

    /// Size of the region in bytes.
    fn size(&self) -> usize;

    /// The underlying OS handle, if any.
    fn raw_handle(&self) -> RawHandle;
}

/// Platform-specific handle type.
#[derive(Debug, Clone, Copy)]
pub enum RawHandle {
    /// Unix file descriptor (Linux).
    Fd(i32),
    /// Process-local memory with no OS handle.
    Anonymous,
}

/// Required base alignment for a mailbox region. The layout structs are
/// `align(128)`, so anything backing them must be too.
pub const REGION_ALIGN: usize = 128;

/// Create a new named shared memory region of `size` bytes, zero-filled,
/// visible to other processes under `/dev/shm/<name>`.
#[cfg(target_os = "linux")]
pub fn create_shared_memory(size: usize, name: &str) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(LinuxSharedMemory::create(size, name)?))
}

/// Attach to an existing named shared memory region. Fails if the region
/// does not exist or is smaller than `size`.
#[cfg(target_os = "linux")]
pub fn attach_shared_memory(name: &str, size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(LinuxSharedMemory::attach(name, size)?))
}

#[cfg(not(target_os = "linux"))]
pub fn create_shared_memory(_size: usize, _name: &str) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "cross-process mailbox regions are only supported on Linux",
    ))
}

#[cfg(not(target_os = "linux"))]
pub fn attach_shared_memory(_name: &str, _size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "cross-process mailbox regions are only supported on Linux",
    ))
}

#[cfg(target_os = "linux")]
#[derive(Debug)]
pub struct LinuxSharedMemory {
    ptr: NonNull<u8>,
    size: usize,
    fd: i32,
}

#[cfg(target_os = "linux")]
unsafe impl Send for LinuxSharedMemory {}
#[cfg(target_os = "linux")]
unsafe impl Sync for LinuxSharedMemory {}

#[cfg(target_os = "linux")]
impl LinuxSharedMemory {
    /// Create (or truncate) a region file in /dev/shm and map it.
    pub fn create(size: usize, name: &str) -> io::Result<Self> {
        let path = format!("/dev/shm/{}", name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&path)
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("Failed to create mailbox region file at {}: {}", path, e),
                )
            })?;

        if unsafe { libc::ftruncate(file.as_raw_fd(), size as i64) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let fd = file.into_raw_fd();
        Self::map(fd, size)
    }

    /// Open and map an existing region file from /dev/shm.
    pub fn attach(name: &str, expected_size: usize) -> io::Result<Self> {
        let path = format!("/dev/shm/{}", name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Failed to open mailbox region at {}: {}", path, e),
                )
            })?;

        let file_size = file.metadata()?.len() as usize;
        if file_size < expected_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Mailbox region too small: expected at least {} bytes, got {}",
                    expected_size, file_size
                ),
            ));
        }

        let fd = file.into_raw_fd();
        Self::map(fd, file_size)
    }

    fn map(fd: i32, size: usize) -> io::Result<Self> {
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        // mmap returns page-aligned memory, which satisfies the layout
        // alignment; keep the check anyway so a misconfigured platform
        // fails loudly instead of faulting later.
        if (ptr as usize) % REGION_ALIGN != 0 {
            unsafe {
                libc::munmap(ptr, size);
                libc::close(fd);
            }
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("mapped region not {}-byte aligned", REGION_ALIGN),
            ));
        }

        log::debug!("mapped mailbox region: {} bytes at {:p}", size, ptr);

        // null/MAP_FAILED handled above
        let ptr = NonNull::new(ptr as *mut u8).unwrap();
        Ok(Self { ptr, size, fd })
    }
}

#[cfg(target_os = "linux")]
impl Drop for LinuxSharedMemory {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size);
            libc::close(self.fd);
        }
    }
}

#[cfg(target_os = "linux")]
impl SharedMemoryBackend for LinuxSharedMemory {
    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn raw_handle(&self) -> RawHandle {
        RawHandle::Fd(self.fd)
    }
}

/// Process-local backing for a mailbox region. Used when the host and the
/// coprocessor loop live in the same process (simulation, tests).
#[derive(Debug)]
pub struct HeapRegion {
    ptr: NonNull<u8>,
    layout: Layout,
}

unsafe impl Send for HeapRegion {}
unsafe impl Sync for HeapRegion {}

impl HeapRegion {
    pub fn new(size: usize) -> io::Result<Self> {
        let layout = Layout::from_size_align(size, REGION_ALIGN).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("bad region layout for {} bytes: {}", size, e),
            )
        })?;
        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("failed to allocate {} byte mailbox region", size),
            )
        })?;
        Ok(Self { ptr, layout })
    }
}

impl Drop for HeapRegion {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl SharedMemoryBackend for HeapRegion {
    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.layout.size()
    }

    fn raw_handle(&self) -> RawHandle {
        RawHandle::Anonymous
    }
}
