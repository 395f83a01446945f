use crate::Mbox::MailboxBuilder;
use crate::Mbox::Host;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;
use std::time::Duration;

// Error codes
const IOP_SUCCESS: i32 = 0;
const IOP_ERROR_NULL_POINTER: i32 = -1;
const IOP_ERROR_INVALID_ARG: i32 = -2;
const IOP_ERROR_BUSY: i32 = -3;
const IOP_ERROR_TIMEOUT: i32 = -4;
const IOP_ERROR_INTERNAL: i32 = -5;

/// Handle to a host endpoint (opaque pointer)
pub struct HostHandle {
    inner: Host,
}

/// Attach to a coprocessor's mailbox region.
///
/// # Arguments
/// * `name` - /dev/shm region name; NULL for the default.
///
/// # Returns
/// * Pointer to `HostHandle`, or NULL on failure.
#[no_mangle]
pub extern "C" fn iop_host_open(name: *const c_char) -> *mut HostHandle {
    let builder = if name.is_null() {
        MailboxBuilder::new()
    } else {
        let name = match unsafe { CStr::from_ptr(name) }.to_str() {
            Ok(s) => s,
            Err(_) => {
                eprintln!("FFI Error: region name is not valid UTF-8");
                return ptr::null_mut();
            }
        };
        MailboxBuilder::new().with_name(name)
    };

    match builder.build_host() {
        Ok(host) => Box::into_raw(Box::new(HostHandle { inner: host })),
        Err(e) => {
            eprintln!("FFI Error: Failed to attach mailbox: {}", e);
            ptr::null_mut()
        }
    }
}

/// Write one parameter word.
#[no_mangle]
pub extern "C" fn iop_host_write_param(handle: *mut HostHandle, slot: u32, value: u32) -> i32 {
    if handle.is_null() {
        return IOP_ERROR_NULL_POINTER;
    }
    let host = unsafe { &(*handle).inner };
    match host.write_param(slot as usize, value) {
        Ok(()) => IOP_SUCCESS,
        Err(_) => IOP_ERROR_INVALID_ARG,
    }
}

/// Issue a command. Returns IOP_ERROR_BUSY if one is already outstanding.
#[no_mangle]
pub extern "C" fn iop_host_issue(handle: *mut HostHandle, opcode: u32) -> i32 {
    if handle.is_null() {
        return IOP_ERROR_NULL_POINTER;
    }
    let host = unsafe { &(*handle).inner };
    match host.issue(opcode) {
        Ok(()) => IOP_SUCCESS,
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => IOP_ERROR_BUSY,
        Err(_) => IOP_ERROR_INTERNAL,
    }
}

/// Wait for the outstanding command to complete.
///
/// # Arguments
/// * `timeout_ms` - Maximum wait; 0 waits forever (firmware never gives up,
///   C callers usually should).
#[no_mangle]
pub extern "C" fn iop_host_wait(handle: *mut HostHandle, timeout_ms: u32) -> i32 {
    if handle.is_null() {
        return IOP_ERROR_NULL_POINTER;
    }
    let host = unsafe { &(*handle).inner };
    if timeout_ms == 0 {
        host.wait_complete();
        return IOP_SUCCESS;
    }
    match host.wait_complete_timeout(Duration::from_millis(timeout_ms as u64)) {
        Ok(()) => IOP_SUCCESS,
        Err(_) => IOP_ERROR_TIMEOUT,
    }
}

/// Read one result word into `out`.
#[no_mangle]
pub extern "C" fn iop_host_read_result(handle: *mut HostHandle, slot: u32, out: *mut u32) -> i32 {
    if handle.is_null() || out.is_null() {
        return IOP_ERROR_NULL_POINTER;
    }
    let host = unsafe { &(*handle).inner };
    match host.read_result(slot as usize) {
        Ok(value) => {
            unsafe { *out = value };
            IOP_SUCCESS
        }
        Err(_) => IOP_ERROR_INVALID_ARG,
    }
}

/// Status word of the last handled command (0 = success).
#[no_mangle]
pub extern "C" fn iop_host_status(handle: *mut HostHandle) -> i32 {
    if handle.is_null() {
        return IOP_ERROR_NULL_POINTER;
    }
    let host = unsafe { &(*handle).inner };
    host.status().as_word() as i32
}

/// Drain the log into `out_buf`.
///
/// # Arguments
/// * `capacity` - Session capacity in words, as configured by the caller.
/// * `out_buf` - Buffer of at least `*out_len` words.
/// * `out_len` - Input: buffer size in words. Output: words written.
///
/// # Returns
/// * 0 on success.
/// * IOP_ERROR_INVALID_ARG if the buffer is too small (required length is
///   left in `*out_len`).
#[no_mangle]
pub extern "C" fn iop_host_drain_log(
    handle: *mut HostHandle,
    capacity: u32,
    out_buf: *mut u32,
    out_len: *mut usize,
) -> i32 {
    if handle.is_null() || out_len.is_null() {
        return IOP_ERROR_NULL_POINTER;
    }
    let host = unsafe { &(*handle).inner };
    let max_len = unsafe { *out_len };

    let data = match host.drain_log_u32(capacity as usize) {
        Ok(data) => data,
        Err(_) => return IOP_ERROR_INTERNAL,
    };

    if data.len() > max_len {
        unsafe { *out_len = data.len() };
        return IOP_ERROR_INVALID_ARG; // Buffer too small
    }
    if !out_buf.is_null() {
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), out_buf, data.len());
            *out_len = data.len();
        }
    }
    IOP_SUCCESS
}

/// Free a host handle.
#[no_mangle]
pub extern "C" fn iop_host_free(handle: *mut HostHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle); // Dropped automatically
        }
    }
}
