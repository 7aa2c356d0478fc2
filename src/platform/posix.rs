// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX shared memory mapping: create / attach / detach / remove.
//
// Unlike a general-purpose shm wrapper, this mapping carries no trailing
// reference counter and does not unlink itself when the last handle drops.
// Ownership of `remove` belongs entirely to the channel's daemon handle
// (see `crate::daemon`) — a shell that happens to be the last to detach must
// never race the daemon to unlink the segment.

use std::ffi::CString;
use std::io;
use std::ptr;

use crate::shm_name::make_shm_name;

/// A mapped POSIX shared memory segment of exactly `size` bytes.
pub struct PlatformMapping {
    mem: *mut u8,
    size: usize,
}

// Safety: the mapped region is shared across processes by design; the
// pointer itself carries no thread-affinity.
unsafe impl Send for PlatformMapping {}
unsafe impl Sync for PlatformMapping {}

impl PlatformMapping {
    /// Create a new mapping of exactly `size` bytes, zero-filled.
    ///
    /// If an object of the same name already exists it is unlinked first so
    /// the new mapping starts from a clean layout, then creation is retried
    /// once.
    pub fn create(name: &str, size: usize) -> io::Result<Self> {
        let posix_name = make_shm_name(name);
        let c_name = to_cstring(&posix_name)?;
        let perms: libc::mode_t = 0o666;

        let mut fd = unsafe {
            libc::shm_open(c_name.as_ptr(), libc::O_RDWR | libc::O_CREAT | libc::O_EXCL, perms as libc::c_uint)
        };
        if fd == -1 && io::Error::last_os_error().raw_os_error() == Some(libc::EEXIST) {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
            fd = unsafe {
                libc::shm_open(
                    c_name.as_ptr(),
                    libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
                    perms as libc::c_uint,
                )
            };
        }
        if fd == -1 {
            return Err(io::Error::last_os_error());
        }
        unsafe { libc::fchmod(fd, perms) };

        if unsafe { libc::ftruncate(fd, size as libc::off_t) } != 0 {
            let err = io::Error::last_os_error();
            unsafe {
                libc::close(fd);
                libc::shm_unlink(c_name.as_ptr());
            }
            return Err(err);
        }

        let mapping = Self::map(fd, size)?;
        // ftruncate on a freshly created object is zero-filled by POSIX, but
        // zero explicitly so the invariant does not rely on that guarantee.
        unsafe { ptr::write_bytes(mapping.mem, 0, mapping.size) };
        Ok(mapping)
    }

    /// Attach to an existing mapping. Fails if no object of that name exists,
    /// or if its size is smaller than `min_size` (the fixed channel header).
    pub fn attach(name: &str, min_size: usize) -> io::Result<Self> {
        let posix_name = make_shm_name(name);
        let c_name = to_cstring(&posix_name)?;

        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0) };
        if fd == -1 {
            return Err(io::Error::last_os_error());
        }

        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        if unsafe { libc::fstat(fd, &mut stat) } != 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }
        let size = stat.st_size as usize;
        if size < min_size {
            unsafe { libc::close(fd) };
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("channel '{name}' is {size} bytes, smaller than the fixed header"),
            ));
        }

        Self::map(fd, size)
    }

    fn map(fd: i32, size: usize) -> io::Result<Self> {
        let mem = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        unsafe { libc::close(fd) };
        if mem == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { mem: mem as *mut u8, size })
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.mem
    }

    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.mem
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Unlink a named segment without needing an open handle. Mapped
    /// references in other processes remain valid until they detach.
    pub fn remove(name: &str) {
        let posix_name = make_shm_name(name);
        if let Ok(c_name) = CString::new(posix_name.as_bytes()) {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
        }
    }
}

impl Drop for PlatformMapping {
    /// Unmaps only. Removing the backing object is the daemon's
    /// responsibility (`PlatformMapping::remove`), never automatic here.
    fn drop(&mut self) {
        if !self.mem.is_null() {
            unsafe { libc::munmap(self.mem as *mut libc::c_void, self.size) };
        }
    }
}

fn to_cstring(s: &str) -> io::Result<CString> {
    CString::new(s.as_bytes()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
