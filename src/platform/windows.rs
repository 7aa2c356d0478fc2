// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Windows shared memory mapping (file-mapping-backed), mirroring the POSIX
// create/attach/detach/remove contract in `platform::posix`.

use std::io;
use std::ptr;

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

pub struct PlatformMapping {
    handle: windows_sys::Win32::Foundation::HANDLE,
    mem: *mut u8,
    size: usize,
}

unsafe impl Send for PlatformMapping {}
unsafe impl Sync for PlatformMapping {}

impl PlatformMapping {
    pub fn create(name: &str, size: usize) -> io::Result<Self> {
        use windows_sys::Win32::Foundation::*;
        use windows_sys::Win32::System::Memory::*;

        let wide_name = to_wide(name);
        let handle = unsafe {
            CreateFileMappingW(
                INVALID_HANDLE_VALUE,
                ptr::null(),
                PAGE_READWRITE | SEC_COMMIT,
                0,
                size as u32,
                wide_name.as_ptr(),
            )
        };
        let existed = unsafe { GetLastError() } == ERROR_ALREADY_EXISTS;
        if handle == 0 {
            return Err(io::Error::last_os_error());
        }
        if existed {
            // Unlike `platform::posix::create`, which unlinks a stale object
            // by name and retries so an unclean shutdown doesn't block the
            // next `create`, Windows named section objects have no
            // unlink-by-name operation — they live until every handle to
            // them closes. There is nothing to remove here, so this returns
            // `AlreadyExists` instead of silently reusing (and NOT
            // re-zeroing) a section some other process may still be mapping.
            // A daemon that needs to recover from an unclean shutdown on
            // Windows must arrange for the stale handle to close first.
            unsafe { CloseHandle(handle) };
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("channel '{name}' already exists"),
            ));
        }

        let mem = unsafe { MapViewOfFile(handle, FILE_MAP_ALL_ACCESS, 0, 0, size) };
        if mem.is_null() {
            let err = io::Error::last_os_error();
            unsafe { CloseHandle(handle) };
            return Err(err);
        }
        unsafe { ptr::write_bytes(mem as *mut u8, 0, size) };

        Ok(Self { handle, mem: mem as *mut u8, size })
    }

    pub fn attach(name: &str, min_size: usize) -> io::Result<Self> {
        use windows_sys::Win32::Foundation::*;
        use windows_sys::Win32::System::Memory::*;

        let wide_name = to_wide(name);
        let handle = unsafe { OpenFileMappingW(FILE_MAP_ALL_ACCESS, FALSE, wide_name.as_ptr()) };
        if handle == 0 {
            return Err(io::Error::last_os_error());
        }

        let mem = unsafe { MapViewOfFile(handle, FILE_MAP_ALL_ACCESS, 0, 0, 0) };
        if mem.is_null() {
            let err = io::Error::last_os_error();
            unsafe { CloseHandle(handle) };
            return Err(err);
        }

        let mut info: MEMORY_BASIC_INFORMATION = unsafe { std::mem::zeroed() };
        let ret = unsafe {
            VirtualQuery(mem as *const _, &mut info, std::mem::size_of::<MEMORY_BASIC_INFORMATION>())
        };
        if ret == 0 {
            let err = io::Error::last_os_error();
            unsafe {
                UnmapViewOfFile(mem);
                CloseHandle(handle);
            }
            return Err(err);
        }
        let size = info.RegionSize;
        if size < min_size {
            unsafe {
                UnmapViewOfFile(mem);
                CloseHandle(handle);
            }
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("channel '{name}' is {size} bytes, smaller than the fixed header"),
            ));
        }

        Ok(Self { handle, mem: mem as *mut u8, size })
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

    /// No-op on Windows: file-mapping objects are reference-counted by the
    /// kernel and disappear once every handle closes, so there is nothing to
    /// unlink by name the way POSIX `shm_unlink` requires.
    pub fn remove(_name: &str) {}
}

impl Drop for PlatformMapping {
    fn drop(&mut self) {
        use windows_sys::Win32::Foundation::CloseHandle;
        use windows_sys::Win32::System::Memory::UnmapViewOfFile;
        if !self.mem.is_null() {
            unsafe { UnmapViewOfFile(self.mem as *const _) };
        }
        if self.handle != 0 {
            unsafe { CloseHandle(self.handle) };
        }
    }
}
