//! Linux fbdev system interface
//!
//! Thin wrappers over the three kernel calls a framebuffer needs: `open`,
//! the `FBIOGET_VSCREENINFO` ioctl, and a shared `mmap` of device memory.
//!
//! [`Mapping`] owns the mapped region. It is released exactly once, either by
//! [`Mapping::unmap`] or when dropped, and the file descriptor it was created
//! from may be closed as soon as it exists.

// Safety: ioctl/mmap/munmap have no safe std equivalent. Each unsafe block
// is confined to a single call with its preconditions stated alongside.
#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::ptr::NonNull;

use log::warn;

use crate::error::Error;
use crate::format::ChannelField;

/// `FBIOGET_VSCREENINFO` from `<linux/fb.h>`
const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;

/// `struct fb_bitfield`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    #[allow(dead_code)]
    pub msb_right: u32,
}

impl FbBitfield {
    pub fn field(self) -> ChannelField {
        ChannelField::new(self.offset, self.length)
    }
}

/// `struct fb_var_screeninfo`
///
/// Kernel ABI, declared in full so the ioctl writes into a correctly sized
/// struct. Only `xres_virtual`, `yres_virtual`, `bits_per_pixel` and the
/// `red`/`green`/`blue` bitfields are read; the rest exist for layout.
#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct VarScreenInfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// Open a device node for read/write
pub(crate) fn open_device(path: &Path) -> Result<File, Error> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| Error::DeviceUnavailable { source })
}

/// Query the current video mode
pub(crate) fn query_mode(file: &File) -> Result<VarScreenInfo, Error> {
    let mut info = VarScreenInfo::default();
    // SAFETY: `info` is a properly sized, writable `fb_var_screeninfo` and the
    // descriptor stays open for the duration of the call.
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), FBIOGET_VSCREENINFO as _, &raw mut info) };
    if rc < 0 {
        return Err(Error::QueryFailed {
            source: io::Error::last_os_error(),
        });
    }
    Ok(info)
}

/// Shared read/write mapping of device memory
///
/// Dereferences to the mapped bytes through [`AsRef`]/[`AsMut`]. Writes go
/// straight to the device.
#[derive(Debug)]
pub struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the mapping is exclusively owned; moving it to another thread moves
// the only handle to the region.
unsafe impl Send for Mapping {}

impl Mapping {
    /// Map `len` bytes of `file` from offset 0, shared with the device
    ///
    /// `len` must be non-zero.
    pub(crate) fn new(file: &File, len: usize) -> Result<Self, Error> {
        // SAFETY: a null hint lets the kernel choose the address; the result
        // is checked against MAP_FAILED before use.
        let addr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(Error::MappingFailed {
                len,
                source: io::Error::last_os_error(),
            });
        }
        let ptr = NonNull::new(addr.cast::<u8>()).ok_or_else(|| Error::MappingFailed {
            len,
            source: io::Error::from(io::ErrorKind::AddrNotAvailable),
        })?;
        Ok(Self { ptr, len })
    }

    /// Length of the mapping in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the mapping is empty (never true for a live mapping)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Release the mapping, reporting failure instead of logging it
    pub fn unmap(self) -> io::Result<()> {
        let this = core::mem::ManuallyDrop::new(self);
        this.release()
    }

    fn release(&self) -> io::Result<()> {
        // SAFETY: `ptr`/`len` describe a live mapping created by `new`, and
        // callers guarantee this runs at most once.
        let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl AsRef<[u8]> for Mapping {
    fn as_ref(&self) -> &[u8] {
        // SAFETY: the region is `len` readable bytes for as long as `self` lives.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl AsMut<[u8]> for Mapping {
    fn as_mut(&mut self) -> &mut [u8] {
        // SAFETY: the region is `len` writable bytes, and `&mut self` rules out
        // any other slice over it.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("munmap of {} bytes failed: {err}", self.len);
        }
    }
}
