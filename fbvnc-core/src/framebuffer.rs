//! Read-only access to a raw framebuffer.
//!
//! [`Framebuffer::open`] opens the display device read-only, queries
//! its geometry through the framebuffer ioctls and establishes a
//! shared read-only mapping over `stride × height` bytes of device
//! memory. The mapping lives for the lifetime of the process and is
//! shared across every successive client session; nothing in this
//! process ever writes through it — the kernel is the sole writer,
//! and tearing across scanlines is an accepted limitation.
//!
//! The mapping covers `stride × height` bytes rather than
//! `width × height × 4` because scanlines may carry trailing padding.
//! Padding is mapped but never copied out by [`copy_scanline`].
//!
//! # Platform
//!
//! Device capture is **Linux-only**. On other platforms
//! [`Framebuffer::open`] fails at runtime; the memory-backed
//! [`Framebuffer::from_frame`] constructor works everywhere and is
//! what the tests use.
//!
//! [`copy_scanline`]: Framebuffer::copy_scanline

use std::path::Path;

use crate::error::VncError;

// ── ScreenGeometry ───────────────────────────────────────────────

/// Display geometry as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    /// Visible width in pixels.
    pub width: u16,
    /// Visible height in pixels.
    pub height: u16,
    /// Bits per pixel. Must be 32; anything else is a fatal
    /// configuration error at startup (no format conversion path).
    pub bits_per_pixel: u8,
    /// Byte distance between the starts of consecutive scanlines.
    /// May exceed `width × 4`; the excess is padding.
    pub stride: u32,
}

impl ScreenGeometry {
    /// Bytes per pixel at 32 bpp.
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Bytes of pixel data in one scanline (`width × 4`), excluding
    /// any stride padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * Self::BYTES_PER_PIXEL
    }

    /// Total mapped bytes: `stride × height`, padding included.
    pub fn frame_bytes(&self) -> usize {
        self.stride as usize * self.height as usize
    }

    /// Bytes of pixel data in one full frame as transmitted on the
    /// wire (`width × height × 4`), padding excluded.
    pub fn payload_bytes(&self) -> usize {
        self.row_bytes() * self.height as usize
    }

    /// Check the startup invariants: 32 bpp and a stride wide enough
    /// to hold one row of pixels.
    pub fn validate(&self) -> Result<(), VncError> {
        if self.bits_per_pixel != 32 {
            return Err(VncError::UnsupportedDepth {
                bits_per_pixel: u32::from(self.bits_per_pixel),
            });
        }
        let min = self.row_bytes() as u32;
        if self.stride < min {
            return Err(VncError::InvalidStride {
                stride: self.stride,
                min,
            });
        }
        Ok(())
    }
}

// ── Framebuffer ──────────────────────────────────────────────────

/// A read-only view over a framebuffer's backing memory.
///
/// Either a shared mapping of a real device or a plain in-memory
/// buffer for synthetic sources. The view is never mutated and never
/// unmapped before process shutdown.
#[derive(Debug)]
pub struct Framebuffer {
    geometry: ScreenGeometry,
    backing: Backing,
}

#[derive(Debug)]
enum Backing {
    #[cfg(target_os = "linux")]
    Mapped(memmap2::Mmap),
    Memory(Vec<u8>),
}

impl Framebuffer {
    /// Open a framebuffer device read-only and map its memory.
    ///
    /// Fails if the device cannot be opened, the geometry ioctls
    /// fail, the bit depth is not 32, the stride cannot hold a row,
    /// or the mapping cannot be established. Every one of these is a
    /// startup-only failure with no retry: a device that is busy or
    /// absent is a fatal misconfiguration for this tool.
    #[cfg(target_os = "linux")]
    pub fn open(path: &Path) -> Result<Self, VncError> {
        let file = std::fs::File::open(path).map_err(|source| VncError::DeviceOpen {
            path: path.to_owned(),
            source,
        })?;

        let geometry = sys::query_geometry(&file)?;
        geometry.validate()?;

        let map = unsafe {
            memmap2::MmapOptions::new()
                .len(geometry.frame_bytes())
                .map(&file)
        }
        .map_err(VncError::Mapping)?;

        Ok(Self {
            geometry,
            backing: Backing::Mapped(map),
        })
    }

    /// Device capture is only available on Linux.
    #[cfg(not(target_os = "linux"))]
    pub fn open(_path: &Path) -> Result<Self, VncError> {
        Err(VncError::Unsupported)
    }

    /// Wrap an in-memory frame with the given geometry.
    ///
    /// The buffer must be exactly `stride × height` bytes, laid out
    /// like device memory (padding included). Used for synthetic
    /// sources and tests.
    pub fn from_frame(geometry: ScreenGeometry, frame: Vec<u8>) -> Result<Self, VncError> {
        geometry.validate()?;
        let expected = geometry.frame_bytes();
        if frame.len() != expected {
            return Err(VncError::FrameSizeMismatch {
                expected,
                actual: frame.len(),
            });
        }
        Ok(Self {
            geometry,
            backing: Backing::Memory(frame),
        })
    }

    /// The device geometry queried at startup.
    pub fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    /// The full backing region, `stride × height` bytes.
    pub fn bytes(&self) -> &[u8] {
        match &self.backing {
            #[cfg(target_os = "linux")]
            Backing::Mapped(map) => &map[..],
            Backing::Memory(frame) => frame.as_slice(),
        }
    }

    /// Copy the pixel bytes of scanline `row` into `buf`.
    ///
    /// Reads exactly `buf.len()` bytes starting at `row × stride`;
    /// callers pass a `width × 4` buffer so stride padding is never
    /// copied.
    pub fn copy_scanline(&self, row: usize, buf: &mut [u8]) {
        debug_assert!(row < self.geometry.height as usize);
        debug_assert!(buf.len() <= self.geometry.stride as usize);
        let start = row * self.geometry.stride as usize;
        buf.copy_from_slice(&self.bytes()[start..start + buf.len()]);
    }
}

// ── Linux framebuffer ioctls ─────────────────────────────────────

/// Minimal bindings for the `linux/fb.h` geometry ioctls. All unsafe
/// FFI is confined to this module.
#[cfg(target_os = "linux")]
mod sys {
    use std::fs::File;
    use std::os::fd::AsRawFd;

    use super::ScreenGeometry;
    use crate::error::VncError;

    const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;
    const FBIOGET_FSCREENINFO: libc::c_ulong = 0x4602;

    #[repr(C)]
    #[derive(Clone, Copy, Default)]
    struct FbBitfield {
        offset: u32,
        length: u32,
        msb_right: u32,
    }

    /// `struct fb_var_screeninfo` — variable parameters (resolution,
    /// bit depth).
    #[repr(C)]
    #[derive(Clone, Copy, Default)]
    struct FbVarScreeninfo {
        xres: u32,
        yres: u32,
        xres_virtual: u32,
        yres_virtual: u32,
        xoffset: u32,
        yoffset: u32,
        bits_per_pixel: u32,
        grayscale: u32,
        red: FbBitfield,
        green: FbBitfield,
        blue: FbBitfield,
        transp: FbBitfield,
        nonstd: u32,
        activate: u32,
        height: u32,
        width: u32,
        accel_flags: u32,
        pixclock: u32,
        left_margin: u32,
        right_margin: u32,
        upper_margin: u32,
        lower_margin: u32,
        hsync_len: u32,
        vsync_len: u32,
        sync: u32,
        vmode: u32,
        rotate: u32,
        colorspace: u32,
        reserved: [u32; 4],
    }

    /// `struct fb_fix_screeninfo` — fixed parameters (line length,
    /// memory layout).
    #[repr(C)]
    #[derive(Clone, Copy, Default)]
    struct FbFixScreeninfo {
        id: [u8; 16],
        smem_start: libc::c_ulong,
        smem_len: u32,
        fb_type: u32,
        type_aux: u32,
        visual: u32,
        xpanstep: u16,
        ypanstep: u16,
        ywrapstep: u16,
        line_length: u32,
        mmio_start: libc::c_ulong,
        mmio_len: u32,
        accel: u32,
        capabilities: u16,
        reserved: [u16; 2],
    }

    /// Query visible resolution, bit depth and line length from an
    /// open framebuffer device.
    pub(super) fn query_geometry(file: &File) -> Result<ScreenGeometry, VncError> {
        let fd = file.as_raw_fd();

        let mut var = FbVarScreeninfo::default();
        let rc = unsafe { libc::ioctl(fd, FBIOGET_VSCREENINFO, &mut var as *mut _) };
        if rc != 0 {
            return Err(VncError::GeometryQuery {
                what: "FBIOGET_VSCREENINFO",
                source: std::io::Error::last_os_error(),
            });
        }

        let mut fix = FbFixScreeninfo::default();
        let rc = unsafe { libc::ioctl(fd, FBIOGET_FSCREENINFO, &mut fix as *mut _) };
        if rc != 0 {
            return Err(VncError::GeometryQuery {
                what: "FBIOGET_FSCREENINFO",
                source: std::io::Error::last_os_error(),
            });
        }

        if var.bits_per_pixel != 32 {
            return Err(VncError::UnsupportedDepth {
                bits_per_pixel: var.bits_per_pixel,
            });
        }

        Ok(ScreenGeometry {
            width: var.xres as u16,
            height: var.yres as u16,
            bits_per_pixel: 32,
            stride: fix.line_length,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(width: u16, height: u16, stride: u32) -> ScreenGeometry {
        ScreenGeometry {
            width,
            height,
            bits_per_pixel: 32,
            stride,
        }
    }

    #[test]
    fn validate_accepts_exact_stride() {
        assert!(geometry(480, 544, 1920).validate().is_ok());
    }

    #[test]
    fn validate_accepts_padded_stride() {
        assert!(geometry(480, 544, 2048).validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_stride() {
        let err = geometry(480, 544, 1024).validate().unwrap_err();
        assert!(matches!(
            err,
            VncError::InvalidStride { stride: 1024, min: 1920 }
        ));
    }

    #[test]
    fn validate_rejects_non_32bpp() {
        let g = ScreenGeometry {
            width: 480,
            height: 544,
            bits_per_pixel: 16,
            stride: 960,
        };
        assert!(matches!(
            g.validate().unwrap_err(),
            VncError::UnsupportedDepth { bits_per_pixel: 16 }
        ));
    }

    #[test]
    fn from_frame_rejects_wrong_length() {
        let g = geometry(4, 2, 16);
        let err = Framebuffer::from_frame(g, vec![0u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            VncError::FrameSizeMismatch { expected: 32, actual: 31 }
        ));
    }

    #[test]
    fn copy_scanline_skips_stride_padding() {
        // 2×2 frame, 8 bytes of pixels per row plus 4 bytes padding.
        let g = geometry(2, 2, 12);
        let mut frame = vec![0xEEu8; g.frame_bytes()];
        for row in 0..2 {
            for i in 0..8 {
                frame[row * 12 + i] = (row * 8 + i) as u8;
            }
        }
        let fb = Framebuffer::from_frame(g, frame).unwrap();

        let mut line = vec![0u8; g.row_bytes()];
        fb.copy_scanline(0, &mut line);
        assert_eq!(line, [0, 1, 2, 3, 4, 5, 6, 7]);
        fb.copy_scanline(1, &mut line);
        assert_eq!(line, [8, 9, 10, 11, 12, 13, 14, 15]);
        assert!(!line.contains(&0xEE));
    }
}
