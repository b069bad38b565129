//! Error types for the fbvnc server.
//!
//! All fallible operations return `Result<T, VncError>`. The enum does
//! not encode severity — the split between fatal and per-connection
//! errors is positional. Errors that escape service setup (device
//! open, geometry query, bind/listen) end the process; errors raised
//! inside a session terminate only that connection and the listener
//! resumes accepting.

use std::path::PathBuf;

use thiserror::Error;

/// The canonical error type for the fbvnc server.
#[derive(Debug, Error)]
pub enum VncError {
    // ── Device / setup errors ────────────────────────────────────
    /// The framebuffer device could not be opened.
    #[error("cannot open framebuffer device {path}: {source}")]
    DeviceOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A framebuffer geometry ioctl failed.
    #[error("framebuffer geometry query ({what}) failed: {source}")]
    GeometryQuery {
        what: &'static str,
        source: std::io::Error,
    },

    /// The device reports a bit depth other than 32.
    #[error("unsupported bit depth: {bits_per_pixel} bpp (only 32 bpp is supported)")]
    UnsupportedDepth { bits_per_pixel: u32 },

    /// The scanline stride is too small to hold one row of pixels.
    #[error("invalid stride: {stride} bytes per line (need at least {min})")]
    InvalidStride { stride: u32, min: u32 },

    /// A memory-backed frame did not match its declared geometry.
    #[error("frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    /// Mapping the device memory failed.
    #[error("framebuffer mmap failed: {0}")]
    Mapping(#[source] std::io::Error),

    /// Framebuffer devices only exist on Linux.
    #[error("framebuffer capture is only available on Linux")]
    Unsupported,

    // ── Session errors ───────────────────────────────────────────
    /// The TCP/IO layer reported an error, including a peer that
    /// closed mid-read or mid-write.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    /// The client chose a security type that was never offered.
    #[error("client chose unsupported security type {chosen:#x}")]
    SecurityTypeMismatch { chosen: u8 },

    /// The client sent a message type this server does not know.
    /// Treated as a protocol violation: the connection is dropped
    /// rather than risking desync on an unknown payload length.
    #[error("unknown client message type {0:#x}")]
    UnknownMessageType(u8),

    // ── Wire decode errors ───────────────────────────────────────
    /// A fixed-size wire structure was shorter than its layout.
    #[error("truncated {what}: {len} bytes")]
    Truncated { what: &'static str, len: usize },
}
