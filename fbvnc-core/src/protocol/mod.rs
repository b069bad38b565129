//! The RFB 3.8 wire subset this server speaks.
//!
//! Fixed-size wire structures are explicit byte-layout encode/decode
//! routines, never memory-overlaid structs, so byte order and padding
//! do not depend on compiler layout rules.
//!
//! The subset: exact version string, security restricted to "None",
//! pixel format fixed at 32 bpp / 24-bit depth XRGB little-endian,
//! encoding restricted to RAW full-frame rectangles.

pub mod client;
pub mod pixel_format;
pub mod server_init;
pub mod update;

pub use client::ClientMessage;
pub use pixel_format::PixelFormat;
pub use server_init::ServerInit;
pub use update::{RectangleHeader, UpdateHeader};

/// Exact protocol version string, offered by the server and echoed by
/// the client. The client's echo is accepted unconditionally — this
/// server performs no version negotiation and never downgrades.
pub const PROTOCOL_VERSION: &[u8; 12] = b"RFB 003.008\n";

/// The "no authentication" security type. The only type ever offered.
pub const SECURITY_TYPE_NONE: u8 = 1;

/// SecurityResult status word for success. The only result this
/// server can send: once the handshake reaches the result step, the
/// sole offered type has already been accepted.
pub const SECURITY_RESULT_OK: u32 = 0;

/// RAW (uncompressed full-pixel) rectangle encoding identifier.
pub const ENCODING_RAW: i32 = 0;

/// Desktop name advertised in ServerInit.
pub const SERVER_NAME: &str = "fbvnc framebuffer (RAW)";
