//! FramebufferUpdate message framing (server → client).
//!
//! ## Wire format
//!
//! **Update header** (4 bytes):
//! ```text
//! message_type: u8   (0)
//! padding:      u8
//! rectangles:   u16  (big-endian)
//! ```
//!
//! **Rectangle header** (12 bytes), followed by the pixel payload:
//! ```text
//! x:        u16  (big-endian)
//! y:        u16  (big-endian)
//! width:    u16  (big-endian)
//! height:   u16  (big-endian)
//! encoding: i32  (big-endian)
//! ```
//!
//! This server only ever sends a single full-screen rectangle in RAW
//! encoding, so the payload is always `width × height × 4` bytes.

use crate::error::VncError;
use crate::framebuffer::ScreenGeometry;
use crate::protocol::ENCODING_RAW;

/// Server-to-client FramebufferUpdate message type byte.
pub const FRAMEBUFFER_UPDATE: u8 = 0;

// ── UpdateHeader ─────────────────────────────────────────────────

/// Header of a FramebufferUpdate message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateHeader {
    pub rectangle_count: u16,
}

impl UpdateHeader {
    /// Encoded size on the wire.
    pub const SIZE: usize = 4;

    /// Serialize to bytes.
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = FRAMEBUFFER_UPDATE;
        // buf[1] is padding.
        buf[2..4].copy_from_slice(&self.rectangle_count.to_be_bytes());
        buf
    }

    /// Deserialize from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, VncError> {
        if data.len() < Self::SIZE {
            return Err(VncError::Truncated {
                what: "UpdateHeader",
                len: data.len(),
            });
        }
        Ok(Self {
            rectangle_count: u16::from_be_bytes([data[2], data[3]]),
        })
    }
}

// ── RectangleHeader ──────────────────────────────────────────────

/// Per-rectangle descriptor preceding the pixel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectangleHeader {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub encoding: i32,
}

impl RectangleHeader {
    /// Encoded size on the wire.
    pub const SIZE: usize = 12;

    /// A RAW rectangle covering the whole screen.
    pub fn full_screen(geometry: ScreenGeometry) -> Self {
        Self {
            x: 0,
            y: 0,
            width: geometry.width,
            height: geometry.height,
            encoding: ENCODING_RAW,
        }
    }

    /// Serialize to bytes.
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..2].copy_from_slice(&self.x.to_be_bytes());
        buf[2..4].copy_from_slice(&self.y.to_be_bytes());
        buf[4..6].copy_from_slice(&self.width.to_be_bytes());
        buf[6..8].copy_from_slice(&self.height.to_be_bytes());
        buf[8..12].copy_from_slice(&self.encoding.to_be_bytes());
        buf
    }

    /// Deserialize from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, VncError> {
        if data.len() < Self::SIZE {
            return Err(VncError::Truncated {
                what: "RectangleHeader",
                len: data.len(),
            });
        }
        Ok(Self {
            x: u16::from_be_bytes([data[0], data[1]]),
            y: u16::from_be_bytes([data[2], data[3]]),
            width: u16::from_be_bytes([data[4], data[5]]),
            height: u16::from_be_bytes([data[6], data[7]]),
            encoding: i32::from_be_bytes([data[8], data[9], data[10], data[11]]),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_header_exact_bytes() {
        let hdr = UpdateHeader { rectangle_count: 1 };
        assert_eq!(hdr.encode(), [0, 0, 0, 1]);
    }

    #[test]
    fn rectangle_header_full_screen() {
        let geometry = ScreenGeometry {
            width: 480,
            height: 544,
            bits_per_pixel: 32,
            stride: 1920,
        };
        let rect = RectangleHeader::full_screen(geometry);
        let encoded = rect.encode();

        assert_eq!(&encoded[0..2], &[0, 0]); // x
        assert_eq!(&encoded[2..4], &[0, 0]); // y
        assert_eq!(&encoded[4..6], &480u16.to_be_bytes());
        assert_eq!(&encoded[6..8], &544u16.to_be_bytes());
        assert_eq!(&encoded[8..12], &0i32.to_be_bytes()); // RAW

        let decoded = RectangleHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, rect);
    }

    #[test]
    fn decode_too_short() {
        assert!(UpdateHeader::decode(&[0u8; 3]).is_err());
        assert!(RectangleHeader::decode(&[0u8; 11]).is_err());
    }
}
