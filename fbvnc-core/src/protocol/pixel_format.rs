//! RFB pixel-format descriptor.
//!
//! ## Wire format (16 bytes)
//!
//! ```text
//! bits_per_pixel: u8
//! depth:          u8
//! big_endian:     u8   (0 or 1)
//! true_colour:    u8   (0 or 1)
//! red_max:        u16  (big-endian)
//! green_max:      u16  (big-endian)
//! blue_max:       u16  (big-endian)
//! red_shift:      u8
//! green_shift:    u8
//! blue_shift:     u8
//! padding:        [u8; 3]
//! ```

use crate::error::VncError;

/// The 16-byte pixel-format block sent in ServerInit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub depth: u8,
    pub big_endian: bool,
    pub true_colour: bool,
    pub red_max: u16,
    pub green_max: u16,
    pub blue_max: u16,
    pub red_shift: u8,
    pub green_shift: u8,
    pub blue_shift: u8,
}

impl PixelFormat {
    /// Encoded size on the wire.
    pub const SIZE: usize = 16;

    /// The one format this server advertises: 32 bpp, 24 meaningful
    /// colour bits, little-endian, true colour, 8 bits per channel
    /// with shifts R=16 G=8 B=0 — XRGB/ARGB in native little-endian
    /// order. A device with a different channel order will display
    /// swapped colors; known limitation, not corrected here.
    pub fn xrgb8888() -> Self {
        Self {
            bits_per_pixel: 32,
            depth: 24,
            big_endian: false,
            true_colour: true,
            red_max: 255,
            green_max: 255,
            blue_max: 255,
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
        }
    }

    /// Serialize to the 16-byte wire layout.
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.bits_per_pixel;
        buf[1] = self.depth;
        buf[2] = self.big_endian as u8;
        buf[3] = self.true_colour as u8;
        buf[4..6].copy_from_slice(&self.red_max.to_be_bytes());
        buf[6..8].copy_from_slice(&self.green_max.to_be_bytes());
        buf[8..10].copy_from_slice(&self.blue_max.to_be_bytes());
        buf[10] = self.red_shift;
        buf[11] = self.green_shift;
        buf[12] = self.blue_shift;
        // buf[13..16] is padding, already zero.
        buf
    }

    /// Deserialize from the wire layout.
    pub fn decode(data: &[u8]) -> Result<Self, VncError> {
        if data.len() < Self::SIZE {
            return Err(VncError::Truncated {
                what: "PixelFormat",
                len: data.len(),
            });
        }
        Ok(Self {
            bits_per_pixel: data[0],
            depth: data[1],
            big_endian: data[2] != 0,
            true_colour: data[3] != 0,
            red_max: u16::from_be_bytes([data[4], data[5]]),
            green_max: u16::from_be_bytes([data[6], data[7]]),
            blue_max: u16::from_be_bytes([data[8], data[9]]),
            red_shift: data[10],
            green_shift: data[11],
            blue_shift: data[12],
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xrgb8888_exact_bytes() {
        let encoded = PixelFormat::xrgb8888().encode();
        assert_eq!(
            encoded,
            [32, 24, 0, 1, 0, 255, 0, 255, 0, 255, 16, 8, 0, 0, 0, 0]
        );
    }

    #[test]
    fn roundtrip() {
        let pf = PixelFormat::xrgb8888();
        let decoded = PixelFormat::decode(&pf.encode()).unwrap();
        assert_eq!(decoded, pf);
    }

    #[test]
    fn decode_too_short() {
        let err = PixelFormat::decode(&[0u8; 15]).unwrap_err();
        assert!(matches!(err, VncError::Truncated { len: 15, .. }));
    }
}
