//! ServerInit — the final handshake message.
//!
//! ## Wire format
//!
//! ```text
//! width:       u16  (big-endian)
//! height:      u16  (big-endian)
//! pixel_fmt:   [u8; 16]
//! name_length: u32  (big-endian)
//! name:        [u8] (name_length bytes)
//! ```

use crate::error::VncError;
use crate::framebuffer::ScreenGeometry;
use crate::protocol::pixel_format::PixelFormat;
use crate::protocol::SERVER_NAME;

/// The ServerInit message: framebuffer dimensions, the fixed pixel
/// format and the desktop name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInit {
    pub width: u16,
    pub height: u16,
    pub pixel_format: PixelFormat,
    pub name: String,
}

impl ServerInit {
    /// Build the ServerInit for the queried device geometry.
    pub fn new(geometry: ScreenGeometry) -> Self {
        Self {
            width: geometry.width,
            height: geometry.height,
            pixel_format: PixelFormat::xrgb8888(),
            name: SERVER_NAME.to_string(),
        }
    }

    /// Serialize to the wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let name = self.name.as_bytes();
        let mut buf = Vec::with_capacity(2 + 2 + PixelFormat::SIZE + 4 + name.len());
        buf.extend_from_slice(&self.width.to_be_bytes());
        buf.extend_from_slice(&self.height.to_be_bytes());
        buf.extend_from_slice(&self.pixel_format.encode());
        buf.extend_from_slice(&(name.len() as u32).to_be_bytes());
        buf.extend_from_slice(name);
        buf
    }

    /// Deserialize from the wire layout.
    pub fn decode(data: &[u8]) -> Result<Self, VncError> {
        let fixed = 2 + 2 + PixelFormat::SIZE + 4;
        if data.len() < fixed {
            return Err(VncError::Truncated {
                what: "ServerInit",
                len: data.len(),
            });
        }
        let width = u16::from_be_bytes([data[0], data[1]]);
        let height = u16::from_be_bytes([data[2], data[3]]);
        let pixel_format = PixelFormat::decode(&data[4..4 + PixelFormat::SIZE])?;
        let name_len =
            u32::from_be_bytes([data[20], data[21], data[22], data[23]]) as usize;
        if data.len() < fixed + name_len {
            return Err(VncError::Truncated {
                what: "ServerInit name",
                len: data.len(),
            });
        }
        let name = String::from_utf8_lossy(&data[fixed..fixed + name_len]).into_owned();
        Ok(Self {
            width,
            height,
            pixel_format,
            name,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> ScreenGeometry {
        ScreenGeometry {
            width: 480,
            height: 544,
            bits_per_pixel: 32,
            stride: 1920,
        }
    }

    #[test]
    fn encode_layout() {
        let init = ServerInit::new(geometry());
        let encoded = init.encode();

        assert_eq!(&encoded[0..2], &480u16.to_be_bytes());
        assert_eq!(&encoded[2..4], &544u16.to_be_bytes());
        assert_eq!(&encoded[4..20], &PixelFormat::xrgb8888().encode());
        let name_len = u32::from_be_bytes(encoded[20..24].try_into().unwrap());
        assert_eq!(name_len as usize, SERVER_NAME.len());
        assert_eq!(&encoded[24..], SERVER_NAME.as_bytes());
    }

    #[test]
    fn roundtrip() {
        let init = ServerInit::new(geometry());
        let decoded = ServerInit::decode(&init.encode()).unwrap();
        assert_eq!(decoded, init);
    }

    #[test]
    fn decode_truncated_name() {
        let init = ServerInit::new(geometry());
        let mut encoded = init.encode();
        encoded.truncate(encoded.len() - 1);
        assert!(ServerInit::decode(&encoded).is_err());
    }
}
